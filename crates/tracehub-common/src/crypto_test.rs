//! Tests for crypto module

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::crypto::{ChaChaCipher, SecretCipher, ENCRYPTION_MARKER};

fn cipher() -> ChaChaCipher {
    ChaChaCipher::new(&[7u8; 32]).unwrap()
}

#[test]
fn test_encrypt_adds_marker() {
    let encrypted = cipher().encrypt("s3cret").unwrap();
    assert!(encrypted.starts_with(ENCRYPTION_MARKER));
    assert!(!encrypted.contains("s3cret"));
}

#[test]
fn test_decrypt_restores_plaintext() {
    let c = cipher();
    let encrypted = c.encrypt("s3cret").unwrap();
    assert_eq!(c.decrypt(&encrypted).unwrap(), "s3cret");
}

#[test]
fn test_encrypt_is_noop_on_encrypted_value() {
    let c = cipher();
    let once = c.encrypt("s3cret").unwrap();
    let twice = c.encrypt(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_decrypt_is_noop_on_plaintext() {
    assert_eq!(cipher().decrypt("plain").unwrap(), "plain");
}

#[test]
fn test_decrypt_with_wrong_key_fails() {
    let encrypted = cipher().encrypt("s3cret").unwrap();
    let other = ChaChaCipher::new(&[9u8; 32]).unwrap();
    assert!(other.decrypt(&encrypted).is_err());
}

#[test]
fn test_decrypt_rejects_truncated_payload() {
    let value = format!("{ENCRYPTION_MARKER}{}", STANDARD.encode([1u8; 4]));
    assert!(cipher().decrypt(&value).is_err());
}

#[test]
fn test_key_length_is_checked() {
    assert!(ChaChaCipher::new(&[0u8; 16]).is_err());
    assert!(ChaChaCipher::from_base64(&STANDARD.encode([0u8; 32])).is_ok());
    assert!(ChaChaCipher::from_base64("not base64!").is_err());
}
