//! Encryption primitive for credentials stored at rest

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

/// Prefix carried by every value produced by [`ChaChaCipher::encrypt`].
pub const ENCRYPTION_MARKER: &str = "enc:v1:";

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Opaque string cipher used by the config encryption adapter.
///
/// Implementations must be idempotent-safe: `encrypt` leaves values that
/// `is_encrypted` recognises untouched, and `decrypt` leaves plaintext alone.
pub trait SecretCipher: Send + Sync {
    fn is_encrypted(&self, value: &str) -> bool;

    fn encrypt(&self, value: &str) -> Result<String>;

    fn decrypt(&self, value: &str) -> Result<String>;
}

/// ChaCha20-Poly1305 cipher with a random nonce per value
#[derive(Clone)]
pub struct ChaChaCipher {
    key: Key,
}

impl ChaChaCipher {
    /// Create a cipher from a raw 32-byte key
    pub fn new(key_bytes: &[u8]) -> Result<Self> {
        if key_bytes.len() != KEY_LEN {
            return Err(Error::Crypto(format!(
                "encryption key must be {KEY_LEN} bytes, got {}",
                key_bytes.len()
            )));
        }
        Ok(Self {
            key: *Key::from_slice(key_bytes),
        })
    }

    /// Create a cipher from a base64-encoded 32-byte key
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Crypto(format!("invalid base64 encryption key: {e}")))?;
        Self::new(&bytes)
    }

    /// Create a cipher with a freshly generated key.
    ///
    /// Values encrypted with it cannot be read after restart.
    pub fn ephemeral() -> Self {
        let mut key_bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key_bytes);
        Self {
            key: *Key::from_slice(&key_bytes),
        }
    }
}

impl SecretCipher for ChaChaCipher {
    fn is_encrypted(&self, value: &str) -> bool {
        value.starts_with(ENCRYPTION_MARKER)
    }

    fn encrypt(&self, value: &str) -> Result<String> {
        if self.is_encrypted(value) {
            return Ok(value.to_string());
        }

        let cipher = ChaCha20Poly1305::new(&self.key);
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, value.as_bytes())
            .map_err(|e| Error::Crypto(e.to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(format!("{ENCRYPTION_MARKER}{}", STANDARD.encode(payload)))
    }

    fn decrypt(&self, value: &str) -> Result<String> {
        let Some(encoded) = value.strip_prefix(ENCRYPTION_MARKER) else {
            return Ok(value.to_string());
        };

        let payload = STANDARD
            .decode(encoded)
            .map_err(|e| Error::Crypto(format!("malformed ciphertext: {e}")))?;
        if payload.len() <= NONCE_LEN {
            return Err(Error::Crypto("ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);
        let cipher = ChaCha20Poly1305::new(&self.key);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| Error::Crypto("unable to decrypt value with configured key".to_string()))?;

        String::from_utf8(plaintext).map_err(|e| Error::Crypto(e.to_string()))
    }
}
