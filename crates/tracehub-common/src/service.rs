//! Datasource lifecycle: validate, encrypt, persist, read back, test

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    config::Config,
    connectivity::ConnectivityTester,
    crypto::{ChaChaCipher, SecretCipher},
    error::{Error, Result},
    secrets::{decrypt_config, encrypt_config, mask_config_for_response, MASKED_VALUE},
    store::DatasourceStore,
    types::{ConnectivityResult, Datasource, DatasourcePatch, NewDatasource},
    validation::validate_datasource,
};

/// Datasource operations for one deployment
#[derive(Clone)]
pub struct DatasourceService {
    store: Arc<DatasourceStore>,
    cipher: Arc<dyn SecretCipher>,
    tester: ConnectivityTester,
    mask_responses: bool,
}

impl DatasourceService {
    pub fn new(store: Arc<DatasourceStore>, cipher: Arc<dyn SecretCipher>, config: &Config) -> Self {
        Self {
            store,
            tester: ConnectivityTester::new(cipher.clone(), config.connectivity.clone()),
            cipher,
            mask_responses: config.security.mask_secrets_in_responses,
        }
    }

    /// Build the service from configuration with an empty store.
    ///
    /// Without a configured key an ephemeral one is generated.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cipher: Arc<dyn SecretCipher> = match config.security.encryption_key.as_deref() {
            Some(key) => Arc::new(ChaChaCipher::from_base64(key)?),
            None => {
                tracing::warn!("No encryption key configured; stored credentials will not survive a restart");
                Arc::new(ChaChaCipher::ephemeral())
            }
        };
        Ok(Self::new(Arc::new(DatasourceStore::new()), cipher, config))
    }

    #[instrument(skip(self, input), fields(kind = %input.kind))]
    pub async fn create(
        &self,
        organisation_id: Uuid,
        input: NewDatasource,
        actor: Option<Uuid>,
    ) -> Result<Datasource> {
        if input.name.trim().is_empty() {
            return Err(Error::Validation("Datasource name is required".to_string()));
        }
        validate_datasource(input.kind, input.url.as_deref(), input.config.as_ref())?;

        let now = Utc::now();
        let datasource = Datasource {
            id: Uuid::new_v4(),
            organisation_id,
            name: input.name,
            description: input.description,
            kind: input.kind,
            url: input.url,
            config: encrypt_config(self.cipher.as_ref(), input.kind, input.config.as_ref())?,
            created_by: actor,
            created_at: now,
            updated_at: now,
        };

        self.store.put(datasource.clone()).await;
        info!(datasource_id = %datasource.id, "Datasource created");
        self.present(datasource)
    }

    /// Merge a partial update into the stored record, then re-validate and re-encrypt
    #[instrument(skip(self, patch))]
    pub async fn update(&self, organisation_id: Uuid, id: Uuid, patch: DatasourcePatch) -> Result<Datasource> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(Error::Validation("Datasource name is required".to_string()));
        }
        let existing = self.find(organisation_id, id).await?;

        let mut config = decrypt_config(self.cipher.as_ref(), existing.kind, existing.config.as_ref())?;
        if let Some(changes) = patch.config {
            config = Some(match config {
                Some(mut base) => {
                    drop_replaced_authentication(&mut base, &changes);
                    merge_json(&mut base, changes);
                    base
                }
                None => changes,
            });
        }

        let url = patch.url.or(existing.url);
        validate_datasource(existing.kind, url.as_deref(), config.as_ref())?;

        let updated = Datasource {
            name: patch.name.unwrap_or(existing.name),
            description: match patch.description {
                Some(d) if d.is_empty() => None,
                Some(d) => Some(d),
                None => existing.description,
            },
            url,
            config: encrypt_config(self.cipher.as_ref(), existing.kind, config.as_ref())?,
            updated_at: Utc::now(),
            ..existing
        };

        self.store.put(updated.clone()).await;
        info!(datasource_id = %id, "Datasource updated");
        self.present(updated)
    }

    pub async fn get(&self, organisation_id: Uuid, id: Uuid) -> Result<Datasource> {
        let datasource = self.find(organisation_id, id).await?;
        self.present(datasource)
    }

    pub async fn list(&self, organisation_id: Uuid) -> Result<Vec<Datasource>> {
        self.store
            .list(organisation_id)
            .await
            .into_iter()
            .map(|d| self.present(d))
            .collect()
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, organisation_id: Uuid, id: Uuid) -> Result<()> {
        self.store
            .remove(organisation_id, id)
            .await
            .ok_or_else(|| Error::NotFound(format!("datasource {id}")))?;
        info!(datasource_id = %id, "Datasource deleted");
        Ok(())
    }

    /// Test a stored datasource
    pub async fn test(&self, organisation_id: Uuid, id: Uuid) -> Result<ConnectivityResult> {
        let datasource = self.find(organisation_id, id).await?;
        Ok(self.tester.test_connection(&datasource).await)
    }

    /// Test a configuration before it is saved
    pub async fn test_unsaved(&self, organisation_id: Uuid, input: NewDatasource) -> ConnectivityResult {
        let now = Utc::now();
        let datasource = Datasource {
            id: Uuid::nil(),
            organisation_id,
            name: input.name,
            description: input.description,
            kind: input.kind,
            url: input.url,
            config: input.config,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        self.tester.test_connection(&datasource).await
    }

    async fn find(&self, organisation_id: Uuid, id: Uuid) -> Result<Datasource> {
        self.store
            .get(organisation_id, id)
            .await
            .ok_or_else(|| Error::NotFound(format!("datasource {id}")))
    }

    /// Response view of a stored record: decrypted, or masked when configured
    fn present(&self, mut datasource: Datasource) -> Result<Datasource> {
        datasource.config = if self.mask_responses {
            mask_config_for_response(datasource.kind, datasource.config.as_ref())?
        } else {
            decrypt_config(self.cipher.as_ref(), datasource.kind, datasource.config.as_ref())?
        };
        Ok(datasource)
    }
}

const AUTHENTICATION_POINTERS: [&str; 2] = ["/authentication", "/customApi/authentication"];

/// A patch that changes the authentication type replaces the whole block,
/// so credentials of the old type are not carried over.
fn drop_replaced_authentication(base: &mut Value, patch: &Value) {
    for pointer in AUTHENTICATION_POINTERS {
        let Some(new_type) = patch.pointer(&format!("{pointer}/type")) else {
            continue;
        };
        let old_type = base.pointer(&format!("{pointer}/type"));
        if old_type.is_some_and(|t| t != new_type) {
            if let Some(auth) = base.pointer_mut(pointer) {
                *auth = Value::Null;
            }
        }
    }
}

/// Deep-merge `patch` into `base`. Objects merge key by key, `null` removes
/// a key, and the mask marker leaves the stored value in place.
pub fn merge_json(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match value {
                    Value::Null => {
                        base.remove(&key);
                    }
                    Value::String(s) if s == MASKED_VALUE && base.contains_key(&key) => {}
                    value => merge_json(base.entry(key).or_insert(Value::Null), value),
                }
            }
        }
        (base, patch) => *base = patch,
    }
}
