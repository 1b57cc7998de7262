//! In-memory datasource store scoped by organisation

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::Datasource;

/// Datasource records keyed by id; every access checks the organisation
#[derive(Default)]
pub struct DatasourceStore {
    records: RwLock<HashMap<Uuid, Datasource>>,
}

impl DatasourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All datasources of an organisation, oldest first
    pub async fn list(&self, organisation_id: Uuid) -> Vec<Datasource> {
        let records = self.records.read().await;
        let mut datasources: Vec<Datasource> = records
            .values()
            .filter(|d| d.organisation_id == organisation_id)
            .cloned()
            .collect();
        datasources.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        datasources
    }

    pub async fn get(&self, organisation_id: Uuid, id: Uuid) -> Option<Datasource> {
        self.records
            .read()
            .await
            .get(&id)
            .filter(|d| d.organisation_id == organisation_id)
            .cloned()
    }

    /// Insert or replace a record
    pub async fn put(&self, datasource: Datasource) {
        self.records.write().await.insert(datasource.id, datasource);
    }

    /// Remove a record; `None` if it does not exist in this organisation
    pub async fn remove(&self, organisation_id: Uuid, id: Uuid) -> Option<Datasource> {
        let mut records = self.records.write().await;
        if records.get(&id)?.organisation_id != organisation_id {
            return None;
        }
        records.remove(&id)
    }
}
