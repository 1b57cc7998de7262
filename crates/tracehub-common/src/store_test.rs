//! Tests for store module

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::store::DatasourceStore;
use crate::types::{Datasource, DatasourceKind};

fn record(org: Uuid, name: &str, age_secs: i64) -> Datasource {
    let at = Utc::now() - Duration::seconds(age_secs);
    Datasource {
        id: Uuid::new_v4(),
        organisation_id: org,
        name: name.to_string(),
        description: None,
        kind: DatasourceKind::Tempo,
        url: Some("http://tempo:3200".to_string()),
        config: None,
        created_by: None,
        created_at: at,
        updated_at: at,
    }
}

#[test]
fn test_list_is_scoped_and_ordered() {
    tokio_test::block_on(async {
        let store = DatasourceStore::new();
        let org = Uuid::new_v4();
        store.put(record(org, "newer", 10)).await;
        store.put(record(org, "older", 100)).await;
        store.put(record(Uuid::new_v4(), "foreign", 50)).await;

        let names: Vec<String> = store.list(org).await.into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["older", "newer"]);
    });
}

#[test]
fn test_get_and_remove_respect_organisation() {
    tokio_test::block_on(async {
        let store = DatasourceStore::new();
        let org = Uuid::new_v4();
        let other = Uuid::new_v4();
        let ds = record(org, "tempo", 0);
        let id = ds.id;
        store.put(ds).await;

        assert!(store.get(other, id).await.is_none());
        assert!(store.remove(other, id).await.is_none());
        assert!(store.get(org, id).await.is_some());
        assert!(store.remove(org, id).await.is_some());
        assert!(store.get(org, id).await.is_none());
    });
}
