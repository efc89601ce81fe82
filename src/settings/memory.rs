//! In-memory settings store for local development and tests.
//!
//! Records live in a `HashMap` keyed by settings key, which makes duplicates
//! impossible. Contents are lost on restart.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{SettingsError, SettingsRecord, SettingsStore, UpsertConsistency};

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    records: RwLock<HashMap<String, SettingsRecord>>,
    consistency: UpsertConsistency,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn new(consistency: UpsertConsistency) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            consistency,
        }
    }

    /// Seed the store, e.g. with default site settings.
    #[must_use]
    pub fn with_records(self, records: impl IntoIterator<Item = SettingsRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.key.clone(), record))
            .collect();
        Self {
            records: RwLock::new(records),
            consistency: self.consistency,
        }
    }

    #[must_use]
    pub fn consistency(&self) -> UpsertConsistency {
        self.consistency
    }
}

/// Patch an existing record in place; `updated_at` never moves backwards.
fn patch(record: &mut SettingsRecord, value: Value) {
    record.value = value;
    record.updated_at = Utc::now().max(record.updated_at);
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    #[instrument(skip(self))]
    async fn get_by_key(&self, key: &str) -> Result<Option<SettingsRecord>, SettingsError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<SettingsRecord>, SettingsError> {
        let mut records: Vec<SettingsRecord> =
            self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }

    #[instrument(skip(self, value))]
    async fn upsert(&self, key: &str, value: Value) -> Result<SettingsRecord, SettingsError> {
        match self.consistency {
            UpsertConsistency::Atomic => {
                let mut records = self.records.write().await;
                let record = records
                    .entry(key.to_string())
                    .and_modify(|record| patch(record, value.clone()))
                    .or_insert_with(|| SettingsRecord::new(key, value, Utc::now()));
                Ok(record.clone())
            }
            UpsertConsistency::ReadModifyWrite => {
                let existed = self.records.read().await.contains_key(key);
                // The read lock is released here; another upsert may run in between.
                let mut records = self.records.write().await;
                if existed {
                    let record = records
                        .entry(key.to_string())
                        .and_modify(|record| patch(record, value.clone()))
                        .or_insert_with(|| SettingsRecord::new(key, value, Utc::now()));
                    return Ok(record.clone());
                }
                if records.contains_key(key) {
                    debug!(key, "settings insert lost a race");
                    return Err(SettingsError::Conflict(key.to_string()));
                }
                let record = SettingsRecord::new(key, value, Utc::now());
                records.insert(key.to_string(), record.clone());
                Ok(record)
            }
        }
    }

    async fn ping(&self) -> Result<(), SettingsError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn upsert_inserts_then_patches() {
        let store = MemorySettingsStore::default();
        let first = store.upsert("site", json!({"a": 1})).await;
        let second = store.upsert("site", json!({"a": 2})).await;
        let (Ok(first), Ok(second)) = (first, second) else {
            panic!("upsert should succeed");
        };

        assert_eq!(first.value, json!({"a": 1}));
        assert_eq!(second.value, json!({"a": 2}));
        assert!(second.updated_at >= first.updated_at);

        let all = store.get_all().await.unwrap_or_default();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key, "site");
        assert_eq!(all[0].value, json!({"a": 2}));
    }

    #[tokio::test]
    async fn read_modify_write_upsert_keeps_one_record() {
        let store = MemorySettingsStore::new(UpsertConsistency::ReadModifyWrite);
        assert!(store.upsert("site", json!({"a": 1})).await.is_ok());
        assert!(store.upsert("site", json!({"a": 1})).await.is_ok());
        let all = store.get_all().await.unwrap_or_default();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn get_by_key_misses_unknown_key() {
        let store = MemorySettingsStore::default();
        assert!(matches!(store.get_by_key("site").await, Ok(None)));
        assert!(store.upsert("payment", json!({"bank": "VCB"})).await.is_ok());
        assert!(matches!(store.get_by_key("site").await, Ok(None)));
        let found = store.get_by_key("payment").await.ok().flatten();
        assert_eq!(found.map(|record| record.value), Some(json!({"bank": "VCB"})));
    }

    #[tokio::test]
    async fn get_all_is_sorted_by_key() {
        let store = MemorySettingsStore::default();
        for key in ["site", "contact", "payment"] {
            assert!(store.upsert(key, json!(null)).await.is_ok());
        }
        let keys: Vec<String> = store
            .get_all()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|record| record.key)
            .collect();
        assert_eq!(keys, vec!["contact", "payment", "site"]);
    }

    #[tokio::test]
    async fn seeded_records_are_visible() {
        let seeded = SettingsRecord::new("site", json!({"siteName": "Dohy Studio"}), Utc::now());
        let store = MemorySettingsStore::default().with_records([seeded.clone()]);
        assert_eq!(store.get_by_key("site").await.ok().flatten(), Some(seeded));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_atomic_upserts_never_duplicate() {
        let store = Arc::new(MemorySettingsStore::new(UpsertConsistency::Atomic));
        let mut handles = Vec::new();
        for n in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.upsert("site", json!({ "n": n })).await.is_ok()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap_or(false));
        }
        let all = store.get_all().await.unwrap_or_default();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_read_modify_write_upserts_conflict_instead_of_duplicating() {
        let store = Arc::new(MemorySettingsStore::new(UpsertConsistency::ReadModifyWrite));
        let mut handles = Vec::new();
        for n in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.upsert("site", json!({ "n": n })).await
            }));
        }
        for handle in handles {
            match handle.await {
                Ok(Ok(_) | Err(SettingsError::Conflict(_))) => {}
                Ok(Err(err)) => panic!("unexpected error: {err}"),
                Err(err) => panic!("task failed: {err}"),
            }
        }
        let all = store.get_all().await.unwrap_or_default();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn ping_and_backend() {
        let store = MemorySettingsStore::default();
        assert!(store.ping().await.is_ok());
        assert_eq!(store.backend(), "memory");
        assert_eq!(store.consistency(), UpsertConsistency::Atomic);
    }
}
