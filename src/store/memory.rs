// In-memory server record store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{ServerRecord, ServerStore, StoreError};

/// InMemoryStore keeps records in a map ordered by id.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<String, ServerRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = ServerRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write();
            for record in records {
                map.insert(record.id.clone(), record);
            }
        }
        store
    }
}

#[async_trait]
impl ServerStore for InMemoryStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<ServerRecord>, StoreError> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<ServerRecord>, StoreError> {
        Ok(self.records.read().values().cloned().collect())
    }

    async fn update_version(&self, id: &str, version: &str) -> Result<(), StoreError> {
        if let Some(record) = self.records.write().get_mut(id) {
            record.version = version.to_string();
        }
        Ok(())
    }

    async fn insert(&self, record: &ServerRecord) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id.clone()));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn close(&self) {}
}
