// Package store provides persistence for server records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod sqlite;


pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
    #[error("record already exists: {0}")]
    AlreadyExists(String),
}

/// Persisted metadata of a game server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: String,
    pub name: String,
    pub version: String,
    pub port: u16,
}

/// ServerStore is the record collaborator used by the API layer.
#[async_trait]
pub trait ServerStore: Send + Sync {
    /// Fetches a record by id. `None` when it does not exist.
    async fn get_by_id(&self, id: &str) -> Result<Option<ServerRecord>, StoreError>;

    /// Lists every record.
    async fn list(&self) -> Result<Vec<ServerRecord>, StoreError>;

    /// Overwrites the version field of a record.
    async fn update_version(&self, id: &str, version: &str) -> Result<(), StoreError>;

    /// Inserts a new record.
    async fn insert(&self, record: &ServerRecord) -> Result<(), StoreError>;

    /// Releases held connections.
    async fn close(&self);
}
