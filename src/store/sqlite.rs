// SQLite-backed server record store.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::{ServerRecord, ServerStore, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS servers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    version TEXT NOT NULL,
    port INTEGER NOT NULL
)
"#;

#[derive(sqlx::FromRow)]
struct ServerRow {
    id: String,
    name: String,
    version: String,
    port: i64,
}

impl TryFrom<ServerRow> for ServerRecord {
    type Error = StoreError;

    fn try_from(row: ServerRow) -> Result<Self, Self::Error> {
        let port = u16::try_from(row.port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| StoreError::Corrupt {
                id: row.id.clone(),
                reason: format!("port {} out of range", row.port),
            })?;
        Ok(ServerRecord {
            id: row.id,
            name: row.name,
            version: row.version,
            port,
        })
    }
}

/// SqliteStore keeps records in a SQLite database behind a connection pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and ensures the schema.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        info!(
            component = "store",
            event = "connected",
            url = %url,
            max_connections = max_connections,
            "server store ready"
        );

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(super) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ServerStore for SqliteStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<ServerRecord>, StoreError> {
        let row = sqlx::query_as::<_, ServerRow>(
            "SELECT id, name, version, port FROM servers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ServerRecord::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<ServerRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ServerRow>(
            "SELECT id, name, version, port FROM servers ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ServerRecord::try_from).collect()
    }

    async fn update_version(&self, id: &str, version: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE servers SET version = ? WHERE id = ?")
            .bind(version)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert(&self, record: &ServerRecord) -> Result<(), StoreError> {
        let result = sqlx::query("INSERT INTO servers (id, name, version, port) VALUES (?, ?, ?, ?)")
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.version)
            .bind(i64::from(record.port))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::AlreadyExists(record.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
