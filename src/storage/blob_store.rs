use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::MIGRATION_001_INITIAL;

/// Key/value storage with whole-value semantics: a key is read or replaced
/// as one unit, never partially updated.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`, or `None` if nothing was ever written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`.
    async fn set(&self, key: &str, blob: &str) -> Result<()>;
}

/// Read and deserialize the JSON collection stored under `key`.
pub async fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: BlobStore + ?Sized,
{
    match store.get(key).await? {
        Some(blob) => {
            let value = serde_json::from_str(&blob)
                .with_context(|| format!("Stored data under '{}' is corrupt", key))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Serialize `value` as JSON and write it under `key`.
pub async fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: BlobStore + ?Sized,
{
    let blob = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize data for '{}'", key))?;
    store.set(key, &blob).await
}

/// Blob store backed by a single SQLite table.
pub struct SqliteBlobStore {
    pool: SqlitePool,
}

impl SqliteBlobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create the blob table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }
}

#[async_trait::async_trait]
impl BlobStore for SqliteBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM blobs WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read '{}'", key))?;

        Ok(row.map(|row| row.get("value")))
    }

    async fn set(&self, key: &str, blob: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blobs (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(blob)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write '{}'", key))?;

        debug!(key, bytes = blob.len(), "persisted blob");
        Ok(())
    }
}

/// In-process blob store. Clones share the same underlying map, so a store
/// can be handed to a service and inspected or reused afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))?;
        Ok(blobs.get(key).cloned())
    }

    async fn set(&self, key: &str, blob: &str) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))?;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_absent_key() {
        let store = MemoryBlobStore::new();
        assert_eq!(store.get("transactions").await.unwrap(), None);
        let loaded: Option<Vec<String>> = load_json(&store, "categories").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_memory_store_replaces_whole_value() {
        let store = MemoryBlobStore::new();
        save_json(&store, "categories", &["Food", "Other"]).await.unwrap();
        save_json(&store, "categories", &["Other"]).await.unwrap();

        let shared = store.clone();
        let loaded: Option<Vec<String>> = load_json(&shared, "categories").await.unwrap();
        assert_eq!(loaded, Some(vec!["Other".to_string()]));
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_an_error() {
        let store = MemoryBlobStore::new();
        store.set("goals", "{not json").await.unwrap();

        let result: Result<Option<Vec<String>>> = load_json(&store, "goals").await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("goals"));
    }
}
