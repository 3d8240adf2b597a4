//! Settings Storage using SQLite, plus an in-memory store for tests and
//! ephemeral hosts

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{SettingsMap, SettingsStore},
};
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

const UPSERT: &str = r#"
    INSERT INTO settings (key, value, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
"#;

fn storage_error(action: &str, e: impl std::fmt::Display) -> BridgeError {
    BridgeError::Storage(format!("Failed to {}: {}", action, e))
}

/// SQLite-backed settings store implementation
///
/// Values are stored as JSON text so strings, booleans and numbers come back
/// with the type they were written with. `set` applies all keys of one call
/// inside a single transaction.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Open (or create) a settings database at the given path
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| storage_error("connect to DB", e))?;

        let store = Self { pool };
        store.migrate().await?;

        debug!(path = ?db_path, "Initialized settings store");
        Ok(store)
    }

    /// Create an in-memory settings store
    ///
    /// Each SQLite in-memory connection is a separate database, so the pool
    /// is pinned to one connection.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| storage_error("connect to DB", e))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("create table", e))?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get_all(&self) -> Result<SettingsMap> {
        let rows = sqlx::query("SELECT key, value FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("read settings", e))?;

        let mut settings = SettingsMap::new();
        for row in rows {
            let key: String = row.get(0);
            let raw: String = row.get(1);
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    settings.insert(key, value);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping undecodable setting");
                }
            }
        }

        debug!(count = settings.len(), "Loaded settings");
        Ok(settings)
    }

    async fn set(&self, partial: SettingsMap) -> Result<()> {
        if partial.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("begin transaction", e))?;
        let now = chrono::Utc::now().timestamp();

        for (key, value) in &partial {
            let encoded =
                serde_json::to_string(value).map_err(|e| storage_error("encode setting", e))?;
            sqlx::query(UPSERT)
                .bind(key)
                .bind(encoded)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| storage_error("set setting", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("commit", e))?;

        debug!(keys = ?partial.keys().collect::<Vec<_>>(), "Stored settings");
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("begin transaction", e))?;

        for key in keys {
            sqlx::query("DELETE FROM settings WHERE key = ?")
                .bind(key)
                .execute(&mut *tx)
                .await
                .map_err(|e| storage_error("delete setting", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("commit", e))?;

        debug!(keys = ?keys, "Deleted settings");
        Ok(())
    }
}

/// Process-local settings store backed by a map
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<SettingsMap>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot
    pub fn with_values(values: SettingsMap) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get_all(&self) -> Result<SettingsMap> {
        Ok(self.values.read().await.clone())
    }

    async fn set(&self, partial: SettingsMap) -> Result<()> {
        self.values.write().await.extend(partial);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        let mut values = self.values.write().await;
        for key in keys {
            values.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn partial(pairs: &[(&str, Value)]) -> SettingsMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_sqlite_values_keep_their_type() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store
            .set(partial(&[
                ("source1_owner", json!("octo")),
                ("source2_active", json!(true)),
                ("retries", json!(3)),
            ]))
            .await
            .unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.get("source1_owner"), Some(&json!("octo")));
        assert_eq!(all.get("source2_active"), Some(&json!(true)));
        assert_eq!(all.get("retries"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_sqlite_set_merges_and_overwrites() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store
            .set(partial(&[("source1_etag", json!("\"a\"")), ("source1_repo", json!("marks"))]))
            .await
            .unwrap();
        store
            .set(partial(&[("source1_etag", json!("\"b\""))]))
            .await
            .unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.get("source1_etag"), Some(&json!("\"b\"")));
        assert_eq!(all.get("source1_repo"), Some(&json!("marks")));
    }

    #[tokio::test]
    async fn test_sqlite_remove() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        store
            .set(partial(&[("owner", json!("octo")), ("repo", json!("marks"))]))
            .await
            .unwrap();

        store
            .remove(&["owner".to_string(), "missing".to_string()])
            .await
            .unwrap();

        let all = store.get_all().await.unwrap();
        assert!(!all.contains_key("owner"));
        assert!(all.contains_key("repo"));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySettingsStore::with_values(partial(&[("pat", json!("old"))]));
        store.set(partial(&[("pat", json!("new"))])).await.unwrap();
        assert_eq!(store.get_all().await.unwrap().get("pat"), Some(&json!("new")));

        store.remove(&["pat".to_string()]).await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
