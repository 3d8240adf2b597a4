//! Settings Storage Abstraction
//!
//! The settings store owns the source configuration (owner, repository, path,
//! credential, cached revision tag). The core reads the whole map once per
//! run and writes back only the keys it owns.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// Flat key/value snapshot of all settings.
pub type SettingsMap = Map<String, Value>;

/// Key-value settings storage trait
///
/// Abstracts platform-specific preferences storage:
/// - Browser extensions: `storage.local`
/// - Desktop: SQLite or config files
/// - Tests: in-memory map
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
/// use serde_json::{json, Map};
///
/// async fn remember_etag(store: &dyn SettingsStore, etag: &str) -> Result<()> {
///     let mut partial = Map::new();
///     partial.insert("source1_etag".to_string(), json!(etag));
///     store.set(partial).await
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Snapshot of every stored setting
    async fn get_all(&self) -> Result<SettingsMap>;

    /// Merge the given keys into the store, leaving other keys untouched
    async fn set(&self, partial: SettingsMap) -> Result<()>;

    /// Remove the given keys
    async fn remove(&self, keys: &[String]) -> Result<()>;
}
