//! # Core Configuration Module
//!
//! Source configuration and the dependency bundle for the bookmark sync core.
//!
//! ## Overview
//!
//! Source settings live in the host's [`SettingsStore`] as a flat key/value
//! map (`source1_owner`, `source1_repo`, ..., `source2_active`). This module
//! turns that map into typed [`SourceConfig`] values and produces the partial
//! updates the core is allowed to write back (the cached revision tag and the
//! legacy-key migration).
//!
//! [`CoreConfig`] bundles the bridge implementations the core needs. It is
//! built with [`CoreConfigBuilder`], which fails fast with
//! [`Error::CapabilityMissing`] when a required bridge is absent.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .settings_store(Arc::new(MySettingsStore))
//!     .bookmark_store(Arc::new(MyBookmarkTree))
//!     .notifier(Arc::new(MyNotifier))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::redact_if_sensitive;
use bridge_traits::{
    BookmarkStore, Clock, HttpClient, Notifier, SettingsMap, SettingsStore, SystemClock,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Public GitHub REST API endpoint
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Fields that older releases stored without a `source1_` prefix
const LEGACY_FIELDS: &[&str] = &[
    "useCustomHost",
    "githubApiUrl",
    "pat",
    "owner",
    "repo",
    "sourcePath",
    "etag",
];

/// Which configured source a setting belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// Always consulted
    Primary,
    /// Consulted only while `source2_active` is set
    Secondary,
}

impl SourceId {
    /// Settings key prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Primary => "source1",
            SourceId::Secondary => "source2",
        }
    }

    /// Full settings key for one of this source's fields
    pub fn key(&self, field: &str) -> String {
        format!("{}_{}", self.as_str(), field)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque content-version token used for conditional fetches
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionTag(String);

impl RevisionTag {
    /// Returns `None` for an empty tag, which means "nothing cached"
    pub fn new(tag: impl Into<String>) -> Option<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            None
        } else {
            Some(Self(tag))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One remote location supplying a bookmark collection
#[derive(Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub id: SourceId,
    pub owner: String,
    pub repo: String,
    /// File or directory path inside the repository
    pub path: String,
    /// Personal access token
    pub credential: String,
    pub use_custom_host: bool,
    /// Alternate API root (GitHub Enterprise), honored only with `use_custom_host`
    pub api_url: String,
    /// Tag of the last fully successful fetch
    pub revision: Option<RevisionTag>,
}

impl SourceConfig {
    /// An empty, unconfigured source
    pub fn new(id: SourceId) -> Self {
        Self {
            id,
            owner: String::new(),
            repo: String::new(),
            path: String::new(),
            credential: String::new(),
            use_custom_host: false,
            api_url: String::new(),
            revision: None,
        }
    }

    pub fn with_location(
        mut self,
        owner: impl Into<String>,
        repo: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.owner = owner.into();
        self.repo = repo.into();
        self.path = path.into();
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = credential.into();
        self
    }

    pub fn with_custom_host(mut self, api_url: impl Into<String>) -> Self {
        self.use_custom_host = true;
        self.api_url = api_url.into();
        self
    }

    pub fn with_revision(mut self, revision: Option<RevisionTag>) -> Self {
        self.revision = revision;
        self
    }

    /// Read one source out of a settings snapshot
    pub fn from_settings(id: SourceId, settings: &SettingsMap) -> Self {
        Self {
            id,
            owner: read_string(settings, &id.key("owner")),
            repo: read_string(settings, &id.key("repo")),
            path: read_string(settings, &id.key("sourcePath")),
            credential: read_string(settings, &id.key("pat")),
            use_custom_host: read_bool(settings, &id.key("useCustomHost")),
            api_url: read_string(settings, &id.key("githubApiUrl")),
            revision: RevisionTag::new(read_string(settings, &id.key("etag"))),
        }
    }

    /// Names of the required settings that are still empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("sourcePath", &self.path),
            ("pat", &self.credential),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// API root to talk to, without a trailing slash
    pub fn api_base_url(&self) -> &str {
        if self.use_custom_host && !self.api_url.is_empty() {
            self.api_url.trim_end_matches('/')
        } else {
            DEFAULT_GITHUB_API_URL
        }
    }

    /// `owner/repo/path`, for log lines and messages
    pub fn location(&self) -> String {
        format!("{}/{}/{}", self.owner, self.repo, self.path)
    }

    /// Partial settings update that caches a new revision tag for this source
    pub fn revision_update(&self, tag: &RevisionTag) -> SettingsMap {
        let mut partial = SettingsMap::new();
        partial.insert(self.id.key("etag"), Value::String(tag.as_str().to_string()));
        partial
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let credential = if self.credential.is_empty() {
            String::new()
        } else {
            redact_if_sensitive("credential", &self.credential)
        };

        f.debug_struct("SourceConfig")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("credential", &credential)
            .field("use_custom_host", &self.use_custom_host)
            .field("api_url", &self.api_url)
            .field("revision", &self.revision)
            .finish()
    }
}

/// Typed view over the whole settings snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub primary: SourceConfig,
    pub secondary: SourceConfig,
    pub secondary_active: bool,
}

impl SyncSettings {
    pub fn from_settings(settings: &SettingsMap) -> Self {
        Self {
            primary: SourceConfig::from_settings(SourceId::Primary, settings),
            secondary: SourceConfig::from_settings(SourceId::Secondary, settings),
            secondary_active: read_bool(settings, "source2_active"),
        }
    }

    /// Sources a run consults, in priority order
    pub fn active_sources(&self) -> Vec<&SourceConfig> {
        let mut sources = vec![&self.primary];
        if self.secondary_active {
            sources.push(&self.secondary);
        }
        sources
    }
}

/// Settings changes needed to move unprefixed legacy keys under `source1_`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyMigration {
    pub updates: SettingsMap,
    pub removed: Vec<String>,
}

impl LegacyMigration {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.removed.is_empty()
    }
}

/// Compute the migration of single-source settings from older releases.
///
/// A non-blank legacy value is copied to its `source1_` key unless that key
/// already holds a value. Every legacy key found is scheduled for removal, so
/// applying the result twice is a no-op.
pub fn migrate_legacy_settings(settings: &SettingsMap) -> LegacyMigration {
    let mut migration = LegacyMigration::default();

    for field in LEGACY_FIELDS {
        let Some(value) = settings.get(*field) else {
            continue;
        };

        let target = SourceId::Primary.key(field);
        let target_blank = settings.get(&target).map_or(true, is_blank);
        if !is_blank(value) && target_blank {
            migration.updates.insert(target, value.clone());
        }
        migration.removed.push((*field).to_string());
    }

    migration
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn read_string(settings: &SettingsMap, key: &str) -> String {
    match settings.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn read_bool(settings: &SettingsMap, key: &str) -> bool {
    match settings.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim(), "true" | "on" | "1"),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

/// Bridges the core needs to run.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP client for the content provider (optional with desktop default)
    pub http_client: Arc<dyn HttpClient>,

    /// Source settings and cached revision tags (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// The live bookmark tree (required)
    pub bookmark_store: Arc<dyn BookmarkStore>,

    /// User-visible notifications (optional with desktop default)
    pub notifier: Arc<dyn Notifier>,

    /// Time source, defaults to the system clock
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("bookmark_store", &"BookmarkStore { ... }")
            .field("notifier", &"Notifier { ... }")
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for source configuration. \
                 Desktop: use bridge_desktop::SqliteSettingsStore. \
                 Browser: inject a storage.local-backed settings store."
            .to_string(),
    }
}

fn bookmark_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "BookmarkStore".to_string(),
        message: "BookmarkStore implementation is required to reconcile the bookmark bar. \
                 Inject an adapter over the host's native bookmark API."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::try_new()
        .map_err(|e| Error::Internal(format!("Failed to build default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                 Desktop: enable the 'desktop-shims' feature. \
                 Other hosts: inject a platform-native adapter."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_notifier() -> Result<Arc<dyn Notifier>> {
    Ok(Arc::new(bridge_desktop::TracingNotifier))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_notifier() -> Result<Arc<dyn Notifier>> {
    Err(Error::CapabilityMissing {
        capability: "Notifier".to_string(),
        message: "No Notifier implementation provided. \
                 Desktop: enable the 'desktop-shims' feature. \
                 Browser: inject an adapter over the notifications API."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    bookmark_store: Option<Arc<dyn BookmarkStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoreConfigBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the reqwest-based client is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings store implementation (required).
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the bookmark tree implementation (required).
    pub fn bookmark_store(mut self, store: Arc<dyn BookmarkStore>) -> Self {
        self.bookmark_store = Some(store);
        self
    }

    /// Sets the notification channel.
    ///
    /// If not provided, notifications are written to the log when the
    /// `desktop-shims` feature is enabled.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] if a required bridge was not
    /// provided and no default exists for it.
    pub fn build(self) -> Result<CoreConfig> {
        let settings_store = self
            .settings_store
            .ok_or_else(settings_store_missing_error)?;
        let bookmark_store = self
            .bookmark_store
            .ok_or_else(bookmark_store_missing_error)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };
        let notifier = match self.notifier {
            Some(notifier) => notifier,
            None => provide_default_notifier()?,
        };
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        Ok(CoreConfig {
            http_client,
            settings_store,
            bookmark_store,
            notifier,
            clock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> SettingsMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("settings fixture must be an object"),
        }
    }

    #[test]
    fn test_source_from_settings() {
        let map = settings(json!({
            "source1_owner": "octo",
            "source1_repo": "bookmarks",
            "source1_sourcePath": "bar.json",
            "source1_pat": "ghp_secret",
            "source1_etag": "W/\"abc\"",
        }));

        let source = SourceConfig::from_settings(SourceId::Primary, &map);
        assert_eq!(source.owner, "octo");
        assert_eq!(source.path, "bar.json");
        assert!(source.is_configured());
        assert_eq!(source.revision.as_ref().map(|r| r.as_str()), Some("W/\"abc\""));
        assert_eq!(source.api_base_url(), DEFAULT_GITHUB_API_URL);
    }

    #[test]
    fn test_missing_fields_reported() {
        let map = settings(json!({ "source1_owner": "octo", "source1_pat": "  " }));
        let source = SourceConfig::from_settings(SourceId::Primary, &map);
        assert_eq!(source.missing_fields(), vec!["repo", "sourcePath", "pat"]);
        assert!(!source.is_configured());
    }

    #[test]
    fn test_custom_host_requires_flag() {
        let map = settings(json!({
            "source2_githubApiUrl": "https://ghe.example.com/api/v3/",
        }));
        let source = SourceConfig::from_settings(SourceId::Secondary, &map);
        assert_eq!(source.api_base_url(), DEFAULT_GITHUB_API_URL);

        let source = source.with_custom_host("https://ghe.example.com/api/v3/");
        assert_eq!(source.api_base_url(), "https://ghe.example.com/api/v3");
    }

    #[test]
    fn test_secondary_gated_by_active_flag() {
        let map = settings(json!({ "source2_owner": "octo" }));
        let sync = SyncSettings::from_settings(&map);
        assert_eq!(sync.active_sources().len(), 1);

        let map = settings(json!({ "source2_active": true }));
        let sync = SyncSettings::from_settings(&map);
        let ids: Vec<SourceId> = sync.active_sources().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SourceId::Primary, SourceId::Secondary]);
    }

    #[test]
    fn test_revision_update_targets_own_key() {
        let source = SourceConfig::new(SourceId::Secondary);
        let tag = RevisionTag::new("\"v2\"").unwrap();
        let partial = source.revision_update(&tag);
        assert_eq!(partial.get("source2_etag"), Some(&json!("\"v2\"")));
        assert_eq!(partial.len(), 1);
    }

    #[test]
    fn test_empty_revision_tag_is_none() {
        assert!(RevisionTag::new("").is_none());
    }

    #[test]
    fn test_debug_redacts_credential() {
        let source = SourceConfig::new(SourceId::Primary).with_credential("ghp_secret");
        let debug = format!("{:?}", source);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_legacy_migration() {
        let map = settings(json!({
            "owner": "octo",
            "repo": "bookmarks",
            "pat": "",
            "source1_repo": "already-set",
        }));

        let migration = migrate_legacy_settings(&map);
        assert_eq!(migration.updates.get("source1_owner"), Some(&json!("octo")));
        assert!(!migration.updates.contains_key("source1_repo"));
        assert!(!migration.updates.contains_key("source1_pat"));
        assert_eq!(migration.removed, vec!["pat", "owner", "repo"]);
    }

    #[test]
    fn test_legacy_migration_noop_on_migrated_settings() {
        let map = settings(json!({ "source1_owner": "octo" }));
        assert!(migrate_legacy_settings(&map).is_empty());
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_settings_store() {
        let err = CoreConfig::builder().build().unwrap_err();
        assert!(matches!(
            err,
            Error::CapabilityMissing { ref capability, .. } if capability == "SettingsStore"
        ));
    }
}
