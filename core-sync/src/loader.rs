//! Source loading
//!
//! Reads the source configuration from the settings store, asks the content
//! provider for each consulted source, and keeps the per-source revision tag
//! up to date.

use std::sync::Arc;

use bridge_traits::storage::SettingsStore;
use core_runtime::config::{
    migrate_legacy_settings, RevisionTag, SourceConfig, SourceId, SyncSettings,
};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SyncError};
use crate::provider::{ContentProvider, FetchOutcome, FetchRequest};

/// How a load treats cached revision tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Ignore the cached tag and always fetch full content
    pub force: bool,
    /// Store the tag returned by a successful fetch
    pub cache_revision: bool,
}

impl LoadOptions {
    /// Options for a synchronization run
    pub fn for_sync(force: bool) -> Self {
        Self {
            force,
            cache_revision: true,
        }
    }

    /// Fetch everything and leave the cache alone
    pub fn connectivity_check() -> Self {
        Self {
            force: true,
            cache_revision: false,
        }
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::for_sync(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Every consulted source reported no change
    NoChange,
    /// Documents from every changed source, primary first
    Loaded(Vec<Value>),
}

pub struct SourceLoader {
    settings: Arc<dyn SettingsStore>,
    provider: Arc<dyn ContentProvider>,
    events: Option<EventBus>,
}

impl SourceLoader {
    pub fn new(settings: Arc<dyn SettingsStore>, provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            settings,
            provider,
            events: None,
        }
    }

    /// Publish a `SourceLoaded` event per source
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Read the current source configuration, migrating legacy keys first.
    pub async fn load_settings(&self) -> Result<SyncSettings> {
        let mut snapshot = self.settings.get_all().await?;

        let migration = migrate_legacy_settings(&snapshot);
        if !migration.is_empty() {
            info!(
                migrated = migration.updates.len(),
                removed = migration.removed.len(),
                "Migrating legacy single-source settings"
            );
            self.settings.set(migration.updates.clone()).await?;
            self.settings.remove(&migration.removed).await?;

            for key in &migration.removed {
                snapshot.remove(key);
            }
            snapshot.extend(migration.updates);
        }

        Ok(SyncSettings::from_settings(&snapshot))
    }

    /// Load every consulted source.
    ///
    /// The primary source must be configured. An active secondary that is
    /// not configured is skipped with a warning; an inactive one is never
    /// consulted. Revision tags are stored only after every consulted source
    /// has loaded.
    #[instrument(skip(self), fields(force = options.force))]
    pub async fn load_all(&self, options: LoadOptions) -> Result<LoadOutcome> {
        let settings = self.load_settings().await?;

        let sources: Vec<&SourceConfig> = settings
            .active_sources()
            .into_iter()
            .filter(|source| {
                if source.id == SourceId::Primary || source.is_configured() {
                    return true;
                }
                warn!(
                    source = %source.id,
                    missing = ?source.missing_fields(),
                    "Secondary source is active but not configured, skipping"
                );
                false
            })
            .collect();

        let fetched =
            try_join_all(sources.iter().map(|source| self.fetch_source(source, options))).await?;

        let mut results = Vec::with_capacity(fetched.len());
        for (source, loaded) in sources.into_iter().zip(fetched) {
            match loaded {
                Some((documents, revision)) => {
                    if options.cache_revision {
                        self.cache_revision(source, revision.as_ref()).await?;
                    }
                    results.push(Some(documents));
                }
                None => results.push(None),
            }
        }

        if results.iter().all(Option::is_none) {
            info!("No changes detected in any source");
            return Ok(LoadOutcome::NoChange);
        }

        let documents: Vec<Value> = results.into_iter().flatten().flatten().collect();
        Ok(LoadOutcome::Loaded(documents))
    }

    /// Fetch one source. `None` means "not modified since the cached tag".
    #[instrument(skip(self, source, options), fields(source = %source.id))]
    async fn fetch_source(
        &self,
        source: &SourceConfig,
        options: LoadOptions,
    ) -> Result<Option<(Vec<Value>, Option<RevisionTag>)>> {
        let missing = source.missing_fields();
        if !missing.is_empty() {
            return Err(SyncError::ConfigurationMissing {
                source_id: source.id,
                missing,
            });
        }

        info!(
            provider = self.provider.name(),
            location = %source.location(),
            "Loading bookmark source"
        );

        let request = if options.force {
            FetchRequest::unconditional()
        } else {
            FetchRequest::conditional(source.revision.clone())
        };

        match self.provider.fetch(source, request).await? {
            FetchOutcome::NotModified => {
                debug!("Source not modified since cached revision");
                self.emit(source, 0, true);
                Ok(None)
            }
            FetchOutcome::Fetched {
                documents,
                revision,
            } => {
                self.emit(source, documents.len(), false);
                Ok(Some((documents, revision)))
            }
        }
    }

    async fn cache_revision(
        &self,
        source: &SourceConfig,
        revision: Option<&RevisionTag>,
    ) -> Result<()> {
        match revision {
            Some(tag) => {
                self.settings.set(source.revision_update(tag)).await?;
                debug!(source = %source.id, revision = %tag, "Cached source revision");
            }
            None => debug!(source = %source.id, "Provider returned no revision tag"),
        }
        Ok(())
    }

    fn emit(&self, source: &SourceConfig, documents: usize, unchanged: bool) {
        if let Some(events) = &self.events {
            let _ = events.emit(CoreEvent::Sync(SyncEvent::SourceLoaded {
                source: source.id.to_string(),
                documents,
                unchanged,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_desktop::MemorySettingsStore;
    use bridge_traits::storage::SettingsMap;
    use mockall::mock;
    use serde_json::json;

    mock! {
        Provider {}

        #[async_trait]
        impl ContentProvider for Provider {
            fn name(&self) -> &'static str;
            async fn fetch(&self, source: &SourceConfig, request: FetchRequest) -> Result<FetchOutcome>;
        }
    }

    fn settings(pairs: Value) -> Arc<MemorySettingsStore> {
        let map: SettingsMap = pairs.as_object().cloned().unwrap_or_default();
        Arc::new(MemorySettingsStore::with_values(map))
    }

    fn primary_only() -> Value {
        json!({
            "source1_owner": "octo",
            "source1_repo": "marks",
            "source1_sourcePath": "bar.json",
            "source1_pat": "ghp_secret",
            "source1_etag": "\"v1\"",
        })
    }

    fn fetched(tag: &str) -> FetchOutcome {
        FetchOutcome::Fetched {
            documents: vec![json!({ "name": tag })],
            revision: RevisionTag::new(tag),
        }
    }

    #[tokio::test]
    async fn test_missing_primary_configuration() {
        let store = settings(json!({ "source1_owner": "octo" }));
        let mut provider = MockProvider::new();
        provider.expect_fetch().never();

        let loader = SourceLoader::new(store, Arc::new(provider));
        let err = loader.load_all(LoadOptions::default()).await.unwrap_err();
        match err {
            SyncError::ConfigurationMissing { source_id, missing } => {
                assert_eq!(source_id, SourceId::Primary);
                assert_eq!(missing, vec!["repo", "sourcePath", "pat"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_conditional_fetch_and_revision_caching() {
        let store = settings(primary_only());
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch()
            .withf(|source, request| {
                source.id == SourceId::Primary
                    && request.if_none_match == RevisionTag::new("\"v1\"")
            })
            .times(1)
            .returning(|_, _| Ok(fetched("\"v2\"")));

        let loader = SourceLoader::new(store.clone(), Arc::new(provider));
        let outcome = loader.load_all(LoadOptions::default()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded(vec![json!({ "name": "\"v2\"" })]));

        let saved = store.get_all().await.unwrap();
        assert_eq!(saved.get("source1_etag"), Some(&json!("\"v2\"")));
    }

    #[tokio::test]
    async fn test_force_skips_tag_and_connectivity_check_keeps_cache() {
        let store = settings(primary_only());
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch()
            .withf(|_, request| request.if_none_match.is_none())
            .times(1)
            .returning(|_, _| Ok(fetched("\"v9\"")));

        let loader = SourceLoader::new(store.clone(), Arc::new(provider));
        loader
            .load_all(LoadOptions::connectivity_check())
            .await
            .unwrap();

        let saved = store.get_all().await.unwrap();
        assert_eq!(saved.get("source1_etag"), Some(&json!("\"v1\"")));
    }

    #[tokio::test]
    async fn test_not_modified_yields_no_change() {
        let store = settings(primary_only());
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch()
            .returning(|_, _| Ok(FetchOutcome::NotModified));

        let events = EventBus::new(8);
        let mut rx = events.subscribe();
        let loader = SourceLoader::new(store, Arc::new(provider)).with_events(events);
        assert_eq!(
            loader.load_all(LoadOptions::default()).await.unwrap(),
            LoadOutcome::NoChange
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            CoreEvent::Sync(SyncEvent::SourceLoaded {
                source: "source1".to_string(),
                documents: 0,
                unchanged: true,
            })
        );
    }

    #[tokio::test]
    async fn test_secondary_documents_follow_primary() {
        let mut values = primary_only();
        values["source2_active"] = json!(true);
        values["source2_owner"] = json!("octo");
        values["source2_repo"] = json!("shared");
        values["source2_sourcePath"] = json!("bookmarks");
        values["source2_pat"] = json!("ghp_other");
        let store = settings(values);

        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock");
        provider.expect_fetch().times(2).returning(|source, _| {
            Ok(FetchOutcome::Fetched {
                documents: vec![json!({ "from": source.repo })],
                revision: None,
            })
        });

        let loader = SourceLoader::new(store, Arc::new(provider));
        let outcome = loader.load_all(LoadOptions::default()).await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Loaded(vec![json!({ "from": "marks" }), json!({ "from": "shared" })])
        );
    }

    #[tokio::test]
    async fn test_only_one_changed_source_is_still_loaded() {
        let mut values = primary_only();
        values["source2_active"] = json!(true);
        values["source2_owner"] = json!("octo");
        values["source2_repo"] = json!("shared");
        values["source2_sourcePath"] = json!("bookmarks");
        values["source2_pat"] = json!("ghp_other");
        let store = settings(values);

        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock");
        provider.expect_fetch().returning(|source, _| {
            if source.id == SourceId::Primary {
                Ok(FetchOutcome::NotModified)
            } else {
                Ok(fetched("\"s2\""))
            }
        });

        let loader = SourceLoader::new(store, Arc::new(provider));
        match loader.load_all(LoadOptions::default()).await.unwrap() {
            LoadOutcome::Loaded(documents) => assert_eq!(documents.len(), 1),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_active_but_unconfigured_secondary_is_skipped() {
        let mut values = primary_only();
        values["source2_active"] = json!(true);
        let store = settings(values);

        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch()
            .withf(|source, _| source.id == SourceId::Primary)
            .times(1)
            .returning(|_, _| Ok(fetched("\"v2\"")));

        let loader = SourceLoader::new(store, Arc::new(provider));
        assert!(loader.load_all(LoadOptions::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_configured_but_inactive_secondary_is_not_consulted() {
        let mut values = primary_only();
        values["source2_active"] = json!(false);
        values["source2_owner"] = json!("octo");
        values["source2_repo"] = json!("shared");
        values["source2_sourcePath"] = json!("bookmarks");
        values["source2_pat"] = json!("ghp_other");
        let store = settings(values);

        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch()
            .withf(|source, _| source.id == SourceId::Primary)
            .times(1)
            .returning(|_, _| Ok(fetched("\"v2\"")));

        let loader = SourceLoader::new(store, Arc::new(provider));
        let outcome = loader.load_all(LoadOptions::default()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded(vec![json!({ "name": "\"v2\"" })]));
    }

    #[tokio::test]
    async fn test_failed_source_leaves_every_revision_uncached() {
        let mut values = primary_only();
        values["source2_active"] = json!(true);
        values["source2_owner"] = json!("octo");
        values["source2_repo"] = json!("shared");
        values["source2_sourcePath"] = json!("bookmarks");
        values["source2_pat"] = json!("ghp_other");
        let store = settings(values);

        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock");
        provider.expect_fetch().times(2).returning(|source, _| {
            if source.id == SourceId::Primary {
                Ok(fetched("\"v2\""))
            } else {
                Err(SyncError::DataNotFound("bookmarks".into()))
            }
        });

        let loader = SourceLoader::new(store.clone(), Arc::new(provider));
        let err = loader.load_all(LoadOptions::default()).await.unwrap_err();
        assert!(matches!(err, SyncError::DataNotFound(_)));

        let saved = store.get_all().await.unwrap();
        assert_eq!(saved.get("source1_etag"), Some(&json!("\"v1\"")));
        assert_eq!(saved.get("source2_etag"), None);
    }

    #[tokio::test]
    async fn test_provider_errors_propagate() {
        let store = settings(primary_only());
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch()
            .returning(|_, _| Err(SyncError::AuthenticationFailed("bad token".into())));

        let loader = SourceLoader::new(store.clone(), Arc::new(provider));
        let err = loader.load_all(LoadOptions::default()).await.unwrap_err();
        assert!(matches!(err, SyncError::AuthenticationFailed(_)));

        let saved = store.get_all().await.unwrap();
        assert_eq!(saved.get("source1_etag"), Some(&json!("\"v1\"")));
    }

    #[tokio::test]
    async fn test_legacy_settings_are_migrated() {
        let store = settings(json!({
            "owner": "octo",
            "repo": "marks",
            "sourcePath": "bar.json",
            "pat": "ghp_legacy",
        }));
        let provider = MockProvider::new();

        let loader = SourceLoader::new(store.clone(), Arc::new(provider));
        let loaded = loader.load_settings().await.unwrap();
        assert!(loaded.primary.is_configured());
        assert_eq!(loaded.primary.credential, "ghp_legacy");

        let saved = store.get_all().await.unwrap();
        assert!(!saved.contains_key("owner"));
        assert_eq!(saved.get("source1_repo"), Some(&json!("marks")));
    }
}
