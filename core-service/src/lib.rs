//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, settings,
//! bookmark tree, notifications, clock) and the GitHub content provider into
//! a single [`BookmarkSyncService`]. Desktop hosts typically enable the
//! `desktop-shims` feature, which supplies a reqwest HTTP client and a
//! tracing-backed notifier from `bridge-desktop` when none is given.
//!
//! Hosts own the triggers (manual action, hourly timer, startup hook); each
//! one calls [`BookmarkSyncService::synchronize`] or
//! [`BookmarkSyncService::check_connectivity`].

pub mod error;

pub use error::{CoreError, Result};

pub use core_runtime::config::{CoreConfig, CoreConfigBuilder};
pub use core_runtime::events::{CoreEvent, EventBus, EventStream, SyncEvent};
pub use core_sync::{BookmarkCollection, ErrorKind, ReconcileStats, SyncOutcome};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{
    MemoryBookmarkStore, MemorySettingsStore, ReqwestHttpClient, SqliteSettingsStore,
    TracingNotifier,
};

use std::sync::Arc;

use core_runtime::events::{Receiver, DEFAULT_EVENT_BUFFER_SIZE};
use core_sync::{Reconciler, SourceLoader, SyncOrchestrator};
use provider_github::GitHubConnector;
use tracing::info;

/// Primary façade exposed to host applications.
///
/// Cloning is cheap; clones share the same orchestrator, so the
/// one-run-at-a-time guarantee holds across them.
#[derive(Clone)]
pub struct BookmarkSyncService {
    orchestrator: Arc<SyncOrchestrator>,
}

impl BookmarkSyncService {
    /// Create a new service from the provided bridges.
    pub fn new(config: CoreConfig) -> Self {
        Self::with_event_capacity(config, DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Like [`new`](Self::new) with a custom per-subscriber event buffer.
    pub fn with_event_capacity(config: CoreConfig, capacity: usize) -> Self {
        let events = EventBus::new(capacity);
        let provider = Arc::new(GitHubConnector::new(config.http_client));
        let loader = SourceLoader::new(config.settings_store, provider).with_events(events.clone());
        let reconciler = Reconciler::new(config.bookmark_store);
        let orchestrator =
            SyncOrchestrator::new(loader, reconciler, config.notifier, config.clock, events);

        info!("Bookmark sync service initialized");
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Build the configuration and the service in one step.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Runtime`] if a required bridge is missing.
    pub fn from_builder(builder: CoreConfigBuilder) -> Result<Self> {
        Ok(Self::new(builder.build()?))
    }

    /// Run one synchronization. Never fails; the outcome says what happened.
    pub async fn synchronize(&self, force: bool) -> SyncOutcome {
        self.orchestrator.synchronize(force).await
    }

    /// Load and validate every configured source without touching the bar.
    ///
    /// # Errors
    ///
    /// Every failure is returned to the caller, including missing configuration.
    pub async fn check_connectivity(&self) -> Result<Vec<BookmarkCollection>> {
        Ok(self.orchestrator.check_connectivity().await?)
    }

    /// Subscribe to run events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.orchestrator.events().subscribe()
    }

    /// Subscribe through a filterable [`EventStream`].
    pub fn event_stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }
}
