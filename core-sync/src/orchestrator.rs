//! # Synchronization Orchestrator
//!
//! Runs load → validate → dedupe → reconcile → notify and turns every
//! failure into a user-visible outcome.
//!
//! ## Overview
//!
//! [`SyncOrchestrator::synchronize`] never fails: each error is projected
//! onto its [`ErrorKind`], logged, published on the event bus and (unless
//! the kind is silent) shown as a notification. When every source reports
//! "not modified" the run ends after loading without touching the bar or
//! notifying.
//!
//! [`SyncOrchestrator::check_connectivity`] loads and validates with caching
//! disabled and hands any error back to the caller.
//!
//! Only one `synchronize` runs at a time per orchestrator; an overlapping
//! call returns [`SyncOutcome::AlreadyRunning`] immediately.

use std::sync::Arc;
use std::time::Instant;

use bridge_traits::notification::{Notification, Notifier};
use bridge_traits::time::Clock;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::dedupe::merge_collections;
use crate::error::{ErrorKind, NotificationMessage, Result, SUCCESS_NOTIFICATION};
use crate::loader::{LoadOptions, LoadOutcome, SourceLoader};
use crate::model::BookmarkCollection;
use crate::reconciler::{ReconcileStats, Reconciler};
use crate::stage::{StageTracker, SyncStage};
use crate::validator::validate_all;

/// Prefix of every notification id this crate creates
pub const NOTIFICATION_ID_PREFIX: &str = "sync-bookmarks-notification-";

/// How a `synchronize` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The bar was rewritten
    Synchronized(ReconcileStats),
    /// No source changed since the cached revision
    Unchanged,
    /// The primary source is not configured; nothing was shown to the user
    NotConfigured,
    /// Another run was in progress
    AlreadyRunning,
    /// The run failed and the user was notified
    Failed { kind: ErrorKind },
}

enum RunResult {
    Unchanged,
    Reconciled(ReconcileStats),
}

pub struct SyncOrchestrator {
    loader: SourceLoader,
    reconciler: Reconciler,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    run_lock: Mutex<()>,
}

impl SyncOrchestrator {
    pub fn new(
        loader: SourceLoader,
        reconciler: Reconciler,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Self {
        Self {
            loader,
            reconciler,
            notifier,
            clock,
            events,
            run_lock: Mutex::new(()),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Run one synchronization.
    ///
    /// `force` bypasses the cached revision tags so content is fetched and
    /// applied even if unchanged.
    #[instrument(skip(self))]
    pub async fn synchronize(&self, force: bool) -> SyncOutcome {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("Synchronization already in progress, skipping");
            self.emit(SyncEvent::Skipped {
                reason: "already_running".to_string(),
            });
            return SyncOutcome::AlreadyRunning;
        };

        info!(
            "Starting {}bookmark synchronization",
            if force { "forced " } else { "" }
        );
        self.emit(SyncEvent::Started { force });
        let started = Instant::now();
        let mut tracker = StageTracker::new(Some(self.events.clone()));

        match self.run(&mut tracker, force).await {
            Ok(RunResult::Unchanged) => {
                self.advance(&mut tracker, SyncStage::Idle);
                info!("No changes detected in bookmarks, nothing to sync");
                self.emit(SyncEvent::Unchanged);
                SyncOutcome::Unchanged
            }
            Ok(RunResult::Reconciled(stats)) => {
                self.advance(&mut tracker, SyncStage::Notifying);
                self.notify(SUCCESS_NOTIFICATION).await;
                self.advance(&mut tracker, SyncStage::Idle);

                info!(
                    removed = stats.removed,
                    created = stats.created,
                    "Bookmarks synchronized"
                );
                self.emit(SyncEvent::Completed {
                    removed: stats.removed,
                    created: stats.created,
                    skipped_separators: stats.skipped_separators,
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                SyncOutcome::Synchronized(stats)
            }
            Err(e) => {
                let kind = e.kind();
                self.advance(&mut tracker, SyncStage::Failed(kind));

                if kind == ErrorKind::ConfigurationMissing {
                    info!(error = %e, "Bookmark source not configured, skipping synchronization");
                    self.advance(&mut tracker, SyncStage::Idle);
                    self.emit(SyncEvent::Skipped {
                        reason: "not_configured".to_string(),
                    });
                    return SyncOutcome::NotConfigured;
                }

                error!(kind = %kind, error = %e, "Bookmark synchronization failed");
                self.emit(SyncEvent::Failed {
                    kind: kind.to_string(),
                    message: e.to_string(),
                });

                self.advance(&mut tracker, SyncStage::Notifying);
                if let Some(message) = kind.notification() {
                    self.notify(message).await;
                }
                self.advance(&mut tracker, SyncStage::Idle);
                SyncOutcome::Failed { kind }
            }
        }
    }

    async fn run(&self, tracker: &mut StageTracker, force: bool) -> Result<RunResult> {
        tracker.advance(SyncStage::Loading)?;
        let documents = match self.loader.load_all(LoadOptions::for_sync(force)).await? {
            LoadOutcome::NoChange => return Ok(RunResult::Unchanged),
            LoadOutcome::Loaded(documents) => documents,
        };

        tracker.advance(SyncStage::Validating)?;
        let collections = validate_all(&documents)?;

        tracker.advance(SyncStage::Deduping)?;
        let items = merge_collections(&collections);

        tracker.advance(SyncStage::Reconciling)?;
        let stats = self.reconciler.reconcile(&items).await?;
        Ok(RunResult::Reconciled(stats))
    }

    /// Load and validate every consulted source without touching the bar or
    /// the cached revision tags.
    #[instrument(skip(self))]
    pub async fn check_connectivity(&self) -> Result<Vec<BookmarkCollection>> {
        let mut tracker = StageTracker::new(None);
        tracker.advance(SyncStage::Loading)?;
        let documents = match self
            .loader
            .load_all(LoadOptions::connectivity_check())
            .await?
        {
            LoadOutcome::NoChange => Vec::new(),
            LoadOutcome::Loaded(documents) => documents,
        };

        tracker.advance(SyncStage::Validating)?;
        let collections = validate_all(&documents)?;
        tracker.advance(SyncStage::Idle)?;

        info!(collections = collections.len(), "Connectivity check passed");
        Ok(collections)
    }

    fn advance(&self, tracker: &mut StageTracker, next: SyncStage) {
        if let Err(e) = tracker.advance(next) {
            error!(error = %e, "Unexpected sync stage transition");
        }
    }

    async fn notify(&self, message: NotificationMessage) {
        let id = format!(
            "{}{}",
            NOTIFICATION_ID_PREFIX,
            self.clock.unix_timestamp_millis()
        );
        let notification = Notification::new(id, message.title, message.body);
        if let Err(e) = self.notifier.display(notification).await {
            warn!(error = %e, title = message.title, "Failed to display notification");
        }
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.emit(CoreEvent::Sync(event));
    }
}
