//! # Synchronization Stage Machine
//!
//! ```text
//! Idle → Loading → Validating → Deduping → Reconciling → Notifying → Idle
//!           │          │            │           │
//!           │          └────────────┴───────────┴──→ Failed(kind) → Notifying
//!           └──→ Idle (nothing changed)                    └──────→ Idle
//! ```
//!
//! Transitions are validated so a run can never skip validation or reach
//! the bar without having loaded anything.

use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{ErrorKind, Result, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Idle,
    Loading,
    Validating,
    Deduping,
    Reconciling,
    Notifying,
    Failed(ErrorKind),
}

impl SyncStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStage::Idle => "idle",
            SyncStage::Loading => "loading",
            SyncStage::Validating => "validating",
            SyncStage::Deduping => "deduping",
            SyncStage::Reconciling => "reconciling",
            SyncStage::Notifying => "notifying",
            SyncStage::Failed(_) => "failed",
        }
    }

    pub fn can_transition_to(&self, next: SyncStage) -> bool {
        use SyncStage::*;
        match (self, next) {
            (Idle, Loading) => true,
            // all sources unchanged, or a connectivity check that stops after loading
            (Loading, Idle) => true,
            (Loading, Validating) => true,
            // connectivity check ends after validation
            (Validating, Idle) => true,
            (Validating, Deduping) => true,
            (Deduping, Reconciling) => true,
            (Reconciling, Notifying) => true,
            (Loading | Validating | Deduping | Reconciling, Failed(_)) => true,
            (Failed(_), Notifying | Idle) => true,
            (Notifying, Idle) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStage::Failed(kind) => write!(f, "failed({})", kind),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Current stage of one run, publishing each change on the event bus
#[derive(Debug)]
pub struct StageTracker {
    stage: SyncStage,
    events: Option<EventBus>,
}

impl StageTracker {
    pub fn new(events: Option<EventBus>) -> Self {
        Self {
            stage: SyncStage::Idle,
            events,
        }
    }

    pub fn stage(&self) -> SyncStage {
        self.stage
    }

    pub fn advance(&mut self, next: SyncStage) -> Result<()> {
        if !self.stage.can_transition_to(next) {
            return Err(SyncError::InvalidStateTransition {
                from: self.stage.to_string(),
                to: next.to_string(),
            });
        }

        debug!(from = %self.stage, to = %next, "Sync stage changed");
        self.stage = next;
        if let Some(events) = &self.events {
            let _ = events.emit(CoreEvent::Sync(SyncEvent::StageChanged {
                stage: next.to_string(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut tracker = StageTracker::new(None);
        for stage in [
            SyncStage::Loading,
            SyncStage::Validating,
            SyncStage::Deduping,
            SyncStage::Reconciling,
            SyncStage::Notifying,
            SyncStage::Idle,
        ] {
            tracker.advance(stage).unwrap();
        }
        assert_eq!(tracker.stage(), SyncStage::Idle);
    }

    #[test]
    fn test_cannot_skip_validation() {
        assert!(!SyncStage::Loading.can_transition_to(SyncStage::Reconciling));
        assert!(!SyncStage::Loading.can_transition_to(SyncStage::Deduping));
        assert!(!SyncStage::Idle.can_transition_to(SyncStage::Reconciling));

        let mut tracker = StageTracker::new(None);
        tracker.advance(SyncStage::Loading).unwrap();
        let err = tracker.advance(SyncStage::Reconciling).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid stage transition from loading to reconciling"
        );
        assert_eq!(tracker.stage(), SyncStage::Loading);
    }

    #[test]
    fn test_failure_paths() {
        let failed = SyncStage::Failed(ErrorKind::DataNotFound);
        assert!(SyncStage::Loading.can_transition_to(failed));
        assert!(SyncStage::Reconciling.can_transition_to(failed));
        assert!(!SyncStage::Idle.can_transition_to(failed));
        assert!(failed.can_transition_to(SyncStage::Notifying));
        assert!(!failed.can_transition_to(SyncStage::Reconciling));
        assert_eq!(failed.to_string(), "failed(data_not_found)");
    }

    #[tokio::test]
    async fn test_changes_are_published() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let mut tracker = StageTracker::new(Some(bus));
        tracker.advance(SyncStage::Loading).unwrap();
        tracker.advance(SyncStage::Idle).unwrap();

        let stages: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| match event {
                CoreEvent::Sync(SyncEvent::StageChanged { stage }) => stage,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(stages, vec!["loading", "idle"]);
    }
}
