//! # Bookmark Sync Module
//!
//! Keeps the browser's bookmark bar in line with bookmark documents stored in
//! one or two remote repositories.
//!
//! ## Overview
//!
//! A run moves through these steps:
//! - Loading the configured sources through a [`ContentProvider`], with
//!   conditional fetches against the cached revision tag
//! - Validating each document against the supported schema
//! - Merging all sources into one title-unique list
//! - Reconciling that list against the live bookmark bar
//! - Notifying the user of the outcome
//!
//! ## Components
//!
//! - **Model** (`model`): Typed bookmark documents
//! - **Validator** (`validator`): Structural checks with per-path issues
//! - **Deduplicator** (`dedupe`): Multi-source merge by title
//! - **Provider** (`provider`): Remote content abstraction
//! - **Loader** (`loader`): Settings, per-source loading, revision caching
//! - **Reconciler** (`reconciler`): Replace-based bar rewrite
//! - **Stage machine** (`stage`): Validated run stages
//! - **Orchestrator** (`orchestrator`): The full run and its error handling

pub mod dedupe;
pub mod error;
pub mod loader;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod reconciler;
pub mod stage;
pub mod validator;

pub use dedupe::{dedupe, merge_collections};
pub use error::{ErrorKind, NotificationMessage, Result, SyncError, ValidationIssue};
pub use loader::{LoadOptions, LoadOutcome, SourceLoader};
pub use model::{BookmarkCollection, BookmarkItem, SUPPORTED_SCHEMA};
pub use orchestrator::{SyncOrchestrator, SyncOutcome};
pub use provider::{ContentProvider, FetchOutcome, FetchRequest};
pub use reconciler::{ReconcileStats, Reconciler};
pub use stage::{StageTracker, SyncStage};
pub use validator::{validate, validate_all};
