//! # Host Bridge Traits
//!
//! Capability traits that each host (browser extension, desktop app, test
//! harness) implements for the bookmark sync core.
//!
//! ## Overview
//!
//! This crate defines the contract between the core and the environment it
//! runs in. The core never touches the browser, the network, or persistent
//! storage directly; every such access goes through one of the traits below,
//! injected as `Arc<dyn Trait>`.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Request/response exchange with the remote repository host
//! - [`BookmarkStore`](bookmarks::BookmarkStore) - The live bookmark tree
//! - [`Notifier`](notification::Notifier) - User-visible notifications
//! - [`SettingsStore`](storage::SettingsStore) - Source configuration and cached revision tags
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform-specific failures into it with an actionable
//! message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so that one implementation can be
//! shared across the concurrent tasks of a synchronization run.

pub mod bookmarks;
pub mod error;
pub mod http;
pub mod notification;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use bookmarks::{BookmarkNode, BookmarkStore, CreateDetails, NodeId};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use notification::{Notification, Notifier};
pub use storage::{SettingsMap, SettingsStore};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
