//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and headless hosts.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using a SQLite-backed key-value table, or an in-memory map
//! - `BookmarkStore` as an in-memory tree shaped like a browser profile
//! - `Notifier` that writes to the `tracing` log
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{MemoryBookmarkStore, ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::try_new()?;
//!     let settings = SqliteSettingsStore::new("settings.db".into()).await?;
//!     let bookmarks = MemoryBookmarkStore::new();
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod bookmarks;
mod http;
mod notification;
mod settings;

pub use bookmarks::{MemoryBookmarkStore, StoreCall, TreeEntry, DEFAULT_BAR_TITLE};
pub use http::ReqwestHttpClient;
pub use notification::TracingNotifier;
pub use settings::{MemorySettingsStore, SqliteSettingsStore};
