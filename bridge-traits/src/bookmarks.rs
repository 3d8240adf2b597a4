//! Bookmark Tree Abstraction
//!
//! The browser owns the bookmark tree. The core only ever sees it through
//! [`BookmarkStore`], which maps one-to-one onto the host's native calls
//! (`bookmarks.create`, `bookmarks.remove`, `bookmarks.removeTree`,
//! `bookmarks.getChildren`).
//!
//! Every call may fail or apply partially; implementations must not attempt
//! any rollback of their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Identifier assigned by the host to a bookmark node
pub type NodeId = String;

/// A node as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkNode {
    pub id: NodeId,
    pub title: String,
    /// Present for leaf bookmarks, absent for folders and separators
    pub url: Option<String>,
}

impl BookmarkNode {
    pub fn is_folder(&self) -> bool {
        self.url.is_none()
    }
}

/// Parameters for creating a bookmark or folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDetails {
    pub parent_id: NodeId,
    pub title: String,
    /// `None` creates a folder
    pub url: Option<String>,
}

impl CreateDetails {
    pub fn folder(parent_id: impl Into<NodeId>, title: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            title: title.into(),
            url: None,
        }
    }

    pub fn bookmark(
        parent_id: impl Into<NodeId>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            parent_id: parent_id.into(),
            title: title.into(),
            url: Some(url.into()),
        }
    }
}

/// Host bookmark tree
///
/// # Example
///
/// ```ignore
/// use bridge_traits::bookmarks::{BookmarkStore, CreateDetails};
///
/// async fn add_docs(store: &dyn BookmarkStore, bar_id: &str) -> Result<()> {
///     let folder = store.create(CreateDetails::folder(bar_id, "Docs")).await?;
///     store
///         .create(CreateDetails::bookmark(&folder.id, "Rust", "https://doc.rust-lang.org"))
///         .await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Identifier of the invisible root whose children are the top-level
    /// folders (bookmark bar, other bookmarks, ...)
    async fn root_id(&self) -> Result<NodeId>;

    /// Ordered children of a folder
    async fn list_children(&self, parent_id: &str) -> Result<Vec<BookmarkNode>>;

    /// Create a bookmark or folder as the last child of `parent_id`
    async fn create(&self, details: CreateDetails) -> Result<BookmarkNode>;

    /// Remove a single leaf or empty folder
    async fn remove_node(&self, id: &str) -> Result<()>;

    /// Remove a folder together with everything below it
    async fn remove_subtree(&self, id: &str) -> Result<()>;

    /// Whether the host has a dedicated separator node type
    fn supports_separators(&self) -> bool {
        false
    }

    /// Create a separator as the last child of `parent_id`
    async fn create_separator(&self, parent_id: &str) -> Result<BookmarkNode> {
        let _ = parent_id;
        Err(BridgeError::NotAvailable(
            "Bookmark separators are not supported by this host".to_string(),
        ))
    }
}
