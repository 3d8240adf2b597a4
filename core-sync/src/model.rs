//! Bookmark document model
//!
//! ```json
//! {
//!   "$schema": "urn:bookmark-sync:collection:v1",
//!   "name": "Team bookmarks",
//!   "bookmarks": [
//!     { "title": "Docs", "url": "https://docs.rs" },
//!     { "title": "Work", "children": [ { "type": "separator" } ] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// The one document schema this release accepts
pub const SUPPORTED_SCHEMA: &str = "urn:bookmark-sync:collection:v1";

/// A validated bookmark document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkCollection {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub name: String,
    pub bookmarks: Vec<BookmarkItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BookmarkItem {
    Bookmark { title: String, url: String },
    Folder { title: String, children: Vec<BookmarkItem> },
    Separator,
}

impl BookmarkItem {
    pub fn bookmark(title: impl Into<String>, url: impl Into<String>) -> Self {
        BookmarkItem::Bookmark {
            title: title.into(),
            url: url.into(),
        }
    }

    pub fn folder(title: impl Into<String>, children: Vec<BookmarkItem>) -> Self {
        BookmarkItem::Folder {
            title: title.into(),
            children,
        }
    }

    /// Separators are untitled
    pub fn title(&self) -> Option<&str> {
        match self {
            BookmarkItem::Bookmark { title, .. } | BookmarkItem::Folder { title, .. } => {
                Some(title)
            }
            BookmarkItem::Separator => None,
        }
    }
}
