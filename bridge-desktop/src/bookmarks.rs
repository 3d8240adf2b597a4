//! In-memory bookmark tree
//!
//! Mirrors the shape of a browser profile: an invisible root whose first
//! children are the bookmark bar and "Other Bookmarks". Useful for headless
//! hosts and as the store behind integration tests, where the recorded
//! [`StoreCall`] log shows exactly which host operations a run issued.

use async_trait::async_trait;
use bridge_traits::{
    bookmarks::{BookmarkNode, BookmarkStore, CreateDetails, NodeId},
    error::{BridgeError, Result},
};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub const DEFAULT_BAR_TITLE: &str = "Bookmarks Bar";
const OTHER_TITLE: &str = "Other Bookmarks";
const ROOT_ID: &str = "0";

/// A host operation recorded by [`MemoryBookmarkStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create {
        parent_id: NodeId,
        title: String,
        url: Option<String>,
    },
    CreateSeparator {
        parent_id: NodeId,
    },
    RemoveNode(NodeId),
    RemoveSubtree(NodeId),
}

/// Nested view of a subtree, for assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntry {
    Bookmark { title: String, url: String },
    Folder { title: String, children: Vec<TreeEntry> },
    Separator,
}

#[derive(Debug, Clone)]
struct StoredNode {
    title: String,
    url: Option<String>,
    separator: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct TreeState {
    nodes: HashMap<NodeId, StoredNode>,
    next_id: u64,
    calls: Vec<StoreCall>,
    failing_titles: HashSet<String>,
}

impl TreeState {
    fn allocate_id(&mut self) -> NodeId {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn insert(
        &mut self,
        parent_id: &str,
        title: String,
        url: Option<String>,
        separator: bool,
    ) -> Result<NodeId> {
        let parent = self
            .nodes
            .get(parent_id)
            .ok_or_else(|| BridgeError::NodeNotFound(parent_id.to_string()))?;
        if parent.url.is_some() || parent.separator {
            return Err(BridgeError::OperationFailed(format!(
                "Node {} cannot have children",
                parent_id
            )));
        }

        let id = self.allocate_id();
        self.nodes.insert(
            id.clone(),
            StoredNode {
                title,
                url,
                separator,
                parent: Some(parent_id.to_string()),
                children: Vec::new(),
            },
        );
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children.push(id.clone());
        }
        Ok(id)
    }

    fn detach(&mut self, id: &str) -> Result<StoredNode> {
        if id == ROOT_ID {
            return Err(BridgeError::OperationFailed(
                "The root node cannot be removed".to_string(),
            ));
        }
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| BridgeError::NodeNotFound(id.to_string()))?;
        if let Some(parent) = node.parent.as_ref().and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|child| child != id);
        }
        Ok(node)
    }

    fn drop_descendants(&mut self, children: Vec<NodeId>) {
        for child in children {
            if let Some(node) = self.nodes.remove(&child) {
                self.drop_descendants(node.children);
            }
        }
    }

    fn view(&self, id: &str) -> Option<BookmarkNode> {
        self.nodes.get(id).map(|node| BookmarkNode {
            id: id.to_string(),
            title: node.title.clone(),
            url: node.url.clone(),
        })
    }

    fn entries(&self, parent_id: &str) -> Vec<TreeEntry> {
        let Some(parent) = self.nodes.get(parent_id) else {
            return Vec::new();
        };
        parent
            .children
            .iter()
            .filter_map(|id| {
                let node = self.nodes.get(id)?;
                Some(if node.separator {
                    TreeEntry::Separator
                } else if let Some(url) = &node.url {
                    TreeEntry::Bookmark {
                        title: node.title.clone(),
                        url: url.clone(),
                    }
                } else {
                    TreeEntry::Folder {
                        title: node.title.clone(),
                        children: self.entries(id),
                    }
                })
            })
            .collect()
    }
}

/// In-memory [`BookmarkStore`]
#[derive(Debug)]
pub struct MemoryBookmarkStore {
    state: Mutex<TreeState>,
    bar_id: Option<NodeId>,
    separators: bool,
}

impl MemoryBookmarkStore {
    /// A tree with a "Bookmarks Bar" and "Other Bookmarks" under the root
    pub fn new() -> Self {
        Self::with_bar_title(DEFAULT_BAR_TITLE)
    }

    /// A tree whose bar folder carries a host-specific title, e.g. "Bookmarks Toolbar"
    pub fn with_bar_title(title: &str) -> Self {
        let mut store = Self::without_bar();
        let bar_id = {
            let state = store.state.get_mut().unwrap_or_else(|p| p.into_inner());
            let bar_id = state.insert(ROOT_ID, title.to_string(), None, false);
            let _ = state.insert(ROOT_ID, OTHER_TITLE.to_string(), None, false);
            bar_id.ok()
        };
        store.bar_id = bar_id;
        store
    }

    /// A tree with only "Other Bookmarks" under the root
    pub fn without_bar() -> Self {
        let mut state = TreeState::default();
        state.nodes.insert(
            ROOT_ID.to_string(),
            StoredNode {
                title: String::new(),
                url: None,
                separator: false,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            state: Mutex::new(state),
            bar_id: None,
            separators: false,
        }
    }

    /// Toggle native separator support
    pub fn with_separator_support(mut self, enabled: bool) -> Self {
        self.separators = enabled;
        self
    }

    /// Make every `create` call for this title fail
    pub fn fail_creates_titled(&self, title: impl Into<String>) {
        self.lock().failing_titles.insert(title.into());
    }

    fn lock(&self) -> MutexGuard<'_, TreeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn bar_id(&self) -> Option<NodeId> {
        self.bar_id.clone()
    }

    /// Add a node without recording a call
    pub fn seed(&self, details: CreateDetails) -> Result<NodeId> {
        self.lock()
            .insert(&details.parent_id, details.title, details.url, false)
    }

    /// Nested view of the bookmark bar
    pub fn bar_entries(&self) -> Vec<TreeEntry> {
        match &self.bar_id {
            Some(id) => self.lock().entries(id),
            None => Vec::new(),
        }
    }

    /// Every host operation issued so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().nodes.contains_key(id)
    }
}

impl Default for MemoryBookmarkStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookmarkStore for MemoryBookmarkStore {
    async fn root_id(&self) -> Result<NodeId> {
        Ok(ROOT_ID.to_string())
    }

    async fn list_children(&self, parent_id: &str) -> Result<Vec<BookmarkNode>> {
        let state = self.lock();
        let parent = state
            .nodes
            .get(parent_id)
            .ok_or_else(|| BridgeError::NodeNotFound(parent_id.to_string()))?;
        Ok(parent
            .children
            .iter()
            .filter_map(|id| state.view(id))
            .collect())
    }

    async fn create(&self, details: CreateDetails) -> Result<BookmarkNode> {
        let mut state = self.lock();
        state.calls.push(StoreCall::Create {
            parent_id: details.parent_id.clone(),
            title: details.title.clone(),
            url: details.url.clone(),
        });
        if state.failing_titles.contains(&details.title) {
            return Err(BridgeError::OperationFailed(format!(
                "Refused to create '{}'",
                details.title
            )));
        }
        let id = state.insert(
            &details.parent_id,
            details.title.clone(),
            details.url.clone(),
            false,
        )?;
        debug!(id = %id, "Created bookmark node");
        Ok(BookmarkNode {
            id,
            title: details.title,
            url: details.url,
        })
    }

    async fn remove_node(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(StoreCall::RemoveNode(id.to_string()));
        let has_children = state
            .nodes
            .get(id)
            .map(|node| !node.children.is_empty())
            .ok_or_else(|| BridgeError::NodeNotFound(id.to_string()))?;
        if has_children {
            return Err(BridgeError::OperationFailed(format!(
                "Folder {} is not empty",
                id
            )));
        }
        state.detach(id)?;
        Ok(())
    }

    async fn remove_subtree(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(StoreCall::RemoveSubtree(id.to_string()));
        let node = state.detach(id)?;
        state.drop_descendants(node.children);
        Ok(())
    }

    fn supports_separators(&self) -> bool {
        self.separators
    }

    async fn create_separator(&self, parent_id: &str) -> Result<BookmarkNode> {
        if !self.separators {
            return Err(BridgeError::NotAvailable(
                "Bookmark separators are not supported by this host".to_string(),
            ));
        }
        let mut state = self.lock();
        state.calls.push(StoreCall::CreateSeparator {
            parent_id: parent_id.to_string(),
        });
        let id = state.insert(parent_id, String::new(), None, true)?;
        Ok(BookmarkNode {
            id,
            title: String::new(),
            url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_contains_bar() {
        let store = MemoryBookmarkStore::with_bar_title("Bookmarks Toolbar");
        let root = store.root_id().await.unwrap();
        let titles: Vec<String> = store
            .list_children(&root)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["Bookmarks Toolbar", "Other Bookmarks"]);
    }

    #[tokio::test]
    async fn test_remove_node_rejects_non_empty_folder() {
        let store = MemoryBookmarkStore::new();
        let bar = store.bar_id().unwrap();
        let folder = store.seed(CreateDetails::folder(&bar, "Work")).unwrap();
        let leaf = store
            .seed(CreateDetails::bookmark(&folder, "Docs", "https://docs.rs"))
            .unwrap();

        assert!(store.remove_node(&folder).await.is_err());
        store.remove_subtree(&folder).await.unwrap();
        assert!(!store.contains(&folder));
        assert!(!store.contains(&leaf));
        assert!(store.bar_entries().is_empty());
    }

    #[tokio::test]
    async fn test_separator_support_toggle() {
        let store = MemoryBookmarkStore::new();
        let bar = store.bar_id().unwrap();
        assert!(store.create_separator(&bar).await.is_err());

        let store = MemoryBookmarkStore::new().with_separator_support(true);
        let bar = store.bar_id().unwrap();
        store.create_separator(&bar).await.unwrap();
        assert_eq!(store.bar_entries(), vec![TreeEntry::Separator]);
    }

    #[tokio::test]
    async fn test_calls_are_recorded_but_seeding_is_not() {
        let store = MemoryBookmarkStore::new();
        let bar = store.bar_id().unwrap();
        let seeded = store
            .seed(CreateDetails::bookmark(&bar, "Old", "http://old"))
            .unwrap();

        store.remove_node(&seeded).await.unwrap();
        store
            .create(CreateDetails::bookmark(&bar, "New", "http://new"))
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![
                StoreCall::RemoveNode(seeded),
                StoreCall::Create {
                    parent_id: bar,
                    title: "New".to_string(),
                    url: Some("http://new".to_string()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_title() {
        let store = MemoryBookmarkStore::new();
        store.fail_creates_titled("Broken");
        let bar = store.bar_id().unwrap();
        assert!(store
            .create(CreateDetails::folder(&bar, "Broken"))
            .await
            .is_err());
        assert!(store.bar_entries().is_empty());
    }
}
