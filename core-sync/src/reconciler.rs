//! # Bookmark Bar Reconciler
//!
//! Rewrites the top level of the bookmark bar so it matches a target list.
//!
//! ## Algorithm
//!
//! For every titled target item:
//! 1. If the bar already has an entry with that title, remove it
//!    (a leaf with `remove_node`, a folder with `remove_subtree`).
//! 2. Create the item as a new bar child, then create folder contents in
//!    declared order, depth first.
//!
//! Different titles are processed concurrently; within one title the
//! removal always completes before the creation starts. Bar entries whose
//! titles are not in the target are never touched. Nothing is rolled back
//! when a host call fails.

use std::collections::HashMap;
use std::sync::Arc;

use bridge_traits::bookmarks::{BookmarkNode, BookmarkStore, CreateDetails, NodeId};
use futures::future::{join_all, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::error::{Result, SyncError};
use crate::model::BookmarkItem;

/// Titles browsers use for the bookmark bar folder
pub const BAR_TITLES: [&str; 2] = ["Bookmarks Bar", "Bookmarks Toolbar"];

/// Counters for one reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    /// Existing bar entries removed before re-creation
    pub removed: u64,
    /// Nodes created, nested ones included
    pub created: u64,
    /// Separators not materialized
    pub skipped_separators: u64,
}

impl ReconcileStats {
    fn absorb(&mut self, other: ReconcileStats) {
        self.removed += other.removed;
        self.created += other.created;
        self.skipped_separators += other.skipped_separators;
    }
}

pub struct Reconciler {
    store: Arc<dyn BookmarkStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn BookmarkStore>) -> Self {
        Self { store }
    }

    /// Locate the bookmark bar among the root's children
    pub async fn find_bar(&self) -> Result<NodeId> {
        let root = self.store.root_id().await?;
        self.store
            .list_children(&root)
            .await?
            .into_iter()
            .find(|node| BAR_TITLES.contains(&node.title.as_str()))
            .map(|node| node.id)
            .ok_or(SyncError::BarNotFound)
    }

    /// Current bar children keyed by title; the last child wins on duplicates
    pub async fn existing_entries(&self, bar_id: &str) -> Result<HashMap<String, BookmarkNode>> {
        let children = self.store.list_children(bar_id).await?;
        Ok(children
            .into_iter()
            .map(|node| (node.title.clone(), node))
            .collect())
    }

    /// Apply `items` to the bar.
    ///
    /// Titles are expected to be unique. Every title runs to completion even
    /// when another fails; the first failure in target order is returned.
    #[instrument(skip_all, fields(items = items.len()))]
    pub async fn reconcile(&self, items: &[BookmarkItem]) -> Result<ReconcileStats> {
        let bar_id = self.find_bar().await?;
        let existing = self.existing_entries(&bar_id).await?;
        debug!(bar_id = %bar_id, existing = existing.len(), "Snapshot of bookmark bar taken");

        let mut stats = ReconcileStats::default();
        let mut tasks = Vec::with_capacity(items.len());
        for item in items {
            match item.title() {
                Some(title) => tasks.push(self.replace_entry(&bar_id, item, existing.get(title))),
                None => {
                    debug!("Skipping untitled top-level separator");
                    stats.skipped_separators += 1;
                }
            }
        }

        let mut first_error = None;
        for result in join_all(tasks).await {
            match result {
                Ok(entry_stats) => stats.absorb(entry_stats),
                Err(e) => {
                    error!(error = %e, "Failed to reconcile bookmark bar entry");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        info!(
            removed = stats.removed,
            created = stats.created,
            skipped_separators = stats.skipped_separators,
            "Bookmark bar reconciled"
        );
        Ok(stats)
    }

    async fn replace_entry(
        &self,
        bar_id: &str,
        item: &BookmarkItem,
        existing: Option<&BookmarkNode>,
    ) -> Result<ReconcileStats> {
        let mut stats = ReconcileStats::default();

        if let Some(node) = existing {
            if node.is_folder() {
                self.store.remove_subtree(&node.id).await?;
            } else {
                self.store.remove_node(&node.id).await?;
            }
            debug!(id = %node.id, title = %node.title, "Removed existing bar entry");
            stats.removed += 1;
        }

        stats.absorb(self.create_item(bar_id, item).await?);
        Ok(stats)
    }

    fn create_item<'a>(
        &'a self,
        parent_id: &'a str,
        item: &'a BookmarkItem,
    ) -> BoxFuture<'a, Result<ReconcileStats>> {
        async move {
            let mut stats = ReconcileStats::default();
            match item {
                BookmarkItem::Bookmark { title, url } => {
                    self.store
                        .create(CreateDetails::bookmark(parent_id, title, url))
                        .await?;
                    stats.created += 1;
                }
                BookmarkItem::Folder { title, children } => {
                    let folder = self
                        .store
                        .create(CreateDetails::folder(parent_id, title))
                        .await?;
                    stats.created += 1;
                    for child in children {
                        stats.absorb(self.create_item(&folder.id, child).await?);
                    }
                }
                BookmarkItem::Separator => {
                    if self.store.supports_separators() {
                        self.store.create_separator(parent_id).await?;
                        stats.created += 1;
                    } else {
                        stats.skipped_separators += 1;
                    }
                }
            }
            Ok(stats)
        }
        .boxed()
    }
}
