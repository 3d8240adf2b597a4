//! Multi-source merge
//!
//! Collections are concatenated in source-priority order and reduced to one
//! item per title. A later item replaces an earlier one with the same title
//! but keeps the earlier item's position.

use std::collections::HashMap;

use crate::model::{BookmarkCollection, BookmarkItem};

/// Reduce `items` to one entry per distinct title.
///
/// Untitled items (separators) are passed through in place.
pub fn dedupe(items: impl IntoIterator<Item = BookmarkItem>) -> Vec<BookmarkItem> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<BookmarkItem> = Vec::new();

    for item in items {
        let Some(title) = item.title().map(str::to_owned) else {
            merged.push(item);
            continue;
        };

        match slots.get(&title) {
            Some(&slot) => merged[slot] = item,
            None => {
                slots.insert(title, merged.len());
                merged.push(item);
            }
        }
    }

    merged
}

/// Concatenate the top-level items of every collection and dedupe them
pub fn merge_collections(collections: &[BookmarkCollection]) -> Vec<BookmarkItem> {
    dedupe(
        collections
            .iter()
            .flat_map(|collection| collection.bookmarks.iter().cloned()),
    )
}
