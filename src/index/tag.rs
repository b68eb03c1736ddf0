//! Exact-match index over categorical tag fields.

use std::collections::BTreeSet;

use ahash::AHashMap;

use crate::document::DocId;

/// Postings from tag value to the documents holding it.
///
/// A tag value whose last document is removed disappears from the index, so
/// the postings never hold empty entries.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    postings: AHashMap<String, BTreeSet<DocId>>,
}

impl TagIndex {
    /// Create a new empty tag index.
    pub fn new() -> Self {
        TagIndex::default()
    }

    /// Add `id` to the postings of `tag`.
    pub fn add(&mut self, tag: &str, id: DocId) {
        self.postings.entry(tag.to_string()).or_default().insert(id);
    }

    /// Remove `id` from the postings of `tag`. Returns whether it was present.
    pub fn remove(&mut self, tag: &str, id: DocId) -> bool {
        let Some(ids) = self.postings.get_mut(tag) else {
            return false;
        };
        let removed = ids.remove(&id);
        if ids.is_empty() {
            self.postings.remove(tag);
        }
        removed
    }

    /// Documents whose tag equals `tag` exactly.
    pub fn lookup(&self, tag: &str) -> BTreeSet<DocId> {
        self.postings.get(tag).cloned().unwrap_or_default()
    }

    /// Check whether `id` is posted under `tag`.
    pub fn contains(&self, tag: &str, id: DocId) -> bool {
        self.postings
            .get(tag)
            .map(|ids| ids.contains(&id))
            .unwrap_or(false)
    }

    /// Number of distinct tag values.
    pub fn key_count(&self) -> usize {
        self.postings.len()
    }

    /// Total number of (tag, id) postings.
    pub fn posting_count(&self) -> usize {
        self.postings.values().map(BTreeSet::len).sum()
    }

    /// Drop every posting.
    pub fn clear(&mut self) {
        self.postings.clear();
    }
}
