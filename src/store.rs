//! Keyed document storage.
//!
//! The [`DocumentStore`] is the single source of truth for field values. It
//! never touches field indexes; keeping postings in step with it is the job of
//! the ingestion pipeline.

use std::collections::{BTreeMap, BTreeSet};

use crate::document::{DocId, Document};
use crate::error::Result;
use crate::schema::Schema;

/// Documents keyed by id, iterated in ascending id order.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: BTreeMap<DocId, Document>,
}

impl DocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        DocumentStore::default()
    }

    /// Insert or fully replace a document after checking it against `schema`.
    ///
    /// Nothing is stored when validation fails.
    pub fn upsert(&mut self, id: DocId, document: Document, schema: &Schema) -> Result<()> {
        schema.validate(&document)?;
        self.documents.insert(id, document);
        Ok(())
    }

    /// Get a document by id.
    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.documents.get(&id)
    }

    /// Check whether a document is stored under `id`.
    pub fn contains(&self, id: DocId) -> bool {
        self.documents.contains_key(&id)
    }

    /// Remove a document, returning it so its postings can be retracted.
    pub fn delete(&mut self, id: DocId) -> Option<Document> {
        self.documents.remove(&id)
    }

    /// Every live id, ascending.
    pub fn ids(&self) -> BTreeSet<DocId> {
        self.documents.keys().copied().collect()
    }

    /// Iterate over `(id, document)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Document)> {
        self.documents.iter().map(|(id, doc)| (*id, doc))
    }

    /// Remove and return every document.
    pub fn drain(&mut self) -> Vec<(DocId, Document)> {
        std::mem::take(&mut self.documents).into_iter().collect()
    }

    /// Get the number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
