//! Atomic multi-index mutation.

use log::{debug, error, warn};

use crate::document::{DocId, Document};
use crate::error::{PilumError, Result};
use crate::index::IndexManager;
use crate::store::DocumentStore;

/// Applies document mutations to the store and the field indexes together.
///
/// The pipeline borrows both halves mutably, so the caller must already hold
/// exclusive access to them. Every operation either leaves store and indexes
/// fully updated or leaves them exactly as they were.
#[derive(Debug)]
pub struct IngestionPipeline<'a> {
    manager: &'a mut IndexManager,
    store: &'a mut DocumentStore,
}

impl<'a> IngestionPipeline<'a> {
    /// Create a pipeline over an index manager and its document store.
    pub fn new(manager: &'a mut IndexManager, store: &'a mut DocumentStore) -> Self {
        IngestionPipeline { manager, store }
    }

    /// Insert a document, or fully replace the document stored under `id`.
    ///
    /// The document is validated before anything is touched. Postings of a
    /// replaced document are retracted before the new ones are added.
    pub fn upsert(&mut self, id: DocId, document: Document) -> Result<()> {
        self.manager.validate(&document)?;

        let previous = self.store.get(id).cloned();
        if let Some(previous) = &previous {
            self.manager.deindex_document(id, previous)?;
        }

        if let Err(e) = self.manager.index_document(id, &document) {
            self.restore(id, previous.as_ref());
            return Err(e);
        }

        if let Err(e) = self.store.upsert(id, document.clone(), self.manager.schema()) {
            let _ = self.manager.deindex_document(id, &document);
            self.restore(id, previous.as_ref());
            return Err(e);
        }

        debug!(
            "{} document {id}",
            if previous.is_some() { "Replaced" } else { "Inserted" }
        );
        Ok(())
    }

    fn restore(&mut self, id: DocId, previous: Option<&Document>) {
        if let Some(previous) = previous {
            if let Err(e) = self.manager.index_document(id, previous) {
                error!("Failed to restore postings of document {id}: {e}");
            }
        }
    }

    /// Delete the document stored under `id`.
    ///
    /// Returns `false` when no such document exists; the index is unchanged.
    pub fn delete(&mut self, id: DocId) -> Result<bool> {
        let Some(document) = self.store.get(id) else {
            debug!("Delete of absent document {id}");
            return Ok(false);
        };

        self.manager.deindex_document(id, document)?;
        if self.store.delete(id).is_none() {
            return Err(PilumError::index(format!(
                "Document {id} vanished from the store during delete"
            )));
        }
        debug!("Deleted document {id}");
        Ok(true)
    }

    /// Index every document currently in the store from scratch.
    ///
    /// Indexes are emptied first. Every drained document is either indexed
    /// and put back, or dropped from the store and its id returned. A
    /// document that fails to index has its partial postings retracted, so
    /// the store and the indexes agree whatever happens.
    pub fn reindex_all(&mut self) -> Result<Vec<DocId>> {
        self.manager.rebuild();

        let mut skipped = Vec::new();
        for (id, document) in self.store.drain() {
            if let Err(e) = self.reinsert(id, document) {
                warn!("Dropping document {id} during rebuild: {e}");
                skipped.push(id);
            }
        }
        Ok(skipped)
    }

    fn reinsert(&mut self, id: DocId, document: Document) -> Result<()> {
        self.manager.validate(&document)?;
        self.manager.index_document(id, &document)?;
        if let Err(e) = self.store.upsert(id, document.clone(), self.manager.schema()) {
            if let Err(retract) = self.manager.deindex_document(id, &document) {
                error!("Failed to retract postings of document {id}: {retract}");
            }
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::config::IndexConfig;
    use crate::document::{FieldValue, Number, NumericType};
    use crate::schema::Schema;
    use crate::vector::DistanceMetric;

    fn create_test_state() -> (IndexManager, DocumentStore) {
        let schema = Schema::builder()
            .tag_field("channel")
            .numeric_field("agentId", NumericType::Integer)
            .text_field("transcript")
            .vector_field("embedding", 2, DistanceMetric::Cosine)
            .build()
            .unwrap();
        (
            IndexManager::new(schema, &IndexConfig::default()).unwrap(),
            DocumentStore::new(),
        )
    }

    fn call(channel: &str, agent: i64, transcript: &str, embedding: Vec<f32>) -> Document {
        Document::builder()
            .add_tag("channel", channel)
            .add_integer("agentId", agent)
            .add_text("transcript", transcript)
            .add_vector("embedding", embedding)
            .build()
    }

    #[test]
    fn test_upsert_replaces_postings() {
        let (mut manager, mut store) = create_test_state();
        let mut pipeline = IngestionPipeline::new(&mut manager, &mut store);
        pipeline.upsert(1, call("Phone", 111, "insurance", vec![1.0, 0.0])).unwrap();
        pipeline.upsert(1, call("Chat", 222, "billing", vec![0.0, 1.0])).unwrap();

        assert!(manager.tag_index("channel").unwrap().lookup("Phone").is_empty());
        assert_eq!(manager.tag_index("channel").unwrap().lookup("Chat").len(), 1);
        assert!(
            manager
                .numeric_index("agentId")
                .unwrap()
                .point(Number::Integer(111))
                .is_empty()
        );
        assert!(
            manager
                .text_index("transcript")
                .unwrap()
                .search_term("insurance")
                .unwrap()
                .is_empty()
        );
        assert_eq!(store.len(), 1);
        manager.verify(&store).unwrap();
    }

    #[test]
    fn test_rejected_upsert_leaves_state_untouched() {
        let (mut manager, mut store) = create_test_state();
        let mut pipeline = IngestionPipeline::new(&mut manager, &mut store);
        pipeline.upsert(1, call("Phone", 111, "insurance", vec![1.0, 0.0])).unwrap();

        let result = pipeline.upsert(1, call("Chat", 222, "billing", vec![0.0, 1.0, 0.0]));
        assert!(matches!(result, Err(PilumError::DimensionMismatch { .. })));

        let missing = Document::builder().add_tag("channel", "Chat").build();
        assert!(matches!(pipeline.upsert(2, missing), Err(PilumError::Schema(_))));

        assert_eq!(manager.tag_index("channel").unwrap().lookup("Phone").len(), 1);
        assert_eq!(store.len(), 1);
        manager.verify(&store).unwrap();
    }

    #[test]
    fn test_delete() {
        let (mut manager, mut store) = create_test_state();
        let mut pipeline = IngestionPipeline::new(&mut manager, &mut store);
        pipeline.upsert(1, call("Phone", 111, "insurance", vec![1.0, 0.0])).unwrap();

        assert!(pipeline.delete(1).unwrap());
        assert!(!pipeline.delete(1).unwrap());
        assert!(!pipeline.delete(42).unwrap());

        assert!(store.is_empty());
        assert!(manager.stats().iter().all(|field| field.postings == 0));
    }

    #[test]
    fn test_reindex_all_drops_nonconforming() {
        let (mut manager, mut store) = create_test_state();
        let mut pipeline = IngestionPipeline::new(&mut manager, &mut store);
        pipeline.upsert(1, call("Phone", 111, "insurance", vec![1.0, 0.0])).unwrap();
        pipeline.upsert(2, call("Chat", 222, "billing", vec![0.0, 1.0])).unwrap();

        let narrower = Schema::builder()
            .tag_field("channel")
            .vector_field("embedding", 3, DistanceMetric::Cosine)
            .build()
            .unwrap();
        let mut manager = IndexManager::new(narrower, &IndexConfig::default()).unwrap();
        let skipped = IngestionPipeline::new(&mut manager, &mut store)
            .reindex_all()
            .unwrap();

        assert_eq!(skipped, vec![1, 2]);
        assert!(store.is_empty());
        manager.verify(&store).unwrap();
    }

    #[test]
    fn test_reindex_all_accounts_for_every_document() {
        let (mut manager, mut store) = create_test_state();
        let mut pipeline = IngestionPipeline::new(&mut manager, &mut store);
        for id in 1..=5 {
            let mut doc = call("Phone", 111, "insurance", vec![1.0, 0.0]);
            if id % 2 == 0 {
                doc.add_field("region", FieldValue::Tag("EU".to_string()));
            }
            pipeline.upsert(id, doc).unwrap();
        }

        let with_region = Schema::builder()
            .tag_field("channel")
            .tag_field("region")
            .vector_field("embedding", 2, DistanceMetric::Euclidean)
            .build()
            .unwrap();
        let mut manager = IndexManager::new(with_region, &IndexConfig::default()).unwrap();
        let skipped = IngestionPipeline::new(&mut manager, &mut store)
            .reindex_all()
            .unwrap();

        assert_eq!(skipped, vec![1, 3, 5]);
        assert_eq!(store.ids(), BTreeSet::from([2, 4]));
        assert_eq!(manager.tag_index("region").unwrap().lookup("EU"), BTreeSet::from([2, 4]));
        manager.verify(&store).unwrap();
    }
}
