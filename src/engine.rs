//! The hybrid index handle.
//!
//! [`HybridIndex`] owns the schema, the document store and the field indexes
//! behind a single reader-writer lock. Mutations hold the write lock for their
//! whole multi-index update; each query holds the read lock for its whole
//! evaluation, so a query never observes a half-applied mutation.
//!
//! # Examples
//!
//! ```
//! use pilum::config::IndexConfig;
//! use pilum::document::{Document, NumericType};
//! use pilum::engine::HybridIndex;
//! use pilum::query::QueryExpr;
//! use pilum::schema::Schema;
//! use pilum::vector::DistanceMetric;
//!
//! let index = HybridIndex::new(IndexConfig::default()).unwrap();
//! index
//!     .create_schema(
//!         Schema::builder()
//!             .tag_field("channel")
//!             .numeric_field("agentId", NumericType::Integer)
//!             .vector_field("embedding", 2, DistanceMetric::Cosine)
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let doc = Document::builder()
//!     .add_tag("channel", "Phone")
//!     .add_integer("agentId", 111)
//!     .add_vector("embedding", vec![1.0, 0.0])
//!     .build();
//! index.upsert_document(1, doc).unwrap();
//!
//! let results = index
//!     .query(&QueryExpr::new().tag("channel", "Phone").knn("embedding", vec![1.0, 0.0], 1))
//!     .unwrap();
//! assert_eq!(results.ids(), vec![1]);
//! ```

use std::sync::Arc;

use log::{debug, info};
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::IndexConfig;
use crate::document::{DocId, Document};
use crate::error::{PilumError, Result};
use crate::index::{FieldStats, IndexManager};
use crate::ingest::IngestionPipeline;
use crate::query::{QueryExecutor, QueryExpr, QueryParser, RankedResults};
use crate::schema::Schema;
use crate::store::DocumentStore;

/// Outcome of re-indexing the store under a replacement schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Documents indexed under the new schema.
    pub indexed: usize,
    /// Documents removed because they did not conform.
    pub skipped: usize,
}

/// Statistics for the whole index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Index name from the configuration.
    pub name: String,
    /// Number of stored documents.
    pub documents: usize,
    /// Per-field index statistics, in schema order.
    pub fields: Vec<FieldStats>,
}

#[derive(Debug)]
struct IndexState {
    manager: IndexManager,
    store: DocumentStore,
}

/// A thread-safe in-memory hybrid document index.
#[derive(Debug)]
pub struct HybridIndex {
    config: IndexConfig,
    state: RwLock<Option<IndexState>>,
}

impl HybridIndex {
    /// Create an index with no schema yet.
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(HybridIndex {
            config,
            state: RwLock::new(None),
        })
    }

    /// Create an index and publish `schema` immediately.
    pub fn with_schema(schema: Schema, config: IndexConfig) -> Result<Self> {
        let index = HybridIndex::new(config)?;
        index.create_schema(schema)?;
        Ok(index)
    }

    /// Get the configuration.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Publish the schema and create an empty index per field.
    ///
    /// Fails with a schema error if a schema has already been published; use
    /// [`replace_schema`](Self::replace_schema) to change it.
    pub fn create_schema(&self, schema: Schema) -> Result<()> {
        let mut state = self.state.write();
        if state.is_some() {
            return Err(PilumError::schema(
                "A schema is already published; use replace_schema to change it",
            ));
        }
        let manager = IndexManager::new(schema, &self.config)?;
        info!(
            "Index '{}': published schema with {} field(s)",
            self.config.name,
            manager.schema().len()
        );
        *state = Some(IndexState {
            manager,
            store: DocumentStore::new(),
        });
        Ok(())
    }

    /// Swap in a new schema and re-index every stored document under it.
    ///
    /// Documents that do not conform to the new schema are removed.
    pub fn replace_schema(&self, schema: Schema) -> Result<RebuildReport> {
        let mut manager = IndexManager::new(schema, &self.config)?;
        let mut state = self.state.write();

        let report = match state.as_mut() {
            Some(current) => {
                let result = IngestionPipeline::new(&mut manager, &mut current.store).reindex_all();
                // The store now only holds what the new manager has indexed.
                current.manager = manager;
                let skipped = result?;
                RebuildReport {
                    indexed: current.store.len(),
                    skipped: skipped.len(),
                }
            }
            None => {
                *state = Some(IndexState {
                    manager,
                    store: DocumentStore::new(),
                });
                RebuildReport::default()
            }
        };

        info!(
            "Index '{}': rebuilt under new schema, {} indexed, {} skipped",
            self.config.name, report.indexed, report.skipped
        );
        Ok(report)
    }

    /// Get the published schema.
    pub fn schema(&self) -> Option<Arc<Schema>> {
        self.state
            .read()
            .as_ref()
            .map(|state| Arc::clone(state.manager.schema()))
    }

    fn no_schema() -> PilumError {
        PilumError::schema("No schema has been published")
    }

    /// Insert a document, or fully replace the one stored under `id`.
    pub fn upsert_document(&self, id: DocId, document: Document) -> Result<()> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or_else(Self::no_schema)?;
        IngestionPipeline::new(&mut state.manager, &mut state.store).upsert(id, document)
    }

    /// Delete a document. Returns whether it existed.
    pub fn delete_document(&self, id: DocId) -> Result<bool> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or_else(Self::no_schema)?;
        IngestionPipeline::new(&mut state.manager, &mut state.store).delete(id)
    }

    /// Get a copy of a stored document.
    pub fn get_document(&self, id: DocId) -> Option<Document> {
        self.state
            .read()
            .as_ref()
            .and_then(|state| state.store.get(id).cloned())
    }

    /// Run a structured query.
    pub fn query(&self, query: &QueryExpr) -> Result<RankedResults> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or_else(Self::no_schema)?;
        QueryExecutor::new(&state.manager, &state.store)
            .with_default_limit(self.config.default_limit)
            .execute(query)
    }

    /// Parse and run a filter query string.
    pub fn query_str(&self, query_str: &str) -> Result<RankedResults> {
        let guard = self.state.read();
        let state = guard.as_ref().ok_or_else(Self::no_schema)?;
        let query = QueryParser::new(Arc::clone(state.manager.schema())).parse(query_str)?;
        debug!("Parsed '{query_str}' into {:?}", query.predicates);
        QueryExecutor::new(&state.manager, &state.store)
            .with_default_limit(self.config.default_limit)
            .execute(&query)
    }

    /// Parse a filter query string against the published schema.
    pub fn parse_query(&self, query_str: &str) -> Result<QueryExpr> {
        let schema = self.schema().ok_or_else(Self::no_schema)?;
        QueryParser::new(schema).parse(query_str)
    }

    /// Check that every field index agrees with the document store.
    pub fn verify(&self) -> Result<()> {
        let guard = self.state.read();
        match guard.as_ref() {
            Some(state) => state.manager.verify(&state.store),
            None => Ok(()),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .as_ref()
            .map(|state| state.store.len())
            .unwrap_or(0)
    }

    /// Check whether the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index statistics.
    pub fn stats(&self) -> IndexStats {
        let guard = self.state.read();
        IndexStats {
            name: self.config.name.clone(),
            documents: guard.as_ref().map(|state| state.store.len()).unwrap_or(0),
            fields: guard
                .as_ref()
                .map(|state| state.manager.stats())
                .unwrap_or_default(),
        }
    }
}
