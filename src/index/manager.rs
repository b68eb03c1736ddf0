//! Ownership of the per-field indexes for one schema.

use std::collections::HashMap;
use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::config::IndexConfig;
use crate::document::{DocId, Document};
use crate::error::{PilumError, Result};
use crate::index::{FieldIndex, FieldStats, NumericIndex, TagIndex, TextIndex, VectorIndex};
use crate::schema::Schema;
use crate::store::DocumentStore;

/// Holds the published schema and one index per declared field.
#[derive(Clone)]
pub struct IndexManager {
    schema: Arc<Schema>,
    analyzer: Arc<dyn Analyzer>,
    parallel_threshold: usize,
    indexes: HashMap<String, FieldIndex>,
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("fields", &self.schema.field_names())
            .field("analyzer", &self.analyzer.name())
            .field("parallel_threshold", &self.parallel_threshold)
            .finish()
    }
}

impl IndexManager {
    /// Create empty indexes for every field of `schema`.
    pub fn new(schema: Schema, config: &IndexConfig) -> Result<Self> {
        let analyzer = config.text.build_analyzer()?;
        let mut manager = IndexManager {
            schema: Arc::new(schema),
            analyzer,
            parallel_threshold: config.parallel_threshold,
            indexes: HashMap::new(),
        };
        manager.rebuild();
        Ok(manager)
    }

    /// Get the schema these indexes were built for.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Get the analyzer shared by the text indexes.
    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    /// Check that a document conforms to the schema.
    pub fn validate(&self, document: &Document) -> Result<()> {
        self.schema.validate(document)
    }

    /// Drop every index and recreate them empty from the schema.
    pub fn rebuild(&mut self) {
        self.indexes = self
            .schema
            .definitions()
            .map(|def| {
                (
                    def.name.clone(),
                    FieldIndex::for_field(def, &self.analyzer, self.parallel_threshold),
                )
            })
            .collect();
    }

    /// Get the index of a field.
    pub fn field(&self, name: &str) -> Result<&FieldIndex> {
        self.indexes
            .get(name)
            .ok_or_else(|| PilumError::schema(format!("Unknown field '{name}'")))
    }

    fn expect_kind(name: &str, expected: &str, actual: &FieldIndex) -> PilumError {
        PilumError::schema(format!(
            "Field '{name}' is a {} field, not a {expected} field",
            actual.kind_name()
        ))
    }

    /// Get the tag index of a field.
    pub fn tag_index(&self, name: &str) -> Result<&TagIndex> {
        match self.field(name)? {
            FieldIndex::Tag(index) => Ok(index),
            other => Err(Self::expect_kind(name, "tag", other)),
        }
    }

    /// Get the numeric index of a field.
    pub fn numeric_index(&self, name: &str) -> Result<&NumericIndex> {
        match self.field(name)? {
            FieldIndex::Numeric(index) => Ok(index),
            other => Err(Self::expect_kind(name, "numeric", other)),
        }
    }

    /// Get the text index of a field.
    pub fn text_index(&self, name: &str) -> Result<&TextIndex> {
        match self.field(name)? {
            FieldIndex::Text(index) => Ok(index),
            other => Err(Self::expect_kind(name, "text", other)),
        }
    }

    /// Get the vector index of a field.
    pub fn vector_index(&self, name: &str) -> Result<&VectorIndex> {
        match self.field(name)? {
            FieldIndex::Vector(index) => Ok(index),
            other => Err(Self::expect_kind(name, "vector", other)),
        }
    }

    /// Post every schema field of `document` under `id`.
    ///
    /// Vector fields go first since they are the only ones that can reject a
    /// value. If any insert fails, fields already posted are retracted before
    /// the error is returned.
    pub fn index_document(&mut self, id: DocId, document: &Document) -> Result<()> {
        let mut order: Vec<&String> = self.schema.field_names().iter().collect();
        order.sort_by_key(|name| !matches!(self.indexes.get(*name), Some(FieldIndex::Vector(_))));

        let mut posted = Vec::with_capacity(order.len());
        for name in order {
            let result = match (self.indexes.get_mut(name), document.get_field(name)) {
                (Some(index), Some(value)) => index.insert(id, value),
                (None, _) => Err(PilumError::index(format!("No index for field '{name}'"))),
                (_, None) => Err(PilumError::schema(format!(
                    "Missing required field '{name}'"
                ))),
            };

            if let Err(e) = result {
                for done in posted {
                    if let (Some(index), Some(value)) =
                        (self.indexes.get_mut(done), document.get_field(done))
                    {
                        let _ = index.retract(id, value);
                    }
                }
                return Err(e);
            }
            posted.push(name);
        }
        Ok(())
    }

    /// Retract every schema field of `document` from under `id`.
    pub fn deindex_document(&mut self, id: DocId, document: &Document) -> Result<()> {
        for name in self.schema.field_names() {
            if let (Some(index), Some(value)) = (self.indexes.get_mut(name), document.get_field(name))
            {
                index.retract(id, value)?;
            }
        }
        Ok(())
    }

    /// Check that the postings describe exactly the documents in `store`.
    ///
    /// Every live document must be posted under each of its field values, and
    /// no index may hold postings beyond those documents.
    pub fn verify(&self, store: &DocumentStore) -> Result<()> {
        let mut expected: HashMap<&str, usize> = HashMap::new();

        for (id, document) in store.iter() {
            for name in self.schema.field_names() {
                let index = self.field(name)?;
                let value = document.get_field(name).ok_or_else(|| {
                    PilumError::index(format!("Document {id} is missing field '{name}'"))
                })?;
                if !index.holds(id, value)? {
                    return Err(PilumError::index(format!(
                        "Document {id} is not posted in the '{name}' index"
                    )));
                }
                let count = match (index, value) {
                    (FieldIndex::Text(text), _) => value
                        .as_text()
                        .map(|body| text.analyze(body).map(|terms| terms.len()))
                        .transpose()?
                        .unwrap_or(0),
                    _ => 1,
                };
                *expected.entry(name.as_str()).or_default() += count;
            }
        }

        for (name, index) in &self.indexes {
            let want = expected.get(name.as_str()).copied().unwrap_or(0);
            let have = index.posting_count();
            if want != have {
                return Err(PilumError::index(format!(
                    "Field '{name}' holds {have} postings, expected {want}"
                )));
            }
        }
        Ok(())
    }

    /// Statistics for every field index, in schema order.
    pub fn stats(&self) -> Vec<FieldStats> {
        self.schema
            .field_names()
            .iter()
            .filter_map(|name| {
                self.indexes.get(name).map(|index| FieldStats {
                    name: name.clone(),
                    kind: index.kind_name().to_string(),
                    keys: index.key_count(),
                    postings: index.posting_count(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::document::{Number, NumericType};
    use crate::vector::DistanceMetric;

    fn create_test_manager() -> IndexManager {
        let schema = Schema::builder()
            .tag_field("channel")
            .numeric_field("agentId", NumericType::Integer)
            .text_field("transcript")
            .vector_field("embedding", 2, DistanceMetric::Cosine)
            .build()
            .unwrap();
        IndexManager::new(schema, &IndexConfig::default()).unwrap()
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
    fn test_index_and_deindex_document() {
        let mut manager = create_test_manager();
        let doc = call("Phone", 111, "insurance options", vec![1.0, 0.0]);
        manager.index_document(1, &doc).unwrap();

        assert_eq!(manager.tag_index("channel").unwrap().lookup("Phone"), BTreeSet::from([1]));
        assert_eq!(
            manager.numeric_index("agentId").unwrap().point(Number::Integer(111)),
            BTreeSet::from([1])
        );
        assert_eq!(
            manager.text_index("transcript").unwrap().search_term("options").unwrap(),
            BTreeSet::from([1])
        );
        assert!(manager.vector_index("embedding").unwrap().contains(1));

        manager.deindex_document(1, &doc).unwrap();
        assert!(manager.stats().iter().all(|field| field.postings == 0));
    }

    #[test]
    fn test_failed_insert_leaves_no_postings() {
        let mut manager = create_test_manager();
        let doc = call("Phone", 111, "insurance", vec![1.0, 0.0, 0.0]);
        assert!(matches!(
            manager.index_document(1, &doc),
            Err(PilumError::DimensionMismatch { .. })
        ));
        assert!(manager.stats().iter().all(|field| field.postings == 0));
    }

    #[test]
    fn test_wrong_family_lookup() {
        let manager = create_test_manager();
        assert!(matches!(manager.tag_index("agentId"), Err(PilumError::Schema(_))));
        assert!(matches!(manager.vector_index("missing"), Err(PilumError::Schema(_))));
    }

    #[test]
    fn test_verify_detects_orphans() {
        let mut manager = create_test_manager();
        let mut store = DocumentStore::new();
        let doc = call("Chat", 222, "billing", vec![0.0, 1.0]);
        manager.index_document(5, &doc).unwrap();
        store.upsert(5, doc, manager.schema()).unwrap();
        manager.verify(&store).unwrap();

        store.delete(5);
        assert!(matches!(manager.verify(&store), Err(PilumError::Index(_))));
    }

    #[test]
    fn test_rebuild_empties_indexes() {
        let mut manager = create_test_manager();
        manager
            .index_document(1, &call("Phone", 111, "hello", vec![1.0, 0.0]))
            .unwrap();
        manager.rebuild();
        assert_eq!(manager.stats().len(), 4);
        assert!(manager.stats().iter().all(|field| field.keys == 0));
    }
}
