//! Secondary indexes over document fields.
//!
//! Each schema field gets exactly one index of the family matching its kind:
//! [`TagIndex`] for exact-match tags, [`NumericIndex`] for ordered numbers,
//! [`TextIndex`] for analyzed full text and [`VectorIndex`] for exact
//! nearest-neighbour ranking. [`IndexManager`] owns the set of indexes for the
//! current schema and keeps their postings in step with the document store.

pub mod manager;
pub mod numeric;
pub mod tag;
pub mod text;
pub mod vector;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::document::{DocId, FieldValue};
use crate::error::{PilumError, Result};
use crate::schema::{FieldDefinition, FieldKind};

pub use manager::IndexManager;
pub use numeric::NumericIndex;
pub use tag::TagIndex;
pub use text::TextIndex;
pub use vector::VectorIndex;

/// The index backing a single schema field.
#[derive(Debug, Clone)]
pub enum FieldIndex {
    Tag(TagIndex),
    Numeric(NumericIndex),
    Text(TextIndex),
    Vector(VectorIndex),
}

impl FieldIndex {
    /// Create an empty index suited to the field definition.
    pub fn for_field(
        definition: &FieldDefinition,
        analyzer: &Arc<dyn Analyzer>,
        parallel_threshold: usize,
    ) -> Self {
        match definition.kind {
            FieldKind::Tag => FieldIndex::Tag(TagIndex::new()),
            FieldKind::Numeric { numeric_type } => {
                FieldIndex::Numeric(NumericIndex::new(numeric_type))
            }
            FieldKind::Text => FieldIndex::Text(TextIndex::new(Arc::clone(analyzer))),
            FieldKind::Vector {
                dimension,
                distance,
            } => FieldIndex::Vector(VectorIndex::new(
                definition.name.clone(),
                dimension,
                distance,
                parallel_threshold,
            )),
        }
    }

    /// Name of the index family.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldIndex::Tag(_) => "tag",
            FieldIndex::Numeric(_) => "numeric",
            FieldIndex::Text(_) => "text",
            FieldIndex::Vector(_) => "vector",
        }
    }

    /// Post `id` under `value`.
    pub fn insert(&mut self, id: DocId, value: &FieldValue) -> Result<()> {
        match (self, value) {
            (FieldIndex::Tag(index), FieldValue::Tag(tag)) => index.add(tag, id),
            (FieldIndex::Numeric(index), FieldValue::Integer(_) | FieldValue::Float(_)) => {
                if let Some(number) = value.as_number() {
                    index.add(number, id);
                }
            }
            (FieldIndex::Text(index), FieldValue::Text(text)) => index.index(text, id)?,
            (FieldIndex::Vector(index), FieldValue::Vector(vector)) => index.add(id, vector)?,
            (index, value) => return Err(mismatch(index, value)),
        }
        Ok(())
    }

    /// Retract the posting of `id` under `value`.
    pub fn retract(&mut self, id: DocId, value: &FieldValue) -> Result<()> {
        match (self, value) {
            (FieldIndex::Tag(index), FieldValue::Tag(tag)) => {
                index.remove(tag, id);
            }
            (FieldIndex::Numeric(index), FieldValue::Integer(_) | FieldValue::Float(_)) => {
                if let Some(number) = value.as_number() {
                    index.remove(number, id);
                }
            }
            (FieldIndex::Text(index), FieldValue::Text(text)) => index.deindex(text, id)?,
            (FieldIndex::Vector(index), FieldValue::Vector(_)) => {
                index.remove(id);
            }
            (index, value) => return Err(mismatch(index, value)),
        }
        Ok(())
    }

    /// Check whether `id` is fully posted under `value`.
    pub fn holds(&self, id: DocId, value: &FieldValue) -> Result<bool> {
        Ok(match (self, value) {
            (FieldIndex::Tag(index), FieldValue::Tag(tag)) => index.contains(tag, id),
            (FieldIndex::Numeric(index), FieldValue::Integer(_) | FieldValue::Float(_)) => value
                .as_number()
                .is_some_and(|number| index.contains(number, id)),
            (FieldIndex::Text(index), FieldValue::Text(text)) => index
                .analyze(text)?
                .iter()
                .all(|term| index.contains(term, id)),
            (FieldIndex::Vector(index), FieldValue::Vector(vector)) => {
                index.get(id) == Some(vector.as_slice())
            }
            (index, value) => return Err(mismatch(index, value)),
        })
    }

    /// Number of distinct keys (tags, values, terms or vectors).
    pub fn key_count(&self) -> usize {
        match self {
            FieldIndex::Tag(index) => index.key_count(),
            FieldIndex::Numeric(index) => index.key_count(),
            FieldIndex::Text(index) => index.key_count(),
            FieldIndex::Vector(index) => index.len(),
        }
    }

    /// Total number of postings.
    pub fn posting_count(&self) -> usize {
        match self {
            FieldIndex::Tag(index) => index.posting_count(),
            FieldIndex::Numeric(index) => index.posting_count(),
            FieldIndex::Text(index) => index.posting_count(),
            FieldIndex::Vector(index) => index.len(),
        }
    }

    /// Drop every posting.
    pub fn clear(&mut self) {
        match self {
            FieldIndex::Tag(index) => index.clear(),
            FieldIndex::Numeric(index) => index.clear(),
            FieldIndex::Text(index) => index.clear(),
            FieldIndex::Vector(index) => index.clear(),
        }
    }
}

fn mismatch(index: &FieldIndex, value: &FieldValue) -> PilumError {
    PilumError::index(format!(
        "{} index cannot hold a {} value",
        index.kind_name(),
        value.type_name()
    ))
}

/// Per-field index statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStats {
    /// Field name.
    pub name: String,
    /// Index family.
    pub kind: String,
    /// Distinct keys held by the index.
    pub keys: usize,
    /// Total postings held by the index.
    pub postings: usize,
}
