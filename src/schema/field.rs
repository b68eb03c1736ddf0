//! Field definitions for schema declaration.

use serde::{Deserialize, Serialize};

use crate::document::NumericType;
use crate::vector::DistanceMetric;

/// How a field is indexed, with the parameters each index kind needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    /// Exact-match categorical field.
    Tag,
    /// Ordered numeric field supporting point and range queries.
    Numeric {
        #[serde(default)]
        numeric_type: NumericType,
    },
    /// Free-text field indexed as an inverted term index.
    Text,
    /// Fixed-dimension embedding ranked by `distance`.
    Vector {
        dimension: usize,
        #[serde(default)]
        distance: DistanceMetric,
    },
}

impl FieldKind {
    /// Get the name of this field kind.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Tag => "tag",
            FieldKind::Numeric { .. } => "numeric",
            FieldKind::Text => "text",
            FieldKind::Vector { .. } => "vector",
        }
    }

    /// Whether results can be ordered by this field.
    pub fn is_sortable(&self) -> bool {
        !matches!(self, FieldKind::Vector { .. })
    }
}

/// A named field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name as it appears in documents.
    pub name: String,
    /// Index kind and parameters.
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDefinition {
    /// Create a new field definition.
    pub fn new<S: Into<String>>(name: S, kind: FieldKind) -> Self {
        FieldDefinition {
            name: name.into(),
            kind,
        }
    }
}
