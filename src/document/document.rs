//! Document structure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::field_value::FieldValue;

/// Identifier of a document in the index.
///
/// Identifiers are opaque to the engine apart from their ordering, which is
/// used as the deterministic tie-breaker for every result ordering.
pub type DocId = u64;

/// A document represents a single record to be indexed.
///
/// Fields are kept in a name-ordered map. Fields declared in the schema are
/// indexed; any other fields are stored alongside and returned with results.
/// Documents are only ever replaced as a whole.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Document {
    /// The field values for this document
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Document {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field value to the document, replacing any previous value.
    pub fn add_field<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Get a field value from the document.
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Check if the document has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Remove a field from the document.
    pub fn remove_field(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Get all field names in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(|s| s.as_str()).collect()
    }

    /// Get all field values.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Create a builder for constructing documents.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }
}

/// A builder for constructing documents in a fluent manner.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Create a new document builder.
    pub fn new() -> Self {
        DocumentBuilder {
            document: Document::new(),
        }
    }

    /// Add a tag field to the document.
    pub fn add_tag<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.document.add_field(name, FieldValue::Tag(value.into()));
        self
    }

    /// Add an integer field to the document.
    pub fn add_integer<S: Into<String>>(mut self, name: S, value: i64) -> Self {
        self.document.add_field(name, FieldValue::Integer(value));
        self
    }

    /// Add a float field to the document.
    pub fn add_float<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.document.add_field(name, FieldValue::Float(value));
        self
    }

    /// Add a free-text field to the document.
    pub fn add_text<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.document.add_field(name, FieldValue::Text(value.into()));
        self
    }

    /// Add a vector field to the document.
    pub fn add_vector<S: Into<String>>(mut self, name: S, value: Vec<f32>) -> Self {
        self.document.add_field(name, FieldValue::Vector(value));
        self
    }

    /// Add an arbitrary field value.
    pub fn add_field<S: Into<String>>(mut self, name: S, value: FieldValue) -> Self {
        self.document.add_field(name, value);
        self
    }

    /// Build the document.
    pub fn build(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = Document::builder()
            .add_integer("agentId", 111)
            .add_tag("channel", "Phone")
            .add_text("transcript", "health insurance options")
            .add_vector("embedding", vec![1.0, 0.0])
            .build();

        assert_eq!(doc.len(), 4);
        assert_eq!(doc.get_field("channel").and_then(|v| v.as_tag()), Some("Phone"));
        assert_eq!(
            doc.field_names(),
            vec!["agentId", "channel", "embedding", "transcript"]
        );
    }

    #[test]
    fn test_add_field_replaces() {
        let mut doc = Document::new();
        doc.add_field("channel", FieldValue::Tag("Phone".into()));
        doc.add_field("channel", FieldValue::Tag("Chat".into()));
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.remove_field("channel"), Some(FieldValue::Tag("Chat".into())));
        assert!(doc.is_empty());
    }
}
