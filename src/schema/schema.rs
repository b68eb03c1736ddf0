//! Schema management for document structure definition.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::{Document, FieldValue, NumericType};
use crate::error::{PilumError, Result};
use crate::schema::field::{FieldDefinition, FieldKind};
use crate::vector::{DistanceMetric, is_finite_vector};

/// A schema declares which fields are indexed and how.
///
/// Field order is the order of declaration. A published schema is never
/// re-typed in place; replacing it means building a new `Schema`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaFile", into = "SchemaFile")]
pub struct Schema {
    /// Map of field names to their definitions
    fields: HashMap<String, FieldDefinition>,
    /// Ordered list of field names (for consistent ordering)
    field_names: Vec<String>,
}

/// On-disk / wire shape of a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaFile {
    fields: Vec<FieldDefinition>,
}

impl TryFrom<SchemaFile> for Schema {
    type Error = PilumError;

    fn try_from(file: SchemaFile) -> Result<Self> {
        let mut schema = Schema::new();
        for def in file.fields {
            schema.add_field(def.name, def.kind)?;
        }
        Ok(schema)
    }
}

impl From<Schema> for SchemaFile {
    fn from(schema: Schema) -> Self {
        SchemaFile {
            fields: schema.definitions().cloned().collect(),
        }
    }
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Schema::default()
    }

    /// Create a builder for constructing schemas.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Load a schema from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Add a field to the schema.
    pub fn add_field<S: Into<String>>(&mut self, name: S, kind: FieldKind) -> Result<()> {
        let name = name.into();

        if name.is_empty() {
            return Err(PilumError::schema("Field name cannot be empty"));
        }
        if self.fields.contains_key(&name) {
            return Err(PilumError::schema(format!("Field '{name}' already exists")));
        }
        if let FieldKind::Vector { dimension: 0, .. } = kind {
            return Err(PilumError::schema(format!(
                "Vector field '{name}' must declare a dimension greater than zero"
            )));
        }

        self.fields
            .insert(name.clone(), FieldDefinition::new(name.clone(), kind));
        self.field_names.push(name);
        Ok(())
    }

    /// Get a field definition by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// Get a field's kind, failing with a schema error for undeclared names.
    pub fn require_field(&self, name: &str) -> Result<FieldKind> {
        self.fields
            .get(name)
            .map(|def| def.kind)
            .ok_or_else(|| PilumError::schema(format!("Unknown field '{name}'")))
    }

    /// Check if a field exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Get all field names in the order they were added.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Iterate over field definitions in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.field_names
            .iter()
            .filter_map(move |name| self.fields.get(name))
    }

    /// Get the number of declared fields.
    pub fn len(&self) -> usize {
        self.field_names.len()
    }

    /// Check if the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.field_names.is_empty()
    }

    /// Check that a document conforms to this schema.
    ///
    /// Every declared field must be present with a value of the declared kind.
    /// Vector fields must match the declared dimension exactly, which is
    /// reported as [`PilumError::DimensionMismatch`] rather than a schema error.
    /// Fields the schema does not declare are ignored.
    pub fn validate(&self, document: &Document) -> Result<()> {
        for def in self.definitions() {
            let value = document.get_field(&def.name).ok_or_else(|| {
                PilumError::schema(format!("Missing required field '{}'", def.name))
            })?;
            validate_value(&def.name, def.kind, value)?;
        }
        Ok(())
    }
}

fn validate_value(name: &str, kind: FieldKind, value: &FieldValue) -> Result<()> {
    match (kind, value) {
        (FieldKind::Tag, FieldValue::Tag(_)) => Ok(()),
        (FieldKind::Text, FieldValue::Text(_)) => Ok(()),
        (
            FieldKind::Numeric {
                numeric_type: NumericType::Integer,
            },
            FieldValue::Integer(_),
        ) => Ok(()),
        (
            FieldKind::Numeric {
                numeric_type: NumericType::Float,
            },
            FieldValue::Integer(_),
        ) => Ok(()),
        (
            FieldKind::Numeric {
                numeric_type: NumericType::Float,
            },
            FieldValue::Float(f),
        ) => {
            if f.is_finite() {
                Ok(())
            } else {
                Err(PilumError::schema(format!(
                    "Field '{name}' holds a non-finite number"
                )))
            }
        }
        (FieldKind::Vector { dimension, .. }, FieldValue::Vector(data)) => {
            if data.len() != dimension {
                return Err(PilumError::dimension_mismatch(name, dimension, data.len()));
            }
            if !is_finite_vector(data) {
                return Err(PilumError::schema(format!(
                    "Field '{name}' holds a vector with non-finite components"
                )));
            }
            Ok(())
        }
        (kind, value) => Err(PilumError::schema(format!(
            "Field '{name}' expects {}, got {}",
            expected_type_name(kind),
            value.type_name()
        ))),
    }
}

fn expected_type_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Numeric { numeric_type } => numeric_type.name(),
        other => other.name(),
    }
}

/// A builder for constructing schemas in a fluent manner.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldDefinition>,
}

impl SchemaBuilder {
    /// Declare a tag field.
    pub fn tag_field<S: Into<String>>(mut self, name: S) -> Self {
        self.fields.push(FieldDefinition::new(name, FieldKind::Tag));
        self
    }

    /// Declare a numeric field.
    pub fn numeric_field<S: Into<String>>(mut self, name: S, numeric_type: NumericType) -> Self {
        self.fields
            .push(FieldDefinition::new(name, FieldKind::Numeric { numeric_type }));
        self
    }

    /// Declare a free-text field.
    pub fn text_field<S: Into<String>>(mut self, name: S) -> Self {
        self.fields.push(FieldDefinition::new(name, FieldKind::Text));
        self
    }

    /// Declare a vector field.
    pub fn vector_field<S: Into<String>>(
        mut self,
        name: S,
        dimension: usize,
        distance: DistanceMetric,
    ) -> Self {
        self.fields.push(FieldDefinition::new(
            name,
            FieldKind::Vector {
                dimension,
                distance,
            },
        ));
        self
    }

    /// Build the schema, rejecting duplicate or malformed declarations.
    pub fn build(self) -> Result<Schema> {
        Schema::try_from(SchemaFile {
            fields: self.fields,
        })
    }
}
