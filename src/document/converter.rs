//! Document converter for loading documents from JSON Lines files.
//!
//! Each line holds one JSON object. The id is read from a dedicated key
//! (`"id"` by default) and every other key becomes a field:
//!
//! ```jsonl
//! {"id": 1, "channel": "Phone", "agentId": 111, "transcript": "insurance options", "embedding": [1.0, 0.0]}
//! {"id": 2, "channel": "Chat", "agentId": 222, "transcript": "billing", "embedding": [0.0, 1.0]}
//! ```
//!
//! Keys declared in the schema are converted to the declared kind. Other keys
//! are stored with an inferred kind: strings become text, numbers become
//! integers or floats, numeric arrays become vectors and booleans become tags.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::document::document::{DocId, Document};
use crate::document::field_value::{FieldValue, NumericType};
use crate::error::{PilumError, Result};
use crate::schema::{FieldKind, Schema};

/// Default key holding the document id.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Converts JSON objects into schema-typed documents.
#[derive(Debug, Clone)]
pub struct JsonlDocumentConverter {
    schema: Arc<Schema>,
    id_field: String,
}

impl JsonlDocumentConverter {
    /// Create a converter for `schema` reading ids from the `"id"` key.
    pub fn new(schema: Arc<Schema>) -> Self {
        JsonlDocumentConverter {
            schema,
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    /// Read ids from a different key.
    pub fn with_id_field<S: Into<String>>(mut self, id_field: S) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Open a JSONL file and iterate over its documents.
    pub fn convert<P: AsRef<Path>>(&self, path: P) -> Result<JsonlDocumentIterator> {
        let file = File::open(path.as_ref())?;
        Ok(JsonlDocumentIterator {
            reader: BufReader::new(file),
            converter: self.clone(),
            line_number: 0,
        })
    }

    /// Parse a single JSON line into an id and a document.
    pub fn parse_line(&self, line: &str) -> Result<(DocId, Document)> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| PilumError::parse(format!("Failed to parse JSON: {e}")))?;
        match value {
            Value::Object(map) => self.convert_object(map),
            other => Err(PilumError::parse(format!(
                "Expected a JSON object, got {other}"
            ))),
        }
    }

    /// Convert a JSON object into an id and a document.
    pub fn convert_object(&self, mut map: Map<String, Value>) -> Result<(DocId, Document)> {
        let id = match map.remove(&self.id_field) {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse::<DocId>().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            PilumError::parse(format!(
                "Missing or invalid document id in key '{}'",
                self.id_field
            ))
        })?;

        Ok((id, convert_fields(map, &self.schema)?))
    }
}

/// Convert a JSON object into a document typed by `schema`.
///
/// No key is treated as an id; use [`JsonlDocumentConverter`] when the object
/// carries its own id.
pub fn from_json(value: Value, schema: &Schema) -> Result<Document> {
    match value {
        Value::Object(map) => convert_fields(map, schema),
        other => Err(PilumError::parse(format!(
            "Expected a JSON object, got {other}"
        ))),
    }
}

/// Render a document as a plain JSON object, the inverse of [`from_json`].
pub fn to_json(document: &Document) -> Value {
    let map = document
        .fields()
        .iter()
        .map(|(name, value)| {
            let json = match value {
                FieldValue::Tag(s) | FieldValue::Text(s) => Value::String(s.clone()),
                FieldValue::Integer(i) => Value::from(*i),
                FieldValue::Float(f) => Value::from(*f),
                FieldValue::Vector(v) => Value::Array(v.iter().map(|x| Value::from(*x)).collect()),
            };
            (name.clone(), json)
        })
        .collect();
    Value::Object(map)
}

fn convert_fields(map: Map<String, Value>, schema: &Schema) -> Result<Document> {
    let mut doc = Document::new();
    for (key, val) in map {
        let field_value = match schema.get_field(&key) {
            Some(def) => convert_declared(&key, def.kind, &val)?,
            None => match infer_field_value(&val) {
                Some(value) => value,
                None => continue,
            },
        };
        doc.add_field(key, field_value);
    }
    Ok(doc)
}

fn type_error(field: &str, expected: &str, value: &Value) -> PilumError {
    PilumError::schema(format!("Field '{field}' expects {expected}, got {value}"))
}

fn convert_declared(field: &str, kind: FieldKind, value: &Value) -> Result<FieldValue> {
    match kind {
        FieldKind::Tag => match value {
            Value::String(s) => Ok(FieldValue::Tag(s.clone())),
            Value::Bool(b) => Ok(FieldValue::Tag(b.to_string())),
            Value::Number(n) => Ok(FieldValue::Tag(n.to_string())),
            other => Err(type_error(field, "tag", other)),
        },
        FieldKind::Text => match value {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            other => Err(type_error(field, "text", other)),
        },
        FieldKind::Numeric {
            numeric_type: NumericType::Integer,
        } => value
            .as_i64()
            .map(FieldValue::Integer)
            .ok_or_else(|| type_error(field, "integer", value)),
        FieldKind::Numeric {
            numeric_type: NumericType::Float,
        } => value
            .as_f64()
            .map(FieldValue::Float)
            .ok_or_else(|| type_error(field, "float", value)),
        FieldKind::Vector { .. } => {
            parse_vector(value).ok_or_else(|| type_error(field, "vector", value))
        }
    }
}

fn parse_vector(value: &Value) -> Option<FieldValue> {
    let items = value.as_array()?;
    items
        .iter()
        .map(|item| item.as_f64().map(|f| f as f32))
        .collect::<Option<Vec<f32>>>()
        .map(FieldValue::Vector)
}

/// Infer a field value for a key the schema does not declare.
fn infer_field_value(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(FieldValue::Tag(b.to_string())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(FieldValue::Integer(i))
            } else {
                n.as_f64().map(FieldValue::Float)
            }
        }
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Array(items) if !items.is_empty() => {
            parse_vector(value).or_else(|| Some(FieldValue::Text(value.to_string())))
        }
        other => Some(FieldValue::Text(other.to_string())),
    }
}

/// Iterator over JSONL documents.
pub struct JsonlDocumentIterator {
    reader: BufReader<File>,
    converter: JsonlDocumentConverter,
    line_number: usize,
}

impl Iterator for JsonlDocumentIterator {
    type Item = Result<(DocId, Document)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            self.line_number += 1;
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let line_number = self.line_number;
                    return Some(self.converter.parse_line(line).map_err(|e| {
                        PilumError::parse(format!("Line {line_number}: {e}"))
                    }));
                }
                Err(e) => return Some(Err(PilumError::from(e))),
            }
        }
    }
}
