//! Schema module for Pilum.
//!
//! A [`Schema`] declares, per field name, which index kind covers it and the
//! parameters of that index (numeric type, vector dimension and metric).

pub mod field;
#[allow(clippy::module_inception)]
pub mod schema;

// Re-export commonly used types
pub use field::{FieldDefinition, FieldKind};
pub use schema::{Schema, SchemaBuilder};
