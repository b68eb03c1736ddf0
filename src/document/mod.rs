//! Document model.
//!
//! A [`Document`] is an ordered mapping from field name to a typed
//! [`FieldValue`]. Documents are keyed in the index by a [`DocId`].
//!
//! # Examples
//!
//! ```
//! use pilum::document::Document;
//!
//! let doc = Document::builder()
//!     .add_integer("agentId", 111)
//!     .add_tag("channel", "Phone")
//!     .build();
//! assert_eq!(doc.len(), 2);
//! ```

pub mod converter;
#[allow(clippy::module_inception)]
pub mod document;
pub mod field_value;

// Re-export commonly used types
pub use document::{DocId, Document, DocumentBuilder};
pub use field_value::{FieldValue, Number, NumericType};
