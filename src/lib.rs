//! # Pilum
//!
//! An in-memory hybrid document index for Rust.
//!
//! ## Features
//!
//! - Exact-match tag, ordered numeric and analyzed full-text field indexes
//! - Exact brute-force nearest-neighbour ranking over fixed-dimension vectors
//! - One composable query: intersect field filters, then rank by distance
//! - Atomic multi-index upserts and deletes behind a reader-writer lock
//! - Schema-aware query string parser
//! - Pluggable transcription and embedding collaborators for ingestion

pub mod analysis;
pub mod cli;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod ingest;
pub mod query;
pub mod schema;
pub mod store;
pub mod vector;

pub mod prelude {
    pub use crate::config::IndexConfig;
    pub use crate::document::{DocId, Document, FieldValue, Number, NumericType};
    pub use crate::engine::{HybridIndex, IndexStats, RebuildReport};
    pub use crate::error::{PilumError, Result};
    pub use crate::query::{Predicate, QueryExpr, RankedResults, SortBy};
    pub use crate::schema::Schema;
    pub use crate::vector::DistanceMetric;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
