//! Error types for the Pilum library.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! the single [`PilumError`] enum. The variants map onto the failure kinds a
//! caller has to distinguish:
//!
//! - [`PilumError::Schema`] - unknown field, type mismatch, missing field
//! - [`PilumError::DimensionMismatch`] - vector length differs from the declared dimension
//! - [`PilumError::Parse`] - malformed query literal
//! - [`PilumError::Index`] - internal postings inconsistency
//!
//! # Examples
//!
//! ```
//! use pilum::error::{PilumError, Result};
//!
//! fn lookup(field: &str) -> Result<()> {
//!     Err(PilumError::schema(format!("unknown field '{field}'")))
//! }
//!
//! match lookup("agentId") {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Pilum operations.
#[derive(Error, Debug)]
pub enum PilumError {
    /// I/O errors (config and document files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Schema-related errors (unknown field, type mismatch, missing field)
    #[error("Schema error: {0}")]
    Schema(String),

    /// A vector's length differs from the dimension declared for its field
    #[error("Dimension mismatch on field '{field}': expected {expected}, got {actual}")]
    DimensionMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// Malformed query literal
    #[error("Parse error: {0}")]
    Parse(String),

    /// Internal index inconsistency
    #[error("Index error: {0}")]
    Index(String),

    /// Transcription collaborator failure
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Embedding collaborator failure
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Invalid argument or configuration
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with PilumError.
pub type Result<T> = std::result::Result<T, PilumError>;

impl PilumError {
    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        PilumError::Schema(msg.into())
    }

    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch<S: Into<String>>(field: S, expected: usize, actual: usize) -> Self {
        PilumError::DimensionMismatch {
            field: field.into(),
            expected,
            actual,
        }
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        PilumError::Parse(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        PilumError::Index(msg.into())
    }

    /// Create a new transcription error.
    pub fn transcription<S: Into<String>>(msg: S) -> Self {
        PilumError::Transcription(msg.into())
    }

    /// Create a new embedding error.
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        PilumError::Embedding(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        PilumError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        PilumError::InvalidArgument(format!("Invalid configuration: {}", msg.into()))
    }

    /// Whether this error rejects the input rather than signalling a broken index.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PilumError::Index(_) | PilumError::Io(_))
    }
}
