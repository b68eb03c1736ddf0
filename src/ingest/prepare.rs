//! Turning raw recordings into indexable documents.
//!
//! Transcription and embedding are external services. They are reached only
//! through the [`Transcriber`] and [`Embedder`] traits, and only before a
//! document enters the index.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use pilum::document::Document;
//! use pilum::error::Result;
//! use pilum::ingest::{DocumentPreparer, Embedder, RawRecord, Transcriber};
//!
//! struct Utf8Transcriber;
//!
//! #[async_trait]
//! impl Transcriber for Utf8Transcriber {
//!     async fn transcribe(&self, audio: &[u8]) -> Result<String> {
//!         Ok(String::from_utf8_lossy(audio).into_owned())
//!     }
//! }
//!
//! struct LengthEmbedder;
//!
//! #[async_trait]
//! impl Embedder for LengthEmbedder {
//!     async fn embed(&self, text: &str) -> Result<Vec<f32>> {
//!         Ok(vec![text.len() as f32, 1.0])
//!     }
//!
//!     fn dimension(&self) -> usize {
//!         2
//!     }
//! }
//!
//! let preparer = DocumentPreparer::new(Arc::new(Utf8Transcriber), Arc::new(LengthEmbedder));
//! let record = RawRecord::new(1, b"hello".to_vec(), Document::new());
//! let (id, doc) = futures::executor::block_on(preparer.prepare(record)).unwrap();
//! assert_eq!(id, 1);
//! assert_eq!(doc.get_field("embedding").and_then(|v| v.as_vector()), Some(&[5.0, 1.0][..]));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::document::{DocId, Document, FieldValue};
use crate::error::{PilumError, Result};
use crate::schema::{FieldKind, Schema};

/// Default field receiving the transcript.
pub const DEFAULT_TEXT_FIELD: &str = "transcript";

/// Default field receiving the embedding.
pub const DEFAULT_VECTOR_FIELD: &str = "embedding";

/// Converts recorded audio into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe raw audio bytes.
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Converts text into a fixed-dimension embedding.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of every vector this embedder produces.
    fn dimension(&self) -> usize;
}

/// A recording awaiting preparation, with the fields known up front.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: DocId,
    pub audio: Vec<u8>,
    pub metadata: Document,
}

impl RawRecord {
    pub fn new(id: DocId, audio: Vec<u8>, metadata: Document) -> Self {
        RawRecord {
            id,
            audio,
            metadata,
        }
    }
}

/// Builds complete documents from raw records.
#[derive(Clone)]
pub struct DocumentPreparer {
    transcriber: Arc<dyn Transcriber>,
    embedder: Arc<dyn Embedder>,
    text_field: String,
    vector_field: String,
}

impl std::fmt::Debug for DocumentPreparer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentPreparer")
            .field("text_field", &self.text_field)
            .field("vector_field", &self.vector_field)
            .field("dimension", &self.embedder.dimension())
            .finish()
    }
}

impl DocumentPreparer {
    /// Create a preparer writing to the `transcript` and `embedding` fields.
    pub fn new(transcriber: Arc<dyn Transcriber>, embedder: Arc<dyn Embedder>) -> Self {
        DocumentPreparer {
            transcriber,
            embedder,
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            vector_field: DEFAULT_VECTOR_FIELD.to_string(),
        }
    }

    /// Write the transcript and embedding to different fields.
    pub fn with_fields<S: Into<String>, T: Into<String>>(
        mut self,
        text_field: S,
        vector_field: T,
    ) -> Self {
        self.text_field = text_field.into();
        self.vector_field = vector_field.into();
        self
    }

    /// Check that `schema` can hold what this preparer produces.
    ///
    /// The text field must be a text field and the vector field a vector field
    /// whose dimension equals the embedder's.
    pub fn check_schema(&self, schema: &Schema) -> Result<()> {
        match schema.require_field(&self.text_field)? {
            FieldKind::Text => {}
            other => {
                return Err(PilumError::schema(format!(
                    "Field '{}' is a {} field, not a text field",
                    self.text_field,
                    other.name()
                )));
            }
        }
        match schema.require_field(&self.vector_field)? {
            FieldKind::Vector { dimension, .. } if dimension == self.embedder.dimension() => Ok(()),
            FieldKind::Vector { dimension, .. } => Err(PilumError::dimension_mismatch(
                self.vector_field.clone(),
                dimension,
                self.embedder.dimension(),
            )),
            other => Err(PilumError::schema(format!(
                "Field '{}' is a {} field, not a vector field",
                self.vector_field,
                other.name()
            ))),
        }
    }

    /// Transcribe, embed and assemble one record.
    pub async fn prepare(&self, record: RawRecord) -> Result<(DocId, Document)> {
        let RawRecord {
            id,
            audio,
            mut metadata,
        } = record;

        let transcript = self.transcriber.transcribe(&audio).await?;
        let embedding = self.embedder.embed(&transcript).await?;
        if embedding.len() != self.embedder.dimension() {
            return Err(PilumError::dimension_mismatch(
                self.vector_field.clone(),
                self.embedder.dimension(),
                embedding.len(),
            ));
        }

        metadata.add_field(self.text_field.clone(), FieldValue::Text(transcript));
        metadata.add_field(self.vector_field.clone(), FieldValue::Vector(embedding));
        Ok((id, metadata))
    }

    /// Prepare several records concurrently. Fails on the first error.
    pub async fn prepare_batch(&self, records: Vec<RawRecord>) -> Result<Vec<(DocId, Document)>> {
        try_join_all(records.into_iter().map(|record| self.prepare(record))).await
    }
}
