//! Document ingestion.
//!
//! [`IngestionPipeline`] applies upserts and deletes to the document store and
//! every field index as one unit. [`DocumentPreparer`] is the step that runs
//! before it: turning raw recordings into complete documents through the
//! [`Transcriber`] and [`Embedder`] collaborators.

pub mod pipeline;
pub mod prepare;

pub use pipeline::IngestionPipeline;
pub use prepare::{DocumentPreparer, Embedder, RawRecord, Transcriber};
