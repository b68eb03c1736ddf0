//! Query results.

use serde::Serialize;

use crate::document::{DocId, Document};

/// One matching document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub id: DocId,
    /// Distance to the query vector; present only for KNN queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    pub document: Document,
}

/// An ordered page of hits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedResults {
    pub hits: Vec<Hit>,
    /// Number of matches before offset and limit were applied.
    pub total: usize,
}

impl RankedResults {
    /// Ids of the hits, in rank order.
    pub fn ids(&self) -> Vec<DocId> {
        self.hits.iter().map(|hit| hit.id).collect()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hit> {
        self.hits.iter()
    }
}
