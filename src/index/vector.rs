//! Exact nearest-neighbour index over fixed-dimension vector fields.
//!
//! Vectors live in one contiguous buffer, `dimension` floats per slot. A slot
//! table maps slots back to document ids. Deletion moves the last slot into
//! the freed one so the buffer stays dense.

use std::collections::BTreeSet;

use ahash::AHashMap;

use crate::document::DocId;
use crate::error::{PilumError, Result};
use crate::vector::DistanceMetric;

/// Brute-force vector index with exact k-nearest-neighbour ranking.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    field: String,
    dimension: usize,
    metric: DistanceMetric,
    parallel_threshold: usize,
    data: Vec<f32>,
    slot_ids: Vec<DocId>,
    slots: AHashMap<DocId, usize>,
}

impl VectorIndex {
    /// Create a new empty vector index for `field`.
    pub fn new<S: Into<String>>(
        field: S,
        dimension: usize,
        metric: DistanceMetric,
        parallel_threshold: usize,
    ) -> Self {
        VectorIndex {
            field: field.into(),
            dimension,
            metric,
            parallel_threshold: parallel_threshold.max(1),
            data: Vec::new(),
            slot_ids: Vec::new(),
            slots: AHashMap::new(),
        }
    }

    /// Get the declared dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the distance metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(PilumError::dimension_mismatch(
                self.field.clone(),
                self.dimension,
                vector.len(),
            ));
        }
        Ok(())
    }

    /// Store the vector for `id`, replacing any previous one in place.
    pub fn add(&mut self, id: DocId, vector: &[f32]) -> Result<()> {
        self.check_dimension(vector)?;

        if let Some(&slot) = self.slots.get(&id) {
            let start = slot * self.dimension;
            self.data[start..start + self.dimension].copy_from_slice(vector);
            return Ok(());
        }

        self.slots.insert(id, self.slot_ids.len());
        self.slot_ids.push(id);
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Remove the vector for `id`. Returns whether it was present.
    pub fn remove(&mut self, id: DocId) -> bool {
        let Some(slot) = self.slots.remove(&id) else {
            return false;
        };

        let last = self.slot_ids.len() - 1;
        if slot != last {
            let moved = self.slot_ids[last];
            let (head, tail) = self.data.split_at_mut(last * self.dimension);
            head[slot * self.dimension..(slot + 1) * self.dimension]
                .copy_from_slice(&tail[..self.dimension]);
            self.slot_ids[slot] = moved;
            self.slots.insert(moved, slot);
        }

        self.slot_ids.truncate(last);
        self.data.truncate(last * self.dimension);
        true
    }

    /// Get the stored vector for `id`.
    pub fn get(&self, id: DocId) -> Option<&[f32]> {
        let slot = *self.slots.get(&id)?;
        let start = slot * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// Check whether a vector is stored for `id`.
    pub fn contains(&self, id: DocId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.slot_ids.len()
    }

    /// Check whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.slot_ids.is_empty()
    }

    /// Rank stored vectors by distance to `query` and return the closest `k`.
    ///
    /// When `candidates` is given only those documents are ranked; ids with no
    /// stored vector are skipped. Ties on distance are broken by ascending id,
    /// so the ranking is deterministic.
    pub fn knn(
        &self,
        query: &[f32],
        k: usize,
        candidates: Option<&BTreeSet<DocId>>,
    ) -> Result<Vec<(DocId, f32)>> {
        self.check_dimension(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let (ids, vectors): (Vec<DocId>, Vec<&[f32]>) = match candidates {
            Some(candidates) => candidates
                .iter()
                .filter_map(|&id| self.get(id).map(|vector| (id, vector)))
                .unzip(),
            None => self
                .slot_ids
                .iter()
                .zip(self.data.chunks_exact(self.dimension))
                .map(|(&id, vector)| (id, vector))
                .unzip(),
        };

        let distances = self
            .metric
            .batch_distance(query, &vectors, self.parallel_threshold)?;

        let mut ranked: Vec<(DocId, f32)> = ids.into_iter().zip(distances).collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(k);
        Ok(ranked)
    }

    /// Drop every stored vector.
    pub fn clear(&mut self) {
        self.data.clear();
        self.slot_ids.clear();
        self.slots.clear();
    }
}
