//! Distance metrics for vector similarity calculation.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PilumError, Result};

/// Distance metrics for vector ranking. Lower distance means more similar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine distance (1 - cosine similarity)
    #[default]
    Cosine,
    /// Euclidean (L2) distance
    Euclidean,
    /// Inner product distance (1 - dot product)
    DotProduct,
}

impl DistanceMetric {
    /// Calculate the distance between two vectors using this metric.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(PilumError::invalid_argument(format!(
                "Vector dimensions must match for distance calculation ({} != {})",
                a.len(),
                b.len()
            )));
        }

        // Accumulate in f64 so large or tiny finite components neither
        // overflow nor flush to zero before the final narrowing.
        let pairs = a.iter().zip(b.iter()).map(|(&x, &y)| (f64::from(x), f64::from(y)));
        let result = match self {
            DistanceMetric::Cosine => {
                let (dot_product, norm_a, norm_b) = pairs.fold(
                    (0.0f64, 0.0f64, 0.0f64),
                    |(dot, na, nb), (x, y)| (dot + x * y, na + x * x, nb + y * y),
                );
                let denominator = norm_a.sqrt() * norm_b.sqrt();

                if denominator == 0.0 {
                    1.0 // Maximum distance for zero vectors
                } else {
                    (1.0 - dot_product / denominator) as f32
                }
            }
            DistanceMetric::Euclidean => {
                pairs.map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt() as f32
            }
            DistanceMetric::DotProduct => {
                (1.0 - pairs.map(|(x, y)| x * y).sum::<f64>()) as f32
            }
        };

        Ok(result)
    }

    /// Get the name of this distance metric.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dot_product",
        }
    }

    /// Parse a distance metric from a string.
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "dot_product" | "dot" | "ip" => Ok(DistanceMetric::DotProduct),
            _ => Err(PilumError::parse(format!("Unknown distance metric: {s}"))),
        }
    }

    /// Calculate distances between a query vector and many vectors.
    ///
    /// Batches at or above `parallel_threshold` are spread across the rayon pool.
    pub fn batch_distance(
        &self,
        query: &[f32],
        vectors: &[&[f32]],
        parallel_threshold: usize,
    ) -> Result<Vec<f32>> {
        if vectors.is_empty() {
            return Ok(Vec::new());
        }

        if vectors.len() < parallel_threshold {
            return vectors
                .iter()
                .map(|v| self.distance(query, v))
                .collect::<Result<Vec<_>>>();
        }

        vectors
            .par_iter()
            .map(|v| self.distance(query, v))
            .collect::<Result<Vec<_>>>()
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
