//! Vector primitives shared by the vector index and the query executor.

pub mod distance;

pub use distance::DistanceMetric;

/// Check that every component of a vector is finite.
pub fn is_finite_vector(data: &[f32]) -> bool {
    data.iter().all(|x| x.is_finite())
}
