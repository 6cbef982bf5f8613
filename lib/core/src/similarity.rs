//! Pairwise comparison utilities shared by every clustering pass
//!
//! - [`cosine_alignment`] - rescaled cosine similarity in [0, 1]
//! - [`hamming_distance`] - differing bits between two perceptual hashes
//! - [`haversine_km`] - great-circle distance between two coordinates

use crate::error::{Error, Result};
use crate::hash::PerceptualHash;
use crate::vector::{cosine, Vector};

pub use crate::geo::haversine_km;

/// Cosine similarity of `a` and `b` rescaled from [-1, 1] to [0, 1].
/// Returns 0.0 if either side has zero norm.
pub fn cosine_alignment(a: &Vector, b: &Vector) -> Result<f32> {
    if a.dim() != b.dim() {
        return Err(Error::InvalidDimension {
            expected: a.dim(),
            actual: b.dim(),
        });
    }
    if a.norm() == 0.0 || b.norm() == 0.0 {
        return Ok(0.0);
    }
    let cos = cosine(a.as_slice(), b.as_slice()).clamp(-1.0, 1.0);
    Ok((cos + 1.0) / 2.0)
}

/// XOR popcount of two equal-width hash codes
#[inline]
pub fn hamming_distance(a: &PerceptualHash, b: &PerceptualHash) -> Result<u32> {
    a.hamming_distance(b)
}

/// Angular distance used by the visual clustering fallback: `1 - cos`
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine(a, b)
}
