use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

/// A dense vector of floating point numbers (visual or face embedding)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim],
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    /// Euclidean norm
    #[inline]
    pub fn norm(&self) -> f32 {
        norm(&self.data)
    }

    /// True when every component is exactly zero (the degenerate key case)
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|x| *x == 0.0)
    }

    fn check_dim(&self, other: &Vector) -> Result<()> {
        if self.dim() != other.dim() {
            return Err(Error::InvalidDimension {
                expected: self.dim(),
                actual: other.dim(),
            });
        }
        Ok(())
    }

    /// Dot product with another vector of the same dimension
    #[inline]
    pub fn dot(&self, other: &Vector) -> Result<f32> {
        self.check_dim(other)?;
        Ok(dot(&self.data, &other.data))
    }

    /// Compute cosine similarity with another vector.
    /// Returns 0.0 when either side has zero norm.
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> Result<f32> {
        self.check_dim(other)?;
        Ok(cosine(&self.data, &other.data))
    }

    /// Compute L2 (Euclidean) distance
    #[inline]
    pub fn l2_distance(&self, other: &Vector) -> Result<f32> {
        self.check_dim(other)?;
        Ok(l2_distance(&self.data, &other.data))
    }

    /// Normalize the vector to unit length.
    /// A zero vector is left untouched.
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            let inv_norm = 1.0 / norm;
            for x in &mut self.data {
                *x *= inv_norm;
            }
        }
    }

    /// Get normalized copy
    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }

    /// Divide by `max(norm, floor)` so near-zero vectors never blow up
    pub fn normalize_with_floor(&mut self, floor: f32) {
        let norm = self.norm().max(floor);
        for x in &mut self.data {
            *x /= norm;
        }
    }

    /// Replace NaN and infinite components with 0.0.
    /// Returns how many components were replaced.
    pub fn sanitize(&mut self) -> usize {
        let mut replaced = 0;
        for x in &mut self.data {
            if !x.is_finite() {
                *x = 0.0;
                replaced += 1;
            }
        }
        replaced
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}

impl From<&[f32]> for Vector {
    fn from(data: &[f32]) -> Self {
        Vector::from_slice(data)
    }
}

impl AsRef<[f32]> for Vector {
    fn as_ref(&self) -> &[f32] {
        &self.data
    }
}

/// Plain dot product; callers guarantee equal lengths
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Vector norm
#[inline]
pub fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity, 0.0 if either side has zero norm
#[inline]
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

/// L2 distance
#[inline]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
