//! Semantic keys
//!
//! A [`VectorKey`] is a unit vector with a short identifier, a [`KeyRole`]
//! and open-ended provenance metadata. Keys are immutable: composition and
//! metadata attachment always produce a new key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::ident::{short_id, short_id_bytes};
use crate::vector::{dot, Vector};

/// Length of derived key identifiers (hex characters)
pub const KEY_ID_LEN: usize = 8;

/// Role of a key inside the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    /// Identity or context: a person, a place, an event, an image
    Anchor,
    /// Filter or modulator: a mode, an atmosphere
    Gate,
    /// Relation between keys
    Link,
    /// Derived by weighted composition of other keys
    Composite,
}

/// Primitive metadata value attached to a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TextList(Vec<String>),
    FloatList(Vec<f64>),
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<usize> for MetaValue {
    fn from(v: usize) -> Self {
        MetaValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Text(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Text(v)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(v: Vec<String>) -> Self {
        MetaValue::TextList(v)
    }
}

impl From<Vec<f64>> for MetaValue {
    fn from(v: Vec<f64>) -> Self {
        MetaValue::FloatList(v)
    }
}

/// Provenance metadata, ordered for stable serialization
pub type Metadata = BTreeMap<String, MetaValue>;

/// An identity-bearing unit vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VectorKeyRecord")]
pub struct VectorKey {
    vector: Vector,
    id: String,
    role: KeyRole,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    metadata: Metadata,
}

/// Wire shape of a key; converting back re-establishes the unit-norm invariant
#[derive(Deserialize)]
struct VectorKeyRecord {
    vector: Vector,
    id: String,
    role: KeyRole,
    #[serde(default)]
    metadata: Metadata,
}

impl From<VectorKeyRecord> for VectorKey {
    fn from(record: VectorKeyRecord) -> Self {
        Self {
            vector: record.vector.normalized(),
            id: record.id,
            role: record.role,
            metadata: record.metadata,
        }
    }
}

impl VectorKey {
    /// Create a key, normalizing `vector` to unit length
    #[must_use]
    pub fn new(vector: impl Into<Vector>, id: impl Into<String>, role: KeyRole) -> Self {
        let vector: Vector = vector.into();
        Self {
            vector: vector.normalized(),
            id: id.into(),
            role,
            metadata: Metadata::new(),
        }
    }

    /// Normalize `vector` into an anchor key whose id is derived from its contents.
    /// The zero vector maps to itself.
    #[must_use]
    pub fn normalize(vector: impl Into<Vector>) -> Self {
        let vector: Vector = vector.into();
        let normalized = vector.normalized();
        let bytes: Vec<u8> = normalized
            .as_slice()
            .iter()
            .flat_map(|x| x.to_le_bytes())
            .collect();
        Self {
            id: short_id_bytes(&bytes, KEY_ID_LEN),
            vector: normalized,
            role: KeyRole::Anchor,
            metadata: Metadata::new(),
        }
    }

    /// Return a copy of this key carrying one more metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn vector(&self) -> &Vector {
        &self.vector
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn role(&self) -> KeyRole {
        self.role
    }

    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.vector.dim()
    }

    /// A key built from the zero vector; it aligns with nothing
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.vector.is_zero()
    }

    /// Alignment A(k, v): cosine similarity rescaled from [-1, 1] to [0, 1].
    ///
    /// Returns exactly 0.0 when `vector` has zero norm or the key is degenerate.
    pub fn alignment(&self, vector: &Vector) -> Result<f32> {
        if vector.dim() != self.dim() {
            return Err(Error::InvalidDimension {
                expected: self.dim(),
                actual: vector.dim(),
            });
        }

        let norm = vector.norm();
        if norm == 0.0 || self.is_degenerate() {
            return Ok(0.0);
        }

        let cos = (dot(self.vector.as_slice(), vector.as_slice()) / norm).clamp(-1.0, 1.0);
        Ok((cos + 1.0) / 2.0)
    }

    /// Weighted composition C(k1..kn, w1..wn).
    ///
    /// Weights default to uniform and are always rescaled to sum to 1. The
    /// resulting id depends only on the ordered member ids.
    pub fn compose(keys: &[VectorKey], weights: Option<&[f32]>) -> Result<VectorKey> {
        let first = keys.first().ok_or(Error::EmptyComposition)?;
        let dim = first.dim();

        if let Some(bad) = keys.iter().find(|k| k.dim() != dim) {
            return Err(Error::InvalidDimension {
                expected: dim,
                actual: bad.dim(),
            });
        }

        let weights = normalize_weights(keys.len(), weights)?;

        let mut composed = vec![0.0f32; dim];
        for (key, weight) in keys.iter().zip(weights.iter()) {
            for (acc, x) in composed.iter_mut().zip(key.vector.as_slice()) {
                *acc += weight * x;
            }
        }

        let member_ids: Vec<String> = keys.iter().map(|k| k.id.clone()).collect();
        let id = short_id(&member_ids.join("_"), KEY_ID_LEN);

        let mut metadata = Metadata::new();
        metadata.insert("composed_from".to_string(), MetaValue::TextList(member_ids));
        metadata.insert(
            "weights".to_string(),
            MetaValue::FloatList(weights.iter().map(|w| f64::from(*w)).collect()),
        );

        Ok(VectorKey {
            vector: Vector::new(composed).normalized(),
            id,
            role: KeyRole::Composite,
            metadata,
        })
    }
}

fn normalize_weights(count: usize, weights: Option<&[f32]>) -> Result<Vec<f32>> {
    let Some(weights) = weights else {
        return Ok(vec![1.0 / count as f32; count]);
    };

    if weights.len() != count {
        return Err(Error::WeightCountMismatch {
            keys: count,
            weights: weights.len(),
        });
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(Error::InvalidWeights(
            "weights must be finite and non-negative".to_string(),
        ));
    }

    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return Err(Error::InvalidWeights("total weight cannot be zero".to_string()));
    }

    Ok(weights.iter().map(|w| w / total).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(values: &[f32], id: &str) -> VectorKey {
        VectorKey::new(values.to_vec(), id, KeyRole::Anchor)
    }

    #[test]
    fn test_new_normalizes() {
        let k = key(&[3.0, 4.0], "a");
        assert!((k.vector().norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stays_zero() {
        let k = VectorKey::normalize(vec![0.0, 0.0, 0.0]);
        assert!(k.is_degenerate());
        assert_eq!(k.vector().as_slice(), &[0.0, 0.0, 0.0]);
        assert_eq!(k.alignment(&Vector::new(vec![1.0, 0.0, 0.0])).unwrap(), 0.0);
    }

    #[test]
    fn test_normalize_id_is_content_derived() {
        let a = VectorKey::normalize(vec![1.0, 2.0]);
        let b = VectorKey::normalize(vec![2.0, 4.0]);
        let c = VectorKey::normalize(vec![2.0, 1.0]);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.role(), KeyRole::Anchor);
    }

    #[test]
    fn test_self_alignment_is_maximal() {
        let k = key(&[0.2, -0.7, 0.4], "a");
        let score = k.alignment(k.vector()).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_alignment_range() {
        let k = key(&[1.0, 0.0], "a");
        let opposite = k.alignment(&Vector::new(vec![-5.0, 0.0])).unwrap();
        let orthogonal = k.alignment(&Vector::new(vec![0.0, 2.0])).unwrap();
        assert!(opposite.abs() < 1e-6);
        assert!((orthogonal - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_alignment_zero_vector() {
        let k = key(&[1.0, 0.0], "a");
        assert_eq!(k.alignment(&Vector::zeros(2)).unwrap(), 0.0);
    }

    #[test]
    fn test_alignment_dimension_mismatch() {
        let k = key(&[1.0, 0.0], "a");
        assert!(matches!(
            k.alignment(&Vector::zeros(3)),
            Err(Error::InvalidDimension { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_compose_single_key_is_noop() {
        let k = key(&[1.0, 2.0, 2.0], "solo");
        let composed = VectorKey::compose(std::slice::from_ref(&k), None).unwrap();
        for (a, b) in composed.vector().as_slice().iter().zip(k.vector().as_slice()) {
            assert!((a - b).abs() < 1e-6);
        }
        assert_eq!(composed.role(), KeyRole::Composite);
    }

    #[test]
    fn test_compose_empty_is_error() {
        assert_eq!(VectorKey::compose(&[], None), Err(Error::EmptyComposition));
    }

    #[test]
    fn test_compose_rescales_weights() {
        let a = key(&[1.0, 0.0], "a");
        let b = key(&[0.0, 1.0], "b");
        let small = VectorKey::compose(&[a.clone(), b.clone()], Some(&[1.0, 3.0])).unwrap();
        let large = VectorKey::compose(&[a, b], Some(&[10.0, 30.0])).unwrap();

        assert_eq!(small.vector(), large.vector());
        assert_eq!(
            small.metadata().get("weights"),
            Some(&MetaValue::FloatList(vec![0.25, 0.75]))
        );
        assert!((small.vector().norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_compose_id_is_deterministic_and_ordered() {
        let a = key(&[1.0, 0.0], "a");
        let b = key(&[0.0, 1.0], "b");
        let ab1 = VectorKey::compose(&[a.clone(), b.clone()], None).unwrap();
        let ab2 = VectorKey::compose(&[a.clone(), b.clone()], None).unwrap();
        let ba = VectorKey::compose(&[b, a], None).unwrap();

        assert_eq!(ab1.id(), ab2.id());
        assert_ne!(ab1.id(), ba.id());
        assert_eq!(ab1.id().len(), KEY_ID_LEN);
        assert_eq!(
            ab1.metadata().get("composed_from"),
            Some(&MetaValue::TextList(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn test_compose_rejects_bad_weights() {
        let a = key(&[1.0, 0.0], "a");
        let b = key(&[0.0, 1.0], "b");
        let keys = [a, b];
        assert!(matches!(
            VectorKey::compose(&keys, Some(&[1.0])),
            Err(Error::WeightCountMismatch { keys: 2, weights: 1 })
        ));
        assert!(matches!(
            VectorKey::compose(&keys, Some(&[0.0, 0.0])),
            Err(Error::InvalidWeights(_))
        ));
        assert!(matches!(
            VectorKey::compose(&keys, Some(&[-1.0, 2.0])),
            Err(Error::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_compose_dimension_mismatch() {
        let a = key(&[1.0, 0.0], "a");
        let b = key(&[0.0, 1.0, 0.0], "b");
        assert!(matches!(
            VectorKey::compose(&[a, b], None),
            Err(Error::InvalidDimension { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_opposite_keys_compose_to_zero() {
        let a = key(&[1.0, 0.0], "a");
        let b = key(&[-1.0, 0.0], "b");
        let composed = VectorKey::compose(&[a, b], None).unwrap();
        assert!(composed.is_degenerate());
    }

    #[test]
    fn test_deserialize_renormalizes() {
        let json = r#"{"vector":[3.0,4.0],"id":"x","role":"gate"}"#;
        let k: VectorKey = serde_json::from_str(json).unwrap();
        assert_eq!(k.role(), KeyRole::Gate);
        assert!((k.vector().norm() - 1.0).abs() < 1e-6);
        assert!(k.metadata().is_empty());
    }
}
