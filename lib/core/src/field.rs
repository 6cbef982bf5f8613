//! Semantic field activation
//!
//! A [`SemanticField`] is a set of keys that together select the atoms
//! (items, memories, anything with an embedding) aligned with all of them.

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::error::Result;
use crate::item::Item;
use crate::key::VectorKey;
use crate::vector::Vector;

/// Default minimum aggregate alignment for an atom to activate
pub const DEFAULT_ACTIVATION_THRESHOLD: f32 = 0.5;

/// Anything that can be activated by a field
pub trait Embedded {
    fn embedding(&self) -> Option<&Vector>;

    /// Capture time, consulted only when a decay function is supplied
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl Embedded for Item {
    #[inline]
    fn embedding(&self) -> Option<&Vector> {
        self.embedding.as_ref()
    }

    #[inline]
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }
}

impl Embedded for Vector {
    #[inline]
    fn embedding(&self) -> Option<&Vector> {
        Some(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticField {
    pub keys: Vec<VectorKey>,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

fn default_threshold() -> f32 {
    DEFAULT_ACTIVATION_THRESHOLD
}

impl SemanticField {
    #[must_use]
    pub fn new(keys: Vec<VectorKey>) -> Self {
        Self {
            keys,
            threshold: DEFAULT_ACTIVATION_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Mean alignment of `vector` against every key; 0.0 for an empty field
    pub fn aggregate(&self, vector: &Vector) -> Result<f32> {
        if self.keys.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0f32;
        for key in &self.keys {
            total += key.alignment(vector)?;
        }
        Ok(total / self.keys.len() as f32)
    }

    /// Atoms whose aggregate alignment reaches the threshold, best first.
    ///
    /// Atoms without an embedding are skipped. When `decay` is given, dated
    /// atoms have their score multiplied by `decay(timestamp)`.
    pub fn activate<'a, A, F>(&self, atoms: &'a [A], decay: Option<F>) -> Result<Vec<(&'a A, f32)>>
    where
        A: Embedded,
        F: Fn(DateTime<Utc>) -> f32,
    {
        let mut activated = Vec::new();

        for atom in atoms {
            let Some(embedding) = atom.embedding() else {
                continue;
            };

            let mut score = self.aggregate(embedding)?;
            if let (Some(decay), Some(ts)) = (decay.as_ref(), atom.timestamp()) {
                score *= decay(ts);
            }

            if score >= self.threshold {
                activated.push((atom, score));
            }
        }

        activated.sort_by_key(|(_, score)| Reverse(OrderedFloat(*score)));
        Ok(activated)
    }
}
