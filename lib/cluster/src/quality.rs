//! Batch-relative quality scoring
//!
//! Raw sharpness scores depend on the camera and scene, so they are rescaled
//! onto the interquartile range of the batch before being blended with
//! exposure and face presence into the composite score.

use albumkit_core::{Item, QualityScores};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::QualityConfig;

/// 25th and 75th percentile of a batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    pub p25: f32,
    pub p75: f32,
}

impl Quartiles {
    pub fn of(values: &[f32]) -> Option<Self> {
        Some(Self {
            p25: percentile(values, 25.0)?,
            p75: percentile(values, 75.0)?,
        })
    }

    /// A zero-width range cannot rescale anything
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.p75 <= self.p25
    }

    /// `(x - p25) / (p75 - p25)` clamped to [0, 1]; identity when degenerate
    #[inline]
    pub fn rescale(&self, x: f32) -> f32 {
        if self.is_degenerate() {
            return x;
        }
        ((x - self.p25) / (self.p75 - self.p25)).clamp(0.0, 1.0)
    }
}

/// Percentile with linear interpolation between closest ranks.
/// `None` for an empty slice.
pub fn percentile(values: &[f32], q: f64) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = (rank - lo as f64) as f32;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Outcome of a normalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub quartiles: Option<Quartiles>,
    /// False when the batch was empty or its quartiles coincide
    pub rescaled: bool,
    pub blurred: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScoreNormalizer {
    config: QualityConfig,
}

impl ScoreNormalizer {
    #[must_use]
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Composite quality from normalized sub-scores
    #[inline]
    pub fn composite(&self, quality: &QualityScores, has_face: bool) -> f32 {
        quality.technical(has_face, &self.config.weights)
    }

    /// Seed `quality.overall` from the raw sub-scores and the aesthetic score
    pub fn score_initial(&self, items: &mut [Item]) {
        for item in items.iter_mut() {
            let has_face = item.has_faces();
            item.quality.overall = item.quality.initial_overall(has_face, &self.config.weights);
        }
    }

    /// Rescale raw values against the batch quartiles
    pub fn rescale(&self, values: &[f32]) -> (Vec<f32>, Option<Quartiles>) {
        let Some(quartiles) = Quartiles::of(values) else {
            return (Vec::new(), None);
        };
        let rescaled = values.iter().map(|&v| quartiles.rescale(v)).collect();
        (rescaled, Some(quartiles))
    }

    /// Rescale sharpness across the batch and recompute the composite.
    ///
    /// When p25 == p75 sharpness and composite are left as they are. The blur
    /// flag always reflects the final sharpness.
    pub fn normalize(&self, items: &mut [Item]) -> NormalizationReport {
        let raw: Vec<f32> = items.iter().map(|i| i.quality.sharpness).collect();
        let (rescaled, quartiles) = self.rescale(&raw);
        let apply = quartiles.is_some_and(|q| !q.is_degenerate());

        if let Some(q) = quartiles {
            debug!(p25 = q.p25, p75 = q.p75, rescale = apply, "sharpness quartiles");
        }

        let mut blurred = 0;
        for (item, sharpness) in items.iter_mut().zip(rescaled) {
            if apply {
                item.quality.sharpness = sharpness;
                let has_face = item.has_faces();
                item.quality.overall = self.composite(&item.quality, has_face);
            }
            item.tags.blur_detected = item.quality.sharpness < self.config.blur_threshold;
            if item.tags.blur_detected {
                blurred += 1;
            }
        }

        info!(items = items.len(), rescaled = apply, blurred, "quality scores normalized");
        NormalizationReport {
            quartiles,
            rescaled: apply,
            blurred,
        }
    }
}
