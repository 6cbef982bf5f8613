//! Organizer configuration
//!
//! Every threshold used by the clustering passes lives here. All fields have
//! serde defaults, so a partial JSON document (or `{}`) yields the stock
//! behaviour.

use albumkit_core::{CompositeWeights, Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration of a full organization run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub duplicates: DuplicateConfig,
    #[serde(default)]
    pub bursts: BurstConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub persons: PersonConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub location: LocationConfig,
}

impl OrganizerConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(text: &str) -> Result<Self> {
        let config: OrganizerConfig =
            serde_json::from_str(text).map_err(|e| Error::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds no pass can work with
    pub fn validate(&self) -> Result<()> {
        self.duplicates.validate()?;
        self.bursts.validate()?;
        self.grouping.validate()?;
        self.persons.validate()?;
        self.quality.validate()?;
        self.location.validate()
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfig(message.into())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateConfig {
    /// Hashes strictly closer than this many bits are duplicates
    #[serde(default = "default_max_distance")]
    pub max_distance: u32,
}

fn default_max_distance() -> u32 {
    10
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            max_distance: default_max_distance(),
        }
    }
}

impl DuplicateConfig {
    fn validate(&self) -> Result<()> {
        if self.max_distance == 0 {
            return Err(invalid("duplicates.max_distance must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstConfig {
    /// Maximum gap between consecutive shots of a burst
    #[serde(default = "default_max_gap_seconds")]
    pub max_gap_seconds: f64,
    /// Cosine similarity consecutive shots must exceed
    #[serde(default = "default_burst_similarity")]
    pub similarity_threshold: f32,
    #[serde(default = "default_min_run_len")]
    pub min_run_len: usize,
}

fn default_max_gap_seconds() -> f64 {
    5.0
}

fn default_burst_similarity() -> f32 {
    0.75
}

fn default_min_run_len() -> usize {
    2
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            max_gap_seconds: default_max_gap_seconds(),
            similarity_threshold: default_burst_similarity(),
            min_run_len: default_min_run_len(),
        }
    }
}

impl BurstConfig {
    fn validate(&self) -> Result<()> {
        if !self.max_gap_seconds.is_finite() || self.max_gap_seconds < 0.0 {
            return Err(invalid("bursts.max_gap_seconds must be a non-negative number"));
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(invalid("bursts.similarity_threshold must lie in [-1, 1]"));
        }
        if self.min_run_len < 2 {
            return Err(invalid("bursts.min_run_len must be at least 2"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Maximum time since the group's first shot
    #[serde(default = "default_max_span_hours")]
    pub max_span_hours: f64,
    /// Items at or beyond this distance from the group anchor open a new group
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,
    /// DBSCAN radius over cosine distance, used when nothing is dated
    #[serde(default = "default_visual_eps")]
    pub visual_eps: f32,
    #[serde(default = "default_visual_min_samples")]
    pub visual_min_samples: usize,
}

fn default_max_span_hours() -> f64 {
    2.0
}

fn default_max_distance_km() -> f64 {
    1.0
}

fn default_visual_eps() -> f32 {
    0.3
}

fn default_visual_min_samples() -> usize {
    2
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            max_span_hours: default_max_span_hours(),
            max_distance_km: default_max_distance_km(),
            visual_eps: default_visual_eps(),
            visual_min_samples: default_visual_min_samples(),
        }
    }
}

impl GroupingConfig {
    fn validate(&self) -> Result<()> {
        if !self.max_span_hours.is_finite() || self.max_span_hours < 0.0 {
            return Err(invalid("grouping.max_span_hours must be a non-negative number"));
        }
        if !self.max_distance_km.is_finite() || self.max_distance_km <= 0.0 {
            return Err(invalid("grouping.max_distance_km must be positive"));
        }
        if !self.visual_eps.is_finite() || self.visual_eps <= 0.0 {
            return Err(invalid("grouping.visual_eps must be positive"));
        }
        if self.visual_min_samples == 0 {
            return Err(invalid("grouping.visual_min_samples must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonConfig {
    /// DBSCAN radius over Euclidean distance of unit face embeddings
    #[serde(default = "default_person_eps")]
    pub eps: f32,
    #[serde(default = "default_person_min_samples")]
    pub min_samples: usize,
    /// A person must appear in at least this many distinct photos
    #[serde(default = "default_min_distinct_items")]
    pub min_distinct_items: usize,
    /// Norms below this are clamped before dividing
    #[serde(default = "default_norm_floor")]
    pub norm_floor: f32,
}

fn default_person_eps() -> f32 {
    0.6
}

fn default_person_min_samples() -> usize {
    3
}

fn default_min_distinct_items() -> usize {
    2
}

fn default_norm_floor() -> f32 {
    1e-10
}

impl Default for PersonConfig {
    fn default() -> Self {
        Self {
            eps: default_person_eps(),
            min_samples: default_person_min_samples(),
            min_distinct_items: default_min_distinct_items(),
            norm_floor: default_norm_floor(),
        }
    }
}

impl PersonConfig {
    fn validate(&self) -> Result<()> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(invalid("persons.eps must be positive"));
        }
        if self.min_samples == 0 {
            return Err(invalid("persons.min_samples must be at least 1"));
        }
        if self.min_distinct_items == 0 {
            return Err(invalid("persons.min_distinct_items must be at least 1"));
        }
        if !self.norm_floor.is_finite() || self.norm_floor <= 0.0 {
            return Err(invalid("persons.norm_floor must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default)]
    pub weights: CompositeWeights,
    /// Normalized sharpness below this flags the photo as blurred
    #[serde(default = "default_blur_threshold")]
    pub blur_threshold: f32,
}

fn default_blur_threshold() -> f32 {
    0.3
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            weights: CompositeWeights::default(),
            blur_threshold: default_blur_threshold(),
        }
    }
}

impl QualityConfig {
    fn validate(&self) -> Result<()> {
        let w = &self.weights;
        let all = [w.sharpness, w.exposure, w.face, w.face_present, w.face_absent];
        if all.iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(invalid("quality weights must be non-negative numbers"));
        }
        if !(0.0..=1.0).contains(&w.aesthetic_share) {
            return Err(invalid("quality.weights.aesthetic_share must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.blur_threshold) {
            return Err(invalid("quality.blur_threshold must lie in [0, 1]"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Unlabelled photos borrow the label of a photo taken within this window
    #[serde(default = "default_max_time_gap_minutes")]
    pub max_time_gap_minutes: f64,
}

fn default_max_time_gap_minutes() -> f64 {
    10.0
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            max_time_gap_minutes: default_max_time_gap_minutes(),
        }
    }
}

impl LocationConfig {
    fn validate(&self) -> Result<()> {
        if !self.max_time_gap_minutes.is_finite() || self.max_time_gap_minutes < 0.0 {
            return Err(invalid("location.max_time_gap_minutes must be a non-negative number"));
        }
        Ok(())
    }
}
