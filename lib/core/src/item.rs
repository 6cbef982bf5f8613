use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo::GeoPoint;
use crate::hash::PerceptualHash;
use crate::key::VectorKey;
use crate::vector::Vector;

/// Caller-assigned unique identifier of a photograph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

/// Weights of the composite quality blend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeights {
    #[serde(default = "default_sharpness_weight")]
    pub sharpness: f32,
    #[serde(default = "default_exposure_weight")]
    pub exposure: f32,
    #[serde(default = "default_face_weight")]
    pub face: f32,
    /// Face factor when at least one face was detected
    #[serde(default = "default_face_present")]
    pub face_present: f32,
    /// Face factor when no face was detected
    #[serde(default = "default_face_absent")]
    pub face_absent: f32,
    /// Share of the aesthetic score in the pre-normalization composite
    #[serde(default = "default_aesthetic_share")]
    pub aesthetic_share: f32,
}

fn default_sharpness_weight() -> f32 {
    0.5
}

fn default_exposure_weight() -> f32 {
    0.3
}

fn default_face_weight() -> f32 {
    0.2
}

fn default_face_present() -> f32 {
    1.0
}

fn default_face_absent() -> f32 {
    0.5
}

fn default_aesthetic_share() -> f32 {
    0.5
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            sharpness: default_sharpness_weight(),
            exposure: default_exposure_weight(),
            face: default_face_weight(),
            face_present: default_face_present(),
            face_absent: default_face_absent(),
            aesthetic_share: default_aesthetic_share(),
        }
    }
}

/// Technical quality signals of one photo, each nominally in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    #[serde(default)]
    pub sharpness: f32,
    #[serde(default)]
    pub exposure: f32,
    #[serde(default)]
    pub aesthetic: f32,
    /// Composite score used to rank photos (burst representatives, culling)
    #[serde(default)]
    pub overall: f32,
}

impl QualityScores {
    #[must_use]
    pub fn new(sharpness: f32, exposure: f32, aesthetic: f32) -> Self {
        Self {
            sharpness,
            exposure,
            aesthetic,
            overall: 0.0,
        }
    }

    /// Technical blend: sharpness, exposure and a face presence factor
    pub fn technical(&self, has_face: bool, weights: &CompositeWeights) -> f32 {
        let face_factor = if has_face {
            weights.face_present
        } else {
            weights.face_absent
        };
        weights.sharpness * self.sharpness + weights.exposure * self.exposure + weights.face * face_factor
    }

    /// Composite before batch normalization: technical blend mixed with the aesthetic score
    pub fn initial_overall(&self, has_face: bool, weights: &CompositeWeights) -> f32 {
        let share = weights.aesthetic_share;
        (1.0 - share) * self.technical(has_face, weights) + share * self.aesthetic
    }

    /// 1..=5 star rating derived from the aesthetic score
    pub fn rating(&self) -> Option<u8> {
        if self.aesthetic <= 0.0 || !self.aesthetic.is_finite() {
            return None;
        }
        let stars = (self.aesthetic * 5.0).floor() as i32 + 1;
        Some(stars.clamp(1, 5) as u8)
    }
}

/// Position of an item inside a burst run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstTag {
    pub burst_id: String,
    /// 1-based
    pub position: usize,
    pub is_representative: bool,
}

/// Identifiers attached to an item by the organization passes.
///
/// Items only hold lookup keys; groups, bursts and persons live in the
/// collections returned to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_group: Option<String>,
    #[serde(default)]
    pub is_duplicate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst: Option<BurstTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub person_ids: Vec<String>,
    #[serde(default)]
    pub blur_detected: bool,
}

/// One photograph's derived signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Human-readable place label from an external geocoder
    #[serde(default)]
    pub location_name: Option<String>,
    /// Visual embedding; meaning is opaque to the engine
    #[serde(default)]
    pub embedding: Option<Vector>,
    #[serde(default)]
    pub phash: Option<PerceptualHash>,
    #[serde(default)]
    pub quality: QualityScores,
    /// One embedding per detected face
    #[serde(default)]
    pub faces: Vec<Vector>,
    #[serde(default)]
    pub tags: ItemTags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<VectorKey>,
}

impl Item {
    #[must_use]
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            captured_at: None,
            location: None,
            location_name: None,
            embedding: None,
            phash: None,
            quality: QualityScores::default(),
            faces: Vec::new(),
            tags: ItemTags::default(),
            key: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_timestamp(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = Some(captured_at);
        self
    }

    /// Attach a coordinate; out-of-range values are rejected
    pub fn with_location(mut self, lat: f64, lon: f64) -> Result<Self> {
        self.location = Some(GeoPoint::new(lat, lon)?);
        Ok(self)
    }

    #[inline]
    #[must_use]
    pub fn with_location_name(mut self, name: impl Into<String>) -> Self {
        self.location_name = Some(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_embedding(mut self, embedding: impl Into<Vector>) -> Self {
        self.embedding = Some(embedding.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_phash(mut self, phash: PerceptualHash) -> Self {
        self.phash = Some(phash);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_quality(mut self, quality: QualityScores) -> Self {
        self.quality = quality;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_face(mut self, embedding: impl Into<Vector>) -> Self {
        self.faces.push(embedding.into());
        self
    }

    #[inline]
    pub fn has_faces(&self) -> bool {
        !self.faces.is_empty()
    }

    #[inline]
    pub fn is_dated(&self) -> bool {
        self.captured_at.is_some()
    }
}
