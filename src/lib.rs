//! # albumkit
//!
//! Organizes a batch of photographs from signals computed elsewhere:
//! capture times, coordinates, visual embeddings, perceptual hashes,
//! quality sub-scores and face embeddings.
//!
//! albumkit never decodes an image or runs a model. Callers extract the
//! signals (or inject a [`SignalProvider`] that does), hand over the batch,
//! and get back:
//!
//! - **Groups**: events cut by time and place, or visual clusters when
//!   nothing is dated
//! - **Duplicate sets**: near-identical shots by perceptual hash
//! - **Bursts**: rapid, similar sequences with one representative each
//! - **Persons**: faces that recur across photos
//! - **Quality**: batch-relative sharpness and a composite score
//! - **Semantic keys**: comparable identity vectors for items, groups and the
//!   whole batch
//!
//! ## Quick Start
//!
//! ```rust
//! use albumkit::prelude::*;
//! use chrono::{TimeZone, Utc};
//!
//! let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
//! let mut items = vec![
//!     Item::new("IMG_0001.jpg").with_timestamp(t).with_embedding(vec![1.0, 0.0]),
//!     Item::new("IMG_0002.jpg")
//!         .with_timestamp(t + chrono::Duration::minutes(30))
//!         .with_embedding(vec![0.9, 0.1]),
//! ];
//!
//! let organization = albumkit::organize(&mut items).unwrap();
//! assert_eq!(organization.groups.len(), 1);
//! assert!(organization.global_key.is_some());
//! ```
//!
//! ## Crate Structure
//!
//! - [`albumkit-core`](https://docs.rs/albumkit-core) - Vectors, semantic keys, hashes, geo points, the item model
//! - [`albumkit-cluster`](https://docs.rs/albumkit-cluster) - The clustering passes and the organizer pipeline

use serde::{Deserialize, Serialize};
use tracing::debug;

// Re-export core types
pub use albumkit_core::{
    cosine_alignment, fill_missing_signals, hamming_distance, haversine_km, BurstTag,
    CompositeWeights, Embedded, Error, GeoPoint, Item, ItemId, ItemTags, KeyRole, MetaValue,
    Metadata, PerceptualHash, QualityScores, Result, SemanticField, SignalFill, SignalProvider,
    Vector, VectorKey,
};

// Re-export the passes
pub use albumkit_cluster::{
    BurstDetector, BurstRun, Dbscan, DuplicateDetector, DuplicateSet, Group, GroupOrigin,
    GroupSet, GroupingEngine, KeyDeriver, LocationInterpolator, Metric, Organization,
    OrganizationStats, Organizer, OrganizerConfig, PersonCluster, PersonClusterer,
    ScoreNormalizer,
};

/// Configuration types of every pass
pub mod config {
    pub use albumkit_cluster::config::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Error, GeoPoint, Group, GroupSet, Item, ItemId, KeyRole, Organization, Organizer,
        OrganizerConfig, PerceptualHash, QualityScores, Result, SemanticField, SignalProvider,
        Vector, VectorKey,
    };
}

/// Organize a batch with the default configuration
pub fn organize(items: &mut [Item]) -> Result<Organization> {
    Organizer::default().organize(items)
}

/// Organized items together with the batch-level results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub items: Vec<Item>,
    pub organization: Organization,
}

impl Report {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Parse a JSON array of items
pub fn load_items(json: &str) -> Result<Vec<Item>> {
    serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
}

/// Organize a JSON array of items and return the full report
pub fn organize_json(json: &str, organizer: &Organizer) -> Result<Report> {
    let mut items = load_items(json)?;
    debug!(items = items.len(), "items loaded from json");
    let organization = organizer.organize(&mut items)?;
    Ok(Report {
        items,
        organization,
    })
}
