//! # albumkit Cluster
//!
//! The organization passes of albumkit:
//!
//! - [`DuplicateDetector`] - near-duplicates by perceptual hash distance
//! - [`BurstDetector`] - rapid, visually similar shot sequences
//! - [`GroupingEngine`] - time and place events, visual clusters when undated
//! - [`PersonClusterer`] - recurring faces across photos
//! - [`ScoreNormalizer`] - batch-relative quality scores
//! - [`LocationInterpolator`] - place labels borrowed from nearby shots
//! - [`KeyDeriver`] - semantic keys for items, groups and the batch
//! - [`Organizer`] - all of the above, in order, over one batch
//!
//! ## Example
//!
//! ```rust
//! use albumkit_cluster::{Organizer, OrganizerConfig};
//! use albumkit_core::Item;
//!
//! let mut items = vec![
//!     Item::new("beach_1.jpg").with_embedding(vec![0.9, 0.1]),
//!     Item::new("beach_2.jpg").with_embedding(vec![0.8, 0.2]),
//! ];
//!
//! let organizer = Organizer::new(OrganizerConfig::default()).unwrap();
//! let organization = organizer.organize(&mut items).unwrap();
//!
//! assert_eq!(organization.groups.len(), 1);
//! assert_eq!(items[0].tags.group_id, items[1].tags.group_id);
//! ```

pub mod burst;
pub mod config;
pub mod dbscan;
pub mod duplicate;
pub mod grouping;
pub mod keys;
pub mod location;
pub mod organizer;
pub mod person;
pub mod quality;

pub use burst::{BurstDetector, BurstRun};
pub use config::{
    BurstConfig, DuplicateConfig, GroupingConfig, LocationConfig, OrganizerConfig, PersonConfig,
    QualityConfig,
};
pub use dbscan::{Dbscan, Label, Metric};
pub use duplicate::{DuplicateDetector, DuplicateSet};
pub use grouping::{Group, GroupOrigin, GroupSet, GroupingEngine};
pub use keys::KeyDeriver;
pub use location::{InterpolatedLabel, LocationInterpolator};
pub use organizer::{Organization, OrganizationStats, Organizer};
pub use person::{PersonCluster, PersonClusterer, PersonReport};
pub use quality::{percentile, NormalizationReport, Quartiles, ScoreNormalizer};
