//! # albumkit Core
//!
//! Core library for albumkit, the photo organization engine.
//!
//! This crate provides the data model and the vector algebra every
//! clustering pass builds on:
//!
//! - [`Vector`] - Dense embedding with cosine and L2 helpers
//! - [`VectorKey`] - Unit vector with identity, role and provenance (normalize, align, compose)
//! - [`SemanticField`] - Activation of items by a set of keys
//! - [`PerceptualHash`] - Fixed-width image fingerprint with Hamming distance
//! - [`GeoPoint`] - Validated coordinate with haversine distance
//! - [`Item`] - One photograph's derived signals and organization tags
//! - [`SignalProvider`] - Injected source of embeddings, aesthetics and hashes
//!
//! ## Example
//!
//! ```rust
//! use albumkit_core::{Vector, VectorKey};
//!
//! let a = VectorKey::normalize(vec![3.0, 4.0]);
//! let b = VectorKey::normalize(vec![0.0, 1.0]);
//!
//! let composite = VectorKey::compose(&[a.clone(), b], None).unwrap();
//! let score = composite.alignment(&Vector::new(vec![3.0, 4.0])).unwrap();
//! assert!(score > 0.9);
//! assert!((a.vector().norm() - 1.0).abs() < 1e-6);
//! ```

pub mod error;
pub mod field;
pub mod geo;
pub mod hash;
pub mod ident;
pub mod item;
pub mod key;
pub mod signals;
pub mod similarity;
pub mod vector;

pub use error::{Error, Result};
pub use field::{Embedded, SemanticField};
pub use geo::{haversine_km, GeoPoint};
pub use hash::PerceptualHash;
pub use ident::short_id;
pub use item::{BurstTag, CompositeWeights, Item, ItemId, ItemTags, QualityScores};
pub use key::{KeyRole, MetaValue, Metadata, VectorKey, KEY_ID_LEN};
pub use signals::{fill_missing_signals, SignalFill, SignalProvider};
pub use similarity::{cosine_alignment, cosine_distance, hamming_distance};
pub use vector::Vector;
