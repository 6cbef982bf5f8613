//! Pluggable signal sources
//!
//! Embeddings, aesthetic scores and perceptual hashes are produced by
//! external models. The engine only sees them through a [`SignalProvider`]
//! handle supplied by the caller, so tests can inject deterministic fakes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hash::PerceptualHash;
use crate::item::Item;
use crate::vector::Vector;

/// Source of per-item signals. Every method defaults to "not available".
pub trait SignalProvider: Send + Sync {
    fn embedding(&self, _item: &Item) -> Option<Vector> {
        None
    }

    fn aesthetic(&self, _item: &Item) -> Option<f32> {
        None
    }

    fn perceptual_hash(&self, _item: &Item) -> Option<PerceptualHash> {
        None
    }
}

/// Number of signals filled in by [`fill_missing_signals`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFill {
    pub embeddings: usize,
    pub aesthetics: usize,
    pub hashes: usize,
}

impl SignalFill {
    #[inline]
    pub fn total(&self) -> usize {
        self.embeddings + self.aesthetics + self.hashes
    }
}

/// Ask `provider` for every signal an item is missing. Present signals are
/// never overwritten; an aesthetic score of 0 counts as missing.
pub fn fill_missing_signals(items: &mut [Item], provider: &dyn SignalProvider) -> SignalFill {
    let mut fill = SignalFill::default();

    for item in items.iter_mut() {
        if item.embedding.is_none() {
            if let Some(embedding) = provider.embedding(item) {
                item.embedding = Some(embedding);
                fill.embeddings += 1;
            }
        }

        if item.quality.aesthetic <= 0.0 {
            if let Some(aesthetic) = provider.aesthetic(item) {
                item.quality.aesthetic = aesthetic;
                fill.aesthetics += 1;
            }
        }

        if item.phash.is_none() {
            if let Some(hash) = provider.perceptual_hash(item) {
                item.phash = Some(hash);
                fill.hashes += 1;
            }
        }
    }

    debug!(
        embeddings = fill.embeddings,
        aesthetics = fill.aesthetics,
        hashes = fill.hashes,
        "filled missing signals"
    );
    fill
}
