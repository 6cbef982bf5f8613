//! Burst detection
//!
//! A burst is a run of shots taken in quick succession that look alike.
//! Dated items are scanned in capture order; a run grows while each new shot
//! is close in time to the last admitted one and, when both carry an
//! embedding, visually similar to it.

use albumkit_core::{Item, ItemId, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BurstConfig;

/// One burst: members in capture order plus the elected best shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstRun {
    pub id: String,
    /// Position `p` (1-based) is `members[p - 1]`
    pub members: Vec<ItemId>,
    pub representative: ItemId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BurstRun {
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// 1-based position of `item`, if it belongs to this run
    pub fn position_of(&self, item: &ItemId) -> Option<usize> {
        self.members.iter().position(|m| m == item).map(|p| p + 1)
    }

    pub fn span_seconds(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct BurstDetector {
    config: BurstConfig,
}

impl BurstDetector {
    #[must_use]
    pub fn new(config: BurstConfig) -> Self {
        Self { config }
    }

    /// Find bursts among dated items. The representative of a run is the
    /// member with the highest `quality.overall` (earliest on ties).
    pub fn detect(&self, items: &[Item]) -> Result<Vec<BurstRun>> {
        let mut dated: Vec<(&Item, DateTime<Utc>)> = items
            .iter()
            .filter_map(|item| item.captured_at.map(|t| (item, t)))
            .collect();
        dated.sort_by_key(|(_, t)| *t);

        debug!(
            dated = dated.len(),
            max_gap_seconds = self.config.max_gap_seconds,
            similarity_threshold = self.config.similarity_threshold,
            "detecting bursts"
        );

        let mut runs = Vec::new();
        let mut i = 0;

        while i < dated.len() {
            let mut run = vec![i];
            let mut j = i + 1;

            while j < dated.len() {
                let last = run[run.len() - 1];
                if !self.admits(dated[last], dated[j])? {
                    break;
                }
                run.push(j);
                j += 1;
            }

            if run.len() >= self.config.min_run_len {
                let members: Vec<&Item> = run.iter().map(|&k| dated[k].0).collect();
                let id = format!("burst_{:04}", runs.len());
                debug!(burst = %id, photos = members.len(), "burst found");

                runs.push(BurstRun {
                    id,
                    representative: best_of(&members).id.clone(),
                    members: members.iter().map(|m| m.id.clone()).collect(),
                    start: dated[run[0]].1,
                    end: dated[run[run.len() - 1]].1,
                });
                i = j;
            } else {
                i += 1;
            }
        }

        info!(bursts = runs.len(), "burst detection complete");
        Ok(runs)
    }

    fn admits(&self, last: (&Item, DateTime<Utc>), next: (&Item, DateTime<Utc>)) -> Result<bool> {
        let gap = (next.1 - last.1).num_milliseconds() as f64 / 1000.0;
        if gap > self.config.max_gap_seconds {
            return Ok(false);
        }

        match (&last.0.embedding, &next.0.embedding) {
            (Some(a), Some(b)) => Ok(a.cosine_similarity(b)? > self.config.similarity_threshold),
            _ => Ok(true),
        }
    }
}

fn best_of<'a>(members: &[&'a Item]) -> &'a Item {
    let mut best = members[0];
    for &m in &members[1..] {
        if m.quality.overall > best.quality.overall {
            best = m;
        }
    }
    best
}
