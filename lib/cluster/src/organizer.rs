//! The organization pipeline
//!
//! Runs every pass over one batch, in a fixed order:
//!
//! 1. missing signals from the injected [`SignalProvider`], if any
//! 2. place label interpolation
//! 3. duplicate detection
//! 4. burst detection (ranked by the pre-normalization composite)
//! 5. quality normalization
//! 6. grouping
//! 7. person clustering
//! 8. key derivation
//!
//! Each pass reads the batch as left by the previous one and its results are
//! committed to the items before the next pass starts. The passes work on a
//! staged copy of the batch: the caller's items change only when the whole
//! run succeeds.

use ahash::AHashMap;
use albumkit_core::{
    fill_missing_signals, BurstTag, Error, Item, ItemId, ItemTags, Result, SignalFill,
    SignalProvider, VectorKey,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::burst::{BurstDetector, BurstRun};
use crate::config::OrganizerConfig;
use crate::dbscan::check_dimensions;
use crate::duplicate::{DuplicateDetector, DuplicateSet};
use crate::grouping::{GroupSet, GroupingEngine};
use crate::keys::KeyDeriver;
use crate::location::LocationInterpolator;
use crate::person::{PersonCluster, PersonClusterer};
use crate::quality::{Quartiles, ScoreNormalizer};

/// Counters collected while organizing a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationStats {
    pub items: usize,
    pub dated: usize,
    pub with_embedding: usize,
    pub signals_filled: SignalFill,
    pub locations_interpolated: usize,
    pub duplicate_sets: usize,
    pub duplicate_items: usize,
    pub bursts: usize,
    pub burst_items: usize,
    pub blurred: usize,
    pub sharpness_quartiles: Option<Quartiles>,
    pub groups: usize,
    pub ungrouped: usize,
    pub faces: usize,
    pub persons: usize,
    /// Non-finite embedding values replaced by 0
    pub sanitized_values: usize,
    pub item_keys: usize,
}

/// Everything a run produced besides the per-item tags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub groups: GroupSet,
    pub duplicates: Vec<DuplicateSet>,
    pub bursts: Vec<BurstRun>,
    pub persons: Vec<PersonCluster>,
    pub item_persons: BTreeMap<ItemId, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_key: Option<VectorKey>,
    pub stats: OrganizationStats,
}

impl Organization {
    pub fn duplicate_set(&self, id: &str) -> Option<&DuplicateSet> {
        self.duplicates.iter().find(|d| d.id == id)
    }

    pub fn burst(&self, id: &str) -> Option<&BurstRun> {
        self.bursts.iter().find(|b| b.id == id)
    }

    pub fn person(&self, id: &str) -> Option<&PersonCluster> {
        self.persons.iter().find(|p| p.id == id)
    }
}

/// Runs all passes over a batch of items
#[derive(Clone, Default)]
pub struct Organizer {
    config: OrganizerConfig,
    provider: Option<Arc<dyn SignalProvider>>,
}

impl fmt::Debug for Organizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Organizer")
            .field("config", &self.config)
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

impl Organizer {
    /// Create an organizer; the configuration is validated up front
    pub fn new(config: OrganizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            provider: None,
        })
    }

    /// Fill missing embeddings, aesthetics and hashes from `provider`
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn SignalProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[inline]
    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    /// Organize one batch. Item ids must be unique; embeddings, faces and
    /// hashes must each share one width.
    ///
    /// Tags and keys from a previous run are discarded first. Quality scores
    /// are rewritten in place. On error the batch is left untouched.
    pub fn organize(&self, items: &mut [Item]) -> Result<Organization> {
        let index = index_items(items)?;
        check_widths(items)?;

        let mut staged = items.to_vec();
        let organization = self.run(&mut staged, &index)?;
        for (item, done) in items.iter_mut().zip(staged) {
            *item = done;
        }
        Ok(organization)
    }

    fn run(&self, items: &mut [Item], index: &AHashMap<ItemId, usize>) -> Result<Organization> {
        let mut stats = OrganizationStats {
            items: items.len(),
            ..OrganizationStats::default()
        };

        debug!(items = items.len(), provider = self.provider.is_some(), "organizing batch");

        for item in items.iter_mut() {
            item.tags = ItemTags::default();
            item.key = None;
        }

        if let Some(provider) = &self.provider {
            stats.signals_filled = fill_missing_signals(items, provider.as_ref());
            check_widths(items)?;
        }
        stats.dated = items.iter().filter(|i| i.is_dated()).count();
        stats.with_embedding = items.iter().filter(|i| i.embedding.is_some()).count();
        stats.faces = items.iter().map(|i| i.faces.len()).sum();

        // place labels
        let labels = LocationInterpolator::new(self.config.location.clone()).interpolate(items);
        for label in &labels {
            items[index[&label.item]].location_name = Some(label.location_name.clone());
        }
        stats.locations_interpolated = labels.len();

        // duplicates
        let duplicates = DuplicateDetector::new(self.config.duplicates.clone()).detect(items)?;
        for set in &duplicates {
            for member in &set.members {
                let tags = &mut items[index[member]].tags;
                tags.duplicate_group = Some(set.id.clone());
                tags.is_duplicate = true;
            }
        }
        stats.duplicate_sets = duplicates.len();
        stats.duplicate_items = duplicates.iter().map(|d| d.len()).sum();

        // bursts rank members by the raw composite
        let normalizer = ScoreNormalizer::new(self.config.quality.clone());
        normalizer.score_initial(items);

        let bursts = BurstDetector::new(self.config.bursts.clone()).detect(items)?;
        for run in &bursts {
            for (pos, member) in run.members.iter().enumerate() {
                items[index[member]].tags.burst = Some(BurstTag {
                    burst_id: run.id.clone(),
                    position: pos + 1,
                    is_representative: *member == run.representative,
                });
            }
        }
        stats.bursts = bursts.len();
        stats.burst_items = bursts.iter().map(|b| b.len()).sum();

        // quality
        let report = normalizer.normalize(items);
        stats.sharpness_quartiles = report.quartiles;
        stats.blurred = report.blurred;

        // groups
        let mut groups = GroupingEngine::new(self.config.grouping.clone()).group(items)?;
        for group in groups.iter() {
            for member in &group.members {
                items[index[member]].tags.group_id = Some(group.id.clone());
            }
        }
        stats.groups = groups.len();
        stats.ungrouped = items.len() - groups.grouped_items();

        // persons
        let persons = PersonClusterer::new(self.config.persons.clone()).cluster(items)?;
        for (item_id, person_ids) in &persons.item_persons {
            items[index[item_id]].tags.person_ids = person_ids.clone();
        }
        stats.persons = persons.persons.len();
        stats.sanitized_values = persons.sanitized_values;

        // keys
        let deriver = KeyDeriver;
        let item_keys = deriver.item_keys(items);
        let global_key = deriver.global_key(item_keys.iter().flatten())?;
        let group_keys = {
            let lookup: AHashMap<&ItemId, &VectorKey> = items
                .iter()
                .zip(item_keys.iter())
                .filter_map(|(item, key)| key.as_ref().map(|k| (&item.id, k)))
                .collect();
            groups
                .iter()
                .map(|group| Ok((group.id.clone(), deriver.group_key(group, &lookup)?)))
                .collect::<Result<Vec<_>>>()?
        };
        for (id, key) in group_keys {
            groups.set_key(&id, key);
        }
        stats.item_keys = item_keys.iter().filter(|k| k.is_some()).count();
        for (item, key) in items.iter_mut().zip(item_keys) {
            item.key = key;
        }

        info!(
            items = stats.items,
            groups = stats.groups,
            ungrouped = stats.ungrouped,
            duplicate_sets = stats.duplicate_sets,
            bursts = stats.bursts,
            persons = stats.persons,
            blurred = stats.blurred,
            "batch organized"
        );

        Ok(Organization {
            groups,
            duplicates,
            bursts,
            persons: persons.persons,
            item_persons: persons.item_persons,
            global_key,
            stats,
        })
    }
}

/// Embeddings, face embeddings and perceptual hashes must each have a single
/// width across the batch
fn check_widths(items: &[Item]) -> Result<()> {
    let embeddings: Vec<&[f32]> = items
        .iter()
        .filter_map(|i| i.embedding.as_ref().map(|e| e.as_slice()))
        .collect();
    check_dimensions(&embeddings)?;

    let faces: Vec<&[f32]> = items
        .iter()
        .flat_map(|i| i.faces.iter().map(|f| f.as_slice()))
        .collect();
    check_dimensions(&faces)?;

    let mut hashes = items.iter().filter_map(|i| i.phash.as_ref());
    if let Some(first) = hashes.next() {
        if let Some(bad) = hashes.find(|h| h.width_bits() != first.width_bits()) {
            return Err(Error::HashWidthMismatch {
                left: first.width_bits(),
                right: bad.width_bits(),
            });
        }
    }
    Ok(())
}

fn index_items(items: &[Item]) -> Result<AHashMap<ItemId, usize>> {
    let mut index = AHashMap::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        if index.insert(item.id.clone(), idx).is_some() {
            return Err(Error::DuplicateItemId(item.id.to_string()));
        }
    }
    Ok(index)
}
