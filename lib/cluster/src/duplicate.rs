//! Near-duplicate detection over perceptual hashes
//!
//! Greedy, seed-centred partitioning: each unclaimed item (in input order)
//! claims every later unclaimed item whose hash is within the threshold of
//! its own. There is no merge pass, so membership is decided by the seed
//! alone.

use ahash::AHashSet;
use albumkit_core::{Item, ItemId, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DuplicateConfig;

/// Hex characters of the seed hash kept in a duplicate set id
const DUP_ID_HEX_LEN: usize = 8;

/// A set of near-identical photos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSet {
    pub id: String,
    /// Members in input order; the first one is the seed
    pub members: Vec<ItemId>,
}

impl DuplicateSet {
    /// First member; `None` only for a set deserialized without members
    #[inline]
    pub fn seed(&self) -> Option<&ItemId> {
        self.members.first()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    config: DuplicateConfig,
}

impl DuplicateDetector {
    #[must_use]
    pub fn new(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Find duplicate sets. Items without a hash are ignored; hashes of
    /// different widths are an error.
    pub fn detect(&self, items: &[Item]) -> Result<Vec<DuplicateSet>> {
        let hashed: Vec<(usize, _)> = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.phash.as_ref().map(|h| (i, h)))
            .collect();

        debug!(
            items = items.len(),
            hashed = hashed.len(),
            max_distance = self.config.max_distance,
            "detecting duplicates"
        );

        let mut claimed = vec![false; hashed.len()];
        let mut used_ids = AHashSet::new();
        let mut sets = Vec::new();

        for a in 0..hashed.len() {
            if claimed[a] {
                continue;
            }
            let (seed_idx, seed_hash) = hashed[a];
            let mut members = vec![items[seed_idx].id.clone()];

            for b in (a + 1)..hashed.len() {
                if claimed[b] {
                    continue;
                }
                let (idx, hash) = hashed[b];
                if seed_hash.hamming_distance(hash)? < self.config.max_distance {
                    claimed[b] = true;
                    members.push(items[idx].id.clone());
                }
            }

            if members.len() > 1 {
                let id = unique_id(&seed_hash.to_hex(), &mut used_ids);
                sets.push(DuplicateSet { id, members });
            }
        }

        info!(
            sets = sets.len(),
            duplicates = sets.iter().map(|s| s.len()).sum::<usize>(),
            "duplicate detection complete"
        );
        Ok(sets)
    }
}

fn unique_id(hex: &str, used: &mut AHashSet<String>) -> String {
    let prefix: String = hex.chars().take(DUP_ID_HEX_LEN).collect();
    let base = format!("dup_{}", prefix);
    let mut id = base.clone();
    let mut n = 1;
    while used.contains(&id) {
        id = format!("{}_{}", base, n);
        n += 1;
    }
    used.insert(id.clone());
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use albumkit_core::{Error, PerceptualHash};

    fn hashed(id: &str, code: u64) -> Item {
        Item::new(id).with_phash(PerceptualHash::from_u64(code))
    }

    fn ids(set: &DuplicateSet) -> Vec<&str> {
        set.members.iter().map(|m| m.as_str()).collect()
    }

    #[test]
    fn test_close_pair_and_distant_item() {
        // B is 3 bits from A, C is 20 bits from A
        let items = vec![
            hashed("A", 0),
            hashed("B", 0b111),
            hashed("C", 0xfffff),
        ];
        let sets = DuplicateDetector::default().detect(&items).unwrap();

        assert_eq!(sets.len(), 1);
        assert_eq!(ids(&sets[0]), vec!["A", "B"]);
        assert_eq!(sets[0].id, "dup_00000000");
        assert_eq!(sets[0].seed().map(|s| s.as_str()), Some("A"));
    }

    #[test]
    fn test_threshold_is_strict() {
        let items = vec![hashed("A", 0), hashed("B", 0x3ff)];
        assert!(DuplicateDetector::default().detect(&items).unwrap().is_empty());

        let items = vec![hashed("A", 0), hashed("B", 0x1ff)];
        assert_eq!(DuplicateDetector::default().detect(&items).unwrap().len(), 1);
    }

    #[test]
    fn test_first_seed_wins() {
        // B and C are each 6 bits from A but 12 bits from each other: both
        // join A. D is 12 bits from A, 6 from C: C is already claimed, so D
        // stays alone.
        let items = vec![
            hashed("A", 0),
            hashed("B", 0x3f),
            hashed("C", 0xfc0),
            hashed("D", 0x3_ffc0),
        ];
        let sets = DuplicateDetector::default().detect(&items).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(ids(&sets[0]), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_unhashed_items_skipped() {
        let items = vec![hashed("A", 0), Item::new("plain"), hashed("B", 1)];
        let sets = DuplicateDetector::default().detect(&items).unwrap();
        assert_eq!(ids(&sets[0]), vec!["A", "B"]);
    }

    #[test]
    fn test_id_collision_gets_suffix() {
        // Same leading 32 bits, far apart in the trailing bits
        let items = vec![
            hashed("A", 0x0000_0000_0000_0000),
            hashed("B", 0x0000_0000_0000_0001),
            hashed("C", 0x0000_0000_ffff_ffff),
            hashed("D", 0x0000_0000_ffff_fffe),
        ];
        let sets = DuplicateDetector::default().detect(&items).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].id, "dup_00000000");
        assert_eq!(sets[1].id, "dup_00000000_1");
    }

    #[test]
    fn test_width_mismatch_is_error() {
        let items = vec![
            hashed("A", 0),
            Item::new("B").with_phash(PerceptualHash::from_hex("ffff").unwrap()),
        ];
        assert!(matches!(
            DuplicateDetector::default().detect(&items),
            Err(Error::HashWidthMismatch { .. })
        ));
    }

    #[test]
    fn test_seed_of_empty_set() {
        let set: DuplicateSet = serde_json::from_str(r#"{"id":"dup_x","members":[]}"#).unwrap();
        assert!(set.is_empty());
        assert!(set.seed().is_none());
    }
}
