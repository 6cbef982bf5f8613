//! Person clustering over face embeddings
//!
//! Every face of every item is a point. Points are cleaned, scaled to unit
//! length and clustered with Euclidean DBSCAN. A cluster only becomes a
//! person when its faces come from enough distinct photos.

use albumkit_core::{Error, Item, ItemId, Result, Vector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::PersonConfig;
use crate::dbscan::{cluster_count, Dbscan, Metric};

/// One recurring individual
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonCluster {
    pub id: String,
    /// Distinct items, in order of first appearance
    pub items: Vec<ItemId>,
    /// Number of faces assigned to this person
    pub face_count: usize,
}

/// Result of a person clustering pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonReport {
    pub persons: Vec<PersonCluster>,
    /// Inverse map restricted to retained persons
    pub item_persons: BTreeMap<ItemId, Vec<String>>,
    /// Non-finite embedding components replaced by 0
    pub sanitized_values: usize,
}

impl PersonReport {
    pub fn persons_of(&self, item: &ItemId) -> &[String] {
        self.item_persons.get(item).map(|p| p.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default)]
pub struct PersonClusterer {
    config: PersonConfig,
}

impl PersonClusterer {
    #[must_use]
    pub fn new(config: PersonConfig) -> Self {
        Self { config }
    }

    /// Cluster all faces of the batch into persons. Faces of different
    /// dimension are an error.
    pub fn cluster(&self, items: &[Item]) -> Result<PersonReport> {
        let mut faces: Vec<Vector> = Vec::new();
        let mut owners: Vec<usize> = Vec::new();

        for (idx, item) in items.iter().enumerate() {
            for face in &item.faces {
                if let Some(first) = faces.first() {
                    if first.dim() != face.dim() {
                        return Err(Error::InvalidDimension {
                            expected: first.dim(),
                            actual: face.dim(),
                        });
                    }
                }
                faces.push(face.clone());
                owners.push(idx);
            }
        }

        if faces.len() < 2 {
            debug!(faces = faces.len(), "too few faces to cluster");
            return Ok(PersonReport::default());
        }

        let mut sanitized = 0;
        for face in &mut faces {
            sanitized += face.sanitize();
            face.normalize_with_floor(self.config.norm_floor);
            sanitized += face.sanitize();
        }
        if sanitized > 0 {
            warn!(values = sanitized, "non-finite face embedding values replaced with 0");
        }

        let labels = Dbscan::new(self.config.eps, self.config.min_samples)
            .with_metric(Metric::Euclidean)
            .fit_predict(&faces)?;

        let mut candidates: Vec<PersonCluster> = (0..cluster_count(&labels))
            .map(|label| PersonCluster {
                id: format!("person_{}", label),
                items: Vec::new(),
                face_count: 0,
            })
            .collect();

        for (face_idx, label) in labels.iter().enumerate() {
            let Some(label) = label else { continue };
            let person = &mut candidates[*label];
            let owner = &items[owners[face_idx]].id;
            person.face_count += 1;
            if !person.items.contains(owner) {
                person.items.push(owner.clone());
            }
        }

        let total = candidates.len();
        let persons: Vec<PersonCluster> = candidates
            .into_iter()
            .filter(|p| p.items.len() >= self.config.min_distinct_items)
            .collect();

        let mut item_persons: BTreeMap<ItemId, Vec<String>> = BTreeMap::new();
        for person in &persons {
            for item in &person.items {
                item_persons
                    .entry(item.clone())
                    .or_default()
                    .push(person.id.clone());
            }
        }

        info!(
            faces = faces.len(),
            candidates = total,
            persons = persons.len(),
            "person clustering complete"
        );

        Ok(PersonReport {
            persons,
            item_persons,
            sanitized_values: sanitized,
        })
    }
}
