//! Event grouping
//!
//! Two regimes, picked by whether anything in the batch is dated:
//!
//! - **Dated**: items sorted by capture time are cut into events. An item
//!   joins the open event while it is within `max_span_hours` of the event's
//!   first shot and, when both sides have coordinates, closer than
//!   `max_distance_km` to the first shot. Undated items with a coordinate
//!   then join the nearest event within `max_distance_km`.
//! - **Undated**: DBSCAN over cosine distance of the visual embeddings.
//!   Noise points become singleton groups; with no embeddings at all the
//!   whole batch is a single group.

use ahash::AHashMap;
use albumkit_core::{short_id, GeoPoint, Item, ItemId, Result, VectorKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GroupingConfig;
use crate::dbscan::{Dbscan, Metric};

/// Hex characters of a dated group id
const GROUP_ID_LEN: usize = 12;

/// How a group came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrigin {
    /// Time and place cut of dated items
    Event,
    /// Visual cluster of undated items
    Visual,
    /// Undated item that matched no visual cluster
    VisualSingleton,
    /// Whole batch, nothing to cluster on
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub origin: GroupOrigin,
    pub members: Vec<ItemId>,
    /// Earliest capture time among members
    pub start: Option<DateTime<Utc>>,
    /// Latest capture time among members
    pub end: Option<DateTime<Utc>>,
    /// First available member coordinate
    pub location: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<VectorKey>,
}

impl Group {
    fn from_members(id: String, origin: GroupOrigin, members: &[&Item]) -> Self {
        let start = members.iter().filter_map(|m| m.captured_at).min();
        let end = members.iter().filter_map(|m| m.captured_at).max();
        let location = members.iter().find_map(|m| m.location);

        Self {
            id,
            origin,
            members: members.iter().map(|m| m.id.clone()).collect(),
            start,
            end,
            location,
            key: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Minutes between the first and the last dated member; 0 when undated
    pub fn duration_minutes(&self) -> f64 {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 60_000.0,
            _ => 0.0,
        }
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.members.contains(item)
    }
}

/// Groups of one batch, indexed by group id and by member item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Group>", into = "Vec<Group>")]
pub struct GroupSet {
    groups: Vec<Group>,
    by_id: AHashMap<String, usize>,
    by_item: AHashMap<ItemId, usize>,
}

impl GroupSet {
    #[must_use]
    pub fn new(groups: Vec<Group>) -> Self {
        let mut by_id = AHashMap::with_capacity(groups.len());
        let mut by_item = AHashMap::new();
        for (idx, group) in groups.iter().enumerate() {
            by_id.insert(group.id.clone(), idx);
            for member in &group.members {
                by_item.insert(member.clone(), idx);
            }
        }
        Self {
            groups,
            by_id,
            by_item,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Group> {
        self.by_id.get(id).map(|&idx| &self.groups[idx])
    }

    /// The group an item was assigned to
    pub fn group_of(&self, item: &ItemId) -> Option<&Group> {
        self.by_item.get(item).map(|&idx| &self.groups[idx])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    /// Attach a semantic key to a group. Returns false for an unknown id.
    pub fn set_key(&mut self, id: &str, key: Option<VectorKey>) -> bool {
        match self.by_id.get(id) {
            Some(&idx) => {
                self.groups[idx].key = key;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of items that ended up in some group
    #[inline]
    pub fn grouped_items(&self) -> usize {
        self.by_item.len()
    }
}

impl From<Vec<Group>> for GroupSet {
    fn from(groups: Vec<Group>) -> Self {
        GroupSet::new(groups)
    }
}

impl From<GroupSet> for Vec<Group> {
    fn from(set: GroupSet) -> Self {
        set.groups
    }
}

impl<'a> IntoIterator for &'a GroupSet {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupingEngine {
    config: GroupingConfig,
}

impl GroupingEngine {
    #[must_use]
    pub fn new(config: GroupingConfig) -> Self {
        Self { config }
    }

    /// Partition the batch into groups. Deterministic: the same batch
    /// always yields the same membership and ids. Visual clustering rejects
    /// embeddings of different dimension.
    pub fn group(&self, items: &[Item]) -> Result<GroupSet> {
        if items.is_empty() {
            return Ok(GroupSet::default());
        }

        let dated = items.iter().filter(|i| i.is_dated()).count();
        debug!(items = items.len(), dated, "grouping items");

        let groups = if dated > 0 {
            self.group_dated(items)
        } else {
            warn!("no item carries a capture time, grouping by visual similarity");
            self.group_visual(items)?
        };

        let set = GroupSet::new(groups);
        info!(
            groups = set.len(),
            grouped = set.grouped_items(),
            ungrouped = items.len() - set.grouped_items(),
            "grouping complete"
        );
        Ok(set)
    }

    fn group_dated(&self, items: &[Item]) -> Vec<Group> {
        let mut dated: Vec<(&Item, DateTime<Utc>)> = items
            .iter()
            .filter_map(|item| item.captured_at.map(|t| (item, t)))
            .collect();
        dated.sort_by_key(|(_, t)| *t);

        let mut groups = Vec::new();
        let mut current: Vec<&Item> = Vec::new();
        let mut start = None;
        let mut anchor: Option<GeoPoint> = None;

        for (item, t) in dated {
            if let Some(group_start) = start {
                if self.admits(group_start, anchor.as_ref(), item, t) {
                    current.push(item);
                    continue;
                }
                groups.push(event_group(&current));
                current.clear();
            }
            current.push(item);
            start = Some(t);
            anchor = item.location;
        }
        if !current.is_empty() {
            groups.push(event_group(&current));
        }

        self.attach_orphans(items, &mut groups);
        groups
    }

    fn admits(
        &self,
        group_start: DateTime<Utc>,
        anchor: Option<&GeoPoint>,
        item: &Item,
        t: DateTime<Utc>,
    ) -> bool {
        let hours = (t - group_start).num_milliseconds() as f64 / 3_600_000.0;
        if hours > self.config.max_span_hours {
            return false;
        }
        match (anchor, item.location.as_ref()) {
            (Some(a), Some(b)) => a.distance_km(b) < self.config.max_distance_km,
            _ => true,
        }
    }

    /// Undated items with a coordinate join the nearest located group
    fn attach_orphans(&self, items: &[Item], groups: &mut [Group]) {
        let mut attached = 0usize;

        for item in items.iter().filter(|i| !i.is_dated()) {
            let Some(point) = item.location.as_ref() else {
                continue;
            };

            let mut best: Option<(usize, f64)> = None;
            for (idx, group) in groups.iter().enumerate() {
                if let Some(loc) = group.location.as_ref() {
                    let d = point.distance_km(loc);
                    if best.map_or(true, |(_, min)| d < min) {
                        best = Some((idx, d));
                    }
                }
            }

            if let Some((idx, d)) = best {
                if d < self.config.max_distance_km {
                    groups[idx].members.push(item.id.clone());
                    attached += 1;
                }
            }
        }

        debug!(attached, "undated items attached to events");
    }

    fn group_visual(&self, items: &[Item]) -> Result<Vec<Group>> {
        let embedded: Vec<&Item> = items.iter().filter(|i| i.embedding.is_some()).collect();

        if embedded.is_empty() {
            warn!("no embeddings either, the whole batch becomes one group");
            let all: Vec<&Item> = items.iter().collect();
            return Ok(vec![Group::from_members(
                "group_0".to_string(),
                GroupOrigin::Fallback,
                &all,
            )]);
        }

        let vectors: Vec<&[f32]> = embedded
            .iter()
            .filter_map(|i| i.embedding.as_ref().map(|e| e.as_slice()))
            .collect();
        let labels = Dbscan::new(self.config.visual_eps, self.config.visual_min_samples)
            .with_metric(Metric::Cosine)
            .fit_predict(&vectors)?;

        // groups in order of first appearance
        let mut order: Vec<(String, GroupOrigin)> = Vec::new();
        let mut members: AHashMap<String, Vec<&Item>> = AHashMap::new();

        for (idx, (item, label)) in embedded.iter().zip(labels.iter()).enumerate() {
            let (id, origin) = match label {
                Some(label) => (format!("group_{}", label), GroupOrigin::Visual),
                None => (format!("group_single_{}", idx), GroupOrigin::VisualSingleton),
            };
            members
                .entry(id.clone())
                .or_insert_with(|| {
                    order.push((id, origin));
                    Vec::new()
                })
                .push(*item);
        }

        Ok(order
            .into_iter()
            .map(|(id, origin)| {
                let group_members = members.remove(&id).unwrap_or_default();
                Group::from_members(id, origin, &group_members)
            })
            .collect())
    }
}

fn event_group(members: &[&Item]) -> Group {
    Group::from_members(event_group_id(members[0]), GroupOrigin::Event, members)
}

/// Short hash of the seed's capture minute and identifier
pub fn event_group_id(seed: &Item) -> String {
    let base = match seed.captured_at {
        Some(t) => format!("{}_{}", t.format("%Y%m%d_%H%M"), seed.id),
        None => format!("unknown_{}", seed.id),
    };
    short_id(&base, GROUP_ID_LEN)
}
