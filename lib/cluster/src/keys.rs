//! Semantic key derivation for items, groups and the whole batch

use ahash::AHashMap;
use albumkit_core::{short_id, Item, ItemId, KeyRole, Result, VectorKey, KEY_ID_LEN};
use rayon::prelude::*;

use crate::grouping::Group;

/// Derives the key hierarchy: item anchors, group composites, one global
/// composite.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyDeriver;

impl KeyDeriver {
    /// Anchor key over the item's embedding, `None` without one
    pub fn item_key(&self, item: &Item) -> Option<VectorKey> {
        let embedding = item.embedding.as_ref()?;
        Some(
            VectorKey::new(
                embedding.clone(),
                short_id(item.id.as_str(), KEY_ID_LEN),
                KeyRole::Anchor,
            )
            .with_metadata("type", "image")
            .with_metadata("item_id", item.id.as_str()),
        )
    }

    /// Item keys in input order, derived in parallel
    pub fn item_keys(&self, items: &[Item]) -> Vec<Option<VectorKey>> {
        items.par_iter().map(|item| self.item_key(item)).collect()
    }

    /// Uniform composition of the members' keys; `None` when no member has one
    pub fn group_key(
        &self,
        group: &Group,
        keys: &AHashMap<&ItemId, &VectorKey>,
    ) -> Result<Option<VectorKey>> {
        let member_keys: Vec<VectorKey> = group
            .members
            .iter()
            .filter_map(|m| keys.get(m).map(|k| (*k).clone()))
            .collect();
        if member_keys.is_empty() {
            return Ok(None);
        }

        let key = VectorKey::compose(&member_keys, None)?
            .with_metadata("type", "group")
            .with_metadata("group_id", group.id.as_str())
            .with_metadata("item_count", group.len());
        Ok(Some(key))
    }

    /// Uniform composition of every item key; `None` when there are none
    pub fn global_key<'a, I>(&self, keys: I) -> Result<Option<VectorKey>>
    where
        I: IntoIterator<Item = &'a VectorKey>,
    {
        let keys: Vec<VectorKey> = keys.into_iter().cloned().collect();
        if keys.is_empty() {
            return Ok(None);
        }
        let total = keys.len();
        let key = VectorKey::compose(&keys, None)?
            .with_metadata("type", "global_collection")
            .with_metadata("total_items", total);
        Ok(Some(key))
    }
}
