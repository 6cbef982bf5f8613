//! Place label interpolation
//!
//! Geocoding happens outside the engine and is often sparse. A dated,
//! geotagged photo without a place label borrows the label of the
//! geotagged photo taken closest in time, when that photo is close enough.

use albumkit_core::{Item, ItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LocationConfig;

/// A label copied from one item to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpolatedLabel {
    pub item: ItemId,
    pub source: ItemId,
    pub location_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct LocationInterpolator {
    config: LocationConfig,
}

impl LocationInterpolator {
    #[must_use]
    pub fn new(config: LocationConfig) -> Self {
        Self { config }
    }

    /// Labels to copy. Only items labelled on input serve as sources, so an
    /// interpolated label never propagates further down a chain of shots.
    pub fn interpolate(&self, items: &[Item]) -> Vec<InterpolatedLabel> {
        let mut sources: Vec<(&Item, DateTime<Utc>, &str)> = items
            .iter()
            .filter(|i| i.location.is_some())
            .filter_map(|i| Some((i, i.captured_at?, i.location_name.as_deref()?)))
            .collect();
        sources.sort_by_key(|(_, t, _)| *t);

        let max_gap_ms = (self.config.max_time_gap_minutes * 60_000.0) as i64;
        let mut labels = Vec::new();

        for item in items {
            if item.location_name.is_some() || item.location.is_none() {
                continue;
            }
            let Some(t) = item.captured_at else { continue };

            let mut closest: Option<(&Item, i64, &str)> = None;
            for &(source, st, name) in &sources {
                let gap = (t - st).num_milliseconds().abs();
                if closest.map_or(true, |(_, best, _)| gap < best) {
                    closest = Some((source, gap, name));
                }
            }

            if let Some((source, gap, name)) = closest {
                if gap < max_gap_ms {
                    debug!(item = %item.id, source = %source.id, place = name, "place label interpolated");
                    labels.push(InterpolatedLabel {
                        item: item.id.clone(),
                        source: source.id.clone(),
                        location_name: name.to_string(),
                    });
                }
            }
        }

        info!(
            sources = sources.len(),
            interpolated = labels.len(),
            "place label interpolation complete"
        );
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 24, 20, 0, 0).unwrap()
    }

    fn geotagged(id: &str, minutes: i64) -> Item {
        Item::new(id)
            .with_timestamp(t0() + Duration::minutes(minutes))
            .with_location(38.72, -9.14)
            .unwrap()
    }

    #[test]
    fn test_closest_label_within_window() {
        let items = vec![
            geotagged("early", 0).with_location_name("Alfama"),
            geotagged("late", 8).with_location_name("Baixa"),
            geotagged("target", 5),
        ];
        let labels = LocationInterpolator::default().interpolate(&items);

        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].item.as_str(), "target");
        assert_eq!(labels[0].location_name, "Baixa");
        assert_eq!(labels[0].source.as_str(), "late");
    }

    #[test]
    fn test_outside_window() {
        let items = vec![
            geotagged("labelled", 0).with_location_name("Belem"),
            geotagged("target", 10),
        ];
        assert!(LocationInterpolator::default().interpolate(&items).is_empty());
    }

    #[test]
    fn test_requires_date_and_coordinate() {
        let items = vec![
            geotagged("labelled", 0).with_location_name("Belem"),
            Item::new("undated").with_location(38.72, -9.14).unwrap(),
            Item::new("no_gps").with_timestamp(t0()),
        ];
        assert!(LocationInterpolator::default().interpolate(&items).is_empty());
    }

    #[test]
    fn test_interpolated_labels_do_not_chain() {
        let items = vec![
            geotagged("labelled", 0).with_location_name("Chiado"),
            geotagged("second", 8),
            geotagged("third", 16),
        ];
        let labels = LocationInterpolator::default().interpolate(&items);

        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].item.as_str(), "second");
    }
}
