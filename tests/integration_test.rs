// Integration tests for albumkit
use albumkit::config::{BurstConfig, GroupingConfig};
use albumkit::prelude::*;
use albumkit::{organize_json, GroupOrigin, MetaValue, SignalFill};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("albumkit=debug")
        .with_test_writer()
        .try_init();
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 20, 10, 0, 0).unwrap()
}

/// Unit vector at `deg` degrees in the first two components
fn dir(deg: f32) -> Vec<f32> {
    let r = deg.to_radians();
    vec![r.cos(), r.sin(), 0.0]
}

fn shot(id: &str, secs: i64, deg: f32) -> anyhow::Result<Item> {
    Ok(Item::new(id)
        .with_timestamp(t0() + Duration::seconds(secs))
        .with_location(-22.95, -43.21)?
        .with_embedding(dir(deg)))
}

#[test]
fn test_vector_key_protocol() -> anyhow::Result<()> {
    let v = Vector::new(vec![3.0, 4.0, 12.0]);
    let key = VectorKey::normalize(v.clone());
    assert!((key.vector().norm() - 1.0).abs() < 1e-6);
    assert!((key.alignment(&v)? - 1.0).abs() < 1e-6);

    let zero = VectorKey::normalize(vec![0.0, 0.0, 0.0]);
    assert!(zero.is_degenerate());
    assert_eq!(zero.alignment(&v)?, 0.0);

    let single = VectorKey::compose(&[key.clone()], None)?;
    assert_eq!(single.role(), KeyRole::Composite);
    for (a, b) in single.vector().as_slice().iter().zip(key.vector().as_slice()) {
        assert!((a - b).abs() < 1e-6);
    }

    let other = VectorKey::normalize(vec![0.0, 1.0, 0.0]);
    let first = VectorKey::compose(&[key.clone(), other.clone()], Some(&[2.0, 6.0]))?;
    let second = VectorKey::compose(&[key, other], Some(&[0.25, 0.75]))?;
    assert_eq!(first.id(), second.id());
    assert_eq!(
        first.metadata().get("weights"),
        Some(&MetaValue::FloatList(vec![0.25, 0.75]))
    );

    assert!(VectorKey::compose(&[], None).is_err());
    Ok(())
}

#[test]
fn test_semantic_field_over_organized_items() -> anyhow::Result<()> {
    let items = vec![shot("sunset", 0, 0.0)?, shot("street", 60, 90.0)?];
    let field = SemanticField::new(vec![VectorKey::normalize(dir(5.0))]);

    let hits = field.activate(&items, None::<fn(DateTime<Utc>) -> f32>)?;
    assert_eq!(hits[0].0.id.as_str(), "sunset");
    assert!(hits.iter().all(|(_, score)| *score >= 0.5));
    Ok(())
}

#[test]
fn test_end_to_end_trip() -> anyhow::Result<()> {
    init_tracing();

    let mut items = vec![
        // morning burst at the beach, the middle shot is the sharpest
        shot("beach_1", 0, 0.0)?.with_quality(QualityScores::new(0.3, 0.6, 0.4)),
        shot("beach_2", 2, 20.0)?.with_quality(QualityScores::new(0.9, 0.6, 0.8)),
        shot("beach_3", 4, 40.0)?.with_quality(QualityScores::new(0.5, 0.6, 0.5)),
        // same place, later, near-identical pair
        shot("beach_4", 1800, 90.0)?
            .with_phash(PerceptualHash::from_hex("a1b2c3d4e5f60718")?)
            .with_quality(QualityScores::new(0.6, 0.5, 0.5)),
        shot("beach_5", 1830, 95.0)?
            .with_phash(PerceptualHash::from_hex("a1b2c3d4e5f60719")?)
            .with_quality(QualityScores::new(0.4, 0.5, 0.5)),
        // three hours later: new event
        shot("dinner_1", 3 * 3600, 180.0)?.with_quality(QualityScores::new(0.8, 0.7, 0.9)),
        // undated, geotagged at the beach
        Item::new("scan_1").with_location(-22.9505, -43.2101)?,
    ];

    let organization = albumkit::organize(&mut items)?;

    // groups
    assert_eq!(organization.groups.len(), 2);
    let beach = organization
        .groups
        .group_of(&ItemId::from("beach_1"))
        .expect("beach group");
    assert_eq!(beach.origin, GroupOrigin::Event);
    assert_eq!(beach.len(), 6);
    assert!(beach.contains(&ItemId::from("scan_1")));
    assert_eq!(beach.duration_minutes(), 30.5);
    assert!(beach.key.is_some());

    // bursts
    assert_eq!(organization.bursts.len(), 1);
    let burst = &organization.bursts[0];
    assert_eq!(burst.representative.as_str(), "beach_2");
    let positions: Vec<usize> = items[..3]
        .iter()
        .map(|i| i.tags.burst.as_ref().map(|b| b.position).unwrap_or(0))
        .collect();
    assert_eq!(positions, vec![1, 2, 3]);

    // duplicates
    assert_eq!(organization.duplicates.len(), 1);
    assert_eq!(organization.duplicates[0].id, "dup_a1b2c3d4");
    assert!(items[3].tags.is_duplicate && items[4].tags.is_duplicate);

    // quality
    assert!(organization.stats.sharpness_quartiles.is_some());
    assert!(items.iter().all(|i| (0.0..=1.0).contains(&i.quality.sharpness)));

    // keys
    assert_eq!(organization.stats.item_keys, 6);
    assert!(items[6].key.is_none());
    let global = organization.global_key.as_ref().expect("global key");
    assert_eq!(global.metadata().get("total_items"), Some(&MetaValue::Int(6)));

    Ok(())
}

#[test]
fn test_custom_thresholds() -> anyhow::Result<()> {
    let config = OrganizerConfig {
        bursts: BurstConfig {
            max_gap_seconds: 1.0,
            ..BurstConfig::default()
        },
        grouping: GroupingConfig {
            max_span_hours: 0.25,
            ..GroupingConfig::default()
        },
        ..OrganizerConfig::default()
    };
    let organizer = Organizer::new(config)?;

    let mut items = vec![shot("a", 0, 0.0)?, shot("b", 2, 0.0)?, shot("c", 1200, 0.0)?];
    let organization = organizer.organize(&mut items)?;

    assert!(organization.bursts.is_empty());
    assert_eq!(organization.groups.len(), 2);
    Ok(())
}

#[test]
fn test_persons_across_photos() -> anyhow::Result<()> {
    let ana = vec![0.1, 0.9, 0.2, 0.0];
    let ana_again = vec![0.12, 0.88, 0.21, 0.01];
    let bruno = vec![0.9, 0.0, 0.1, 0.3];

    let mut items = vec![
        shot("p1", 0, 0.0)?.with_face(ana.clone()).with_face(bruno.clone()),
        shot("p2", 600, 0.0)?.with_face(ana_again),
        shot("p3", 1200, 0.0)?.with_face(ana).with_face(bruno),
    ];
    let organization = albumkit::organize(&mut items)?;

    assert_eq!(organization.persons.len(), 1);
    let person = &organization.persons[0];
    assert_eq!(person.items.len(), 3);
    assert_eq!(items[1].tags.person_ids, vec![person.id.clone()]);
    Ok(())
}

struct StubModels;

impl SignalProvider for StubModels {
    fn embedding(&self, item: &Item) -> Option<Vector> {
        let deg = if item.id.as_str().starts_with("cat") { 0.0 } else { 90.0 };
        Some(Vector::new(dir(deg)))
    }

    fn aesthetic(&self, _item: &Item) -> Option<f32> {
        Some(0.5)
    }
}

#[test]
fn test_undated_batch_with_injected_models() -> anyhow::Result<()> {
    let mut items = vec![
        Item::new("cat_1"),
        Item::new("dog_1"),
        Item::new("cat_2"),
        Item::new("dog_2"),
        Item::new("cat_3"),
    ];
    let organization = Organizer::default()
        .with_provider(Arc::new(StubModels))
        .organize(&mut items)?;

    assert_eq!(
        organization.stats.signals_filled,
        SignalFill {
            embeddings: 5,
            aesthetics: 5,
            hashes: 0
        }
    );
    assert_eq!(organization.groups.len(), 2);
    let cats = organization.groups.get("group_0").expect("cat group");
    assert_eq!(cats.len(), 3);
    assert_eq!(cats.origin, GroupOrigin::Visual);
    assert_eq!(items[3].tags.group_id.as_deref(), Some("group_1"));
    Ok(())
}

#[test]
fn test_json_round_trip() -> anyhow::Result<()> {
    let input = r#"[
        {"id": "a.jpg", "captured_at": "2024-04-20T10:00:00Z", "location": [-22.95, -43.21],
         "embedding": [1.0, 0.0], "phash": "ffffffff00000000",
         "quality": {"sharpness": 0.4, "exposure": 0.5, "aesthetic": 0.6}},
        {"id": "b.jpg", "captured_at": "2024-04-20T10:00:03Z", "location": [-22.95, -43.21],
         "embedding": [0.98, 0.05], "phash": "ffffffff00000001",
         "quality": {"sharpness": 0.8, "exposure": 0.5, "aesthetic": 0.6}}
    ]"#;

    let report = organize_json(input, &Organizer::default())?;
    assert_eq!(report.organization.groups.len(), 1);
    assert_eq!(report.organization.bursts.len(), 1);
    assert_eq!(report.organization.duplicates.len(), 1);

    let json = report.to_json()?;
    let parsed: albumkit::Report = serde_json::from_str(&json)?;
    assert_eq!(parsed.items.len(), 2);
    assert_eq!(parsed.organization.groups.len(), 1);
    assert!(parsed.items[0].tags.group_id.is_some());

    assert!(albumkit::load_items("{not json").is_err());
    Ok(())
}

#[test]
fn test_malformed_input_fails_fast() {
    assert!(Item::new("x").with_location(95.0, 0.0).is_err());
    assert!(PerceptualHash::from_hex("zz").is_err());

    let mut items = vec![
        Item::new("a").with_phash(PerceptualHash::from_u64(1)),
        Item::new("b").with_phash(PerceptualHash::from_hex("01").unwrap()),
    ];
    assert!(matches!(
        albumkit::organize(&mut items),
        Err(Error::HashWidthMismatch { left: 64, right: 8 })
    ));
}
