//! Ordering and lookup properties of history timelines.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use recon_core::{Csn, HistorySnapshot, HistoryTimeline};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn snapshots() -> Vec<HistorySnapshot<&'static str>> {
    vec![
        HistorySnapshot {
            csn: Csn::new(720_000_001),
            reviewed_csn: None,
            contact_date: date(2017, 2, 3),
            payload: "A",
        },
        HistorySnapshot {
            csn: Csn::new(802_802_103),
            reviewed_csn: Some(Csn::new(799_951_565)),
            contact_date: date(2019, 11, 20),
            payload: "C",
        },
        HistorySnapshot {
            csn: Csn::new(760_000_002),
            reviewed_csn: None,
            contact_date: date(2018, 7, 14),
            payload: "B",
        },
        HistorySnapshot {
            csn: Csn::new(700_000_003),
            reviewed_csn: None,
            contact_date: date(2016, 1, 9),
            payload: "Z",
        },
    ]
}

/// Every rotation and the reversal of the input.
fn permutations() -> Vec<Vec<HistorySnapshot<&'static str>>> {
    let base = snapshots();
    let mut out = Vec::new();
    for shift in 0..base.len() {
        let mut rotated = base.clone();
        rotated.rotate_left(shift);
        out.push(rotated.clone());
        rotated.reverse();
        out.push(rotated);
    }
    out
}

#[test]
fn latest_is_max_date_under_any_input_order() {
    for input in permutations() {
        let timeline = HistoryTimeline::from_unordered(input);
        assert_eq!(timeline.latest(), Some(&"C"));
        assert_eq!(timeline.baseline().map(|s| s.payload), Some("Z"));
    }
}

#[test]
fn timeline_is_identical_under_any_input_order() {
    let reference = HistoryTimeline::from_unordered(snapshots());
    for input in permutations() {
        assert_eq!(HistoryTimeline::from_unordered(input), reference);
    }
}

#[test]
fn as_of_encounter_matches_own_or_reviewed_contact() {
    let timeline = HistoryTimeline::from_unordered(snapshots());

    let by_reviewed = timeline.as_of_encounter(Csn::new(799_951_565));
    let by_own = timeline.as_of_encounter(Csn::new(802_802_103));
    assert_eq!(by_reviewed.map(|s| s.payload), Some("C"));
    assert_eq!(by_own.map(|s| s.payload), Some("C"));
    assert!(timeline.as_of_encounter(Csn::new(1)).is_none());
}

#[test]
fn serializes_in_chronological_order() {
    let timeline = HistoryTimeline::from_unordered(snapshots());
    let json = serde_json::to_value(&timeline).unwrap();
    let order: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["payload"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["Z", "A", "B", "C"]);
    assert_eq!(json[3]["reviewed_csn"], 799_951_565);
    assert!(json[0].get("reviewed_csn").is_none());
}
