//! Building history timelines from snapshot rows.

use recon_config::HistorySpec;
use recon_core::dates::scalar_date;
use recon_core::{Csn, HistorySnapshot, HistoryTimeline, RawRecord};

use crate::diagnostics::Diagnostics;

/// Turn snapshot rows into a chronological timeline.
///
/// Rows without their own CSN or without a parseable contact date cannot be
/// placed in time; they are left out and counted. A reviewed-during CSN
/// equal to the row's own CSN is dropped, since it adds nothing.
pub fn build_timeline(
    spec: &HistorySpec,
    mut rows: Vec<RawRecord>,
    diag: &mut Diagnostics,
) -> HistoryTimeline<RawRecord> {
    // Snapshots sharing date and CSN keep input order in the timeline, so
    // fix that order first.
    rows.sort_by(RawRecord::canonical_cmp);

    let mut snapshots = Vec::with_capacity(rows.len());
    let mut undated = 0;
    let mut unidentified = 0;
    for row in rows {
        let Ok(Some(csn)) = Csn::from_row(&row, &spec.own_csn_column) else {
            unidentified += 1;
            continue;
        };
        let Some(contact_date) = row.get(&spec.date_column).and_then(scalar_date) else {
            undated += 1;
            continue;
        };
        let reviewed_csn = spec
            .reviewed_csn_column
            .as_deref()
            .and_then(|column| Csn::from_row(&row, column).ok().flatten())
            .filter(|reviewed| *reviewed != csn);
        snapshots.push(HistorySnapshot {
            csn,
            reviewed_csn,
            contact_date,
            payload: row,
        });
    }

    Diagnostics::count(&mut diag.undated_snapshots, &spec.name, undated);
    Diagnostics::count(&mut diag.unidentified_rows, &spec.table, unidentified);
    if undated + unidentified > 0 {
        tracing::debug!(
            timeline = %spec.name,
            undated,
            unidentified,
            "history rows left out of timeline"
        );
    }
    HistoryTimeline::from_unordered(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use recon_core::Scalar;

    fn spec() -> HistorySpec {
        HistorySpec::new("social", "SOCIAL_HX").reviewed_in("HX_LNK_ENC_CSN")
    }

    fn row(csn: i64, reviewed: i64, date: &str) -> RawRecord {
        RawRecord::new("SOCIAL_HX")
            .with("PAT_ENC_CSN_ID", csn)
            .with("HX_LNK_ENC_CSN", reviewed)
            .with("CONTACT_DATE", date)
    }

    #[test]
    fn builds_in_chronological_order_with_reviewed_csn() {
        let mut diag = Diagnostics::new();
        let timeline = build_timeline(
            &spec(),
            vec![
                row(802_802_103, 799_951_565, "9/28/2023 12:00:00 AM"),
                row(700_000_001, 700_000_001, "1/5/2019 12:00:00 AM"),
            ],
            &mut diag,
        );
        let baseline = timeline.baseline().unwrap();
        assert_eq!(baseline.csn, Csn::new(700_000_001));
        assert_eq!(baseline.reviewed_csn, None);
        let latest = timeline.latest_snapshot().unwrap();
        assert_eq!(latest.reviewed_csn, Some(Csn::new(799_951_565)));
        assert_eq!(
            latest.contact_date,
            NaiveDate::from_ymd_opt(2023, 9, 28).unwrap()
        );
        assert!(diag.is_clean());
    }

    #[test]
    fn undated_and_unidentified_rows_are_counted() {
        let mut diag = Diagnostics::new();
        let timeline = build_timeline(
            &spec(),
            vec![
                row(1, 1, "not a date"),
                RawRecord::new("SOCIAL_HX").with("CONTACT_DATE", "1/5/2019"),
                row(2, 2, "1/5/2019").with("TOBACCO_USER_C", Scalar::Int(4)),
            ],
            &mut diag,
        );
        assert_eq!(timeline.len(), 1);
        assert_eq!(diag.undated_snapshots["social"], 1);
        assert_eq!(diag.unidentified_rows["SOCIAL_HX"], 1);
    }
}
