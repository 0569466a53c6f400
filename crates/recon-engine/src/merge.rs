//! Split-table merging.
//!
//! A wide logical table arrives as a base table plus split members, each
//! carrying more columns for the same logical row. Members may name their
//! join column differently from the base key; the manifest says which name
//! to use and the merger never guesses from naming conventions.
//!
//! Join plans are resolved once against the source's columns. A member
//! whose table is absent is skipped; a join column that exists on neither
//! side is an [`EngineError::AmbiguousJoinColumn`].

use std::collections::BTreeMap;

use recon_config::{ManifestConfig, SplitTable};
use recon_core::{RawRecord, Scalar};
use recon_source::RowFilter;
use serde::Serialize;

use crate::context::ReconContext;
use crate::error::EngineError;

/// How one split member joins onto its base table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberJoin {
    pub table: String,
    /// Column on the member table.
    pub join_column: String,
    /// Column on the base table holding the same value.
    pub base_column: String,
    /// Every column the member declares; null-filled on base rows it has
    /// no row for.
    #[serde(skip)]
    pub columns: Vec<String>,
}

/// Resolved join plan for one logical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinPlan {
    pub logical: String,
    pub base_column: String,
    /// Present members in manifest order.
    pub members: Vec<MemberJoin>,
    /// Members whose table is absent.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

/// Join plans for every manifest entry whose base table exists.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct JoinPlans {
    plans: BTreeMap<String, JoinPlan>,
}

impl JoinPlans {
    /// Resolve every manifest entry against the source.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::AmbiguousJoinColumn` if a declared join column
    /// is absent and no declared fallback applies.
    pub fn build(manifest: &ManifestConfig, ctx: &mut ReconContext<'_>) -> Result<Self, EngineError> {
        let mut plans = BTreeMap::new();
        for entry in &manifest.tables {
            if !ctx.exists(&entry.name) {
                tracing::debug!(logical = %entry.name, "base table absent, no join plan");
                continue;
            }
            let plan = plan_entry(manifest, entry, ctx)?;
            if !plan.skipped.is_empty() {
                tracing::debug!(
                    logical = %plan.logical,
                    skipped = ?plan.skipped,
                    "split members absent"
                );
            }
            plans.insert(entry.name.clone(), plan);
        }
        Ok(Self { plans })
    }

    #[must_use]
    pub fn get(&self, logical: &str) -> Option<&JoinPlan> {
        self.plans.get(logical)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JoinPlan> {
        self.plans.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Read `table`, merging split members when `merged` is set and the
    /// table has a plan. Otherwise this is a plain filtered read. The filter
    /// applies to base-table columns.
    #[must_use]
    pub fn fetch(
        &self,
        ctx: &ReconContext<'_>,
        table: &str,
        merged: bool,
        filter: &RowFilter,
    ) -> Vec<RawRecord> {
        let base = ctx.scan(table, filter);
        match self.plans.get(table) {
            Some(plan) if merged => plan.merge(ctx, base),
            _ => base,
        }
    }
}

fn plan_entry(
    manifest: &ManifestConfig,
    entry: &SplitTable,
    ctx: &mut ReconContext<'_>,
) -> Result<JoinPlan, EngineError> {
    let base_column = if ctx.has_column(&entry.name, &entry.base_key) {
        entry.base_key.clone()
    } else {
        match &entry.base_join_override {
            Some(column) if ctx.has_column(&entry.name, column) => column.clone(),
            other => {
                return Err(EngineError::AmbiguousJoinColumn {
                    logical: entry.name.clone(),
                    table: entry.name.clone(),
                    column: other.clone().unwrap_or_else(|| entry.base_key.clone()),
                });
            }
        }
    };

    let mut members = Vec::with_capacity(entry.splits.len());
    let mut skipped = Vec::new();
    for split in &entry.splits {
        if !ctx.exists(&split.table) {
            skipped.push(split.table.clone());
            continue;
        }
        if !ctx.has_column(&split.table, &split.join_column) {
            return Err(EngineError::AmbiguousJoinColumn {
                logical: entry.name.clone(),
                table: split.table.clone(),
                column: split.join_column.clone(),
            });
        }
        let member_base = match manifest.alias(&entry.name, &split.join_column) {
            Some(alias) => {
                if !ctx.has_column(&entry.name, &alias.base_column) {
                    return Err(EngineError::AmbiguousJoinColumn {
                        logical: entry.name.clone(),
                        table: entry.name.clone(),
                        column: alias.base_column.clone(),
                    });
                }
                alias.base_column.clone()
            }
            None if ctx.has_column(&entry.name, &split.join_column) => split.join_column.clone(),
            None => base_column.clone(),
        };
        members.push(MemberJoin {
            table: split.table.clone(),
            join_column: split.join_column.clone(),
            base_column: member_base,
            columns: ctx.columns(&split.table).unwrap_or_default(),
        });
    }

    Ok(JoinPlan {
        logical: entry.name.clone(),
        base_column,
        members,
        skipped,
    })
}

impl JoinPlan {
    /// Left-join the present members onto `base` rows.
    ///
    /// Member columns are folded in member order; a column already present
    /// keeps its first value. A member holding several rows for one key
    /// contributes the lowest in canonical row order. Rows come back tagged
    /// with the logical name.
    #[must_use]
    pub fn merge(&self, ctx: &ReconContext<'_>, base: Vec<RawRecord>) -> Vec<RawRecord> {
        let mut rows: Vec<RawRecord> = base
            .into_iter()
            .map(|row| row.retagged(self.logical.as_str()))
            .collect();
        if rows.is_empty() {
            return rows;
        }

        for member in &self.members {
            let keys: Vec<String> = rows
                .iter()
                .filter_map(|r| r.key_of(&member.base_column))
                .collect();
            let split_rows = if keys.is_empty() {
                Vec::new()
            } else {
                ctx.scan(&member.table, &RowFilter::any_of(&member.join_column, keys))
            };
            let mut by_key: BTreeMap<String, RawRecord> = BTreeMap::new();
            for split_row in split_rows {
                let Some(key) = split_row.key_of(&member.join_column) else {
                    continue;
                };
                match by_key.get(&key) {
                    Some(kept) if kept.canonical_cmp(&split_row).is_le() => {}
                    _ => {
                        by_key.insert(key, split_row);
                    }
                }
            }
            for row in &mut rows {
                let matched = row
                    .key_of(&member.base_column)
                    .and_then(|key| by_key.get(&key));
                match matched {
                    Some(split_row) => {
                        for (column, value) in split_row.fields() {
                            row.insert_if_absent(column, value.clone());
                        }
                    }
                    None => {
                        for column in &member.columns {
                            row.insert_if_absent(column, Scalar::Null);
                        }
                    }
                }
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use recon_config::{JoinAlias, SplitMember};
    use recon_core::Scalar;
    use recon_source::Dataset;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn encounter_manifest() -> ManifestConfig {
        ManifestConfig {
            tables: vec![SplitTable {
                name: "PAT_ENC".into(),
                base_key: "PAT_ENC_CSN_ID".into(),
                base_join_override: None,
                splits: vec![
                    SplitMember {
                        table: "PAT_ENC_2".into(),
                        join_column: "PAT_ENC_CSN_ID".into(),
                    },
                    SplitMember {
                        table: "PAT_ENC_3".into(),
                        join_column: "PAT_ENC_CSN".into(),
                    },
                    SplitMember {
                        table: "PAT_ENC_4".into(),
                        join_column: "PAT_ENC_CSN_ID".into(),
                    },
                ],
            }],
            aliases: Vec::new(),
        }
    }

    fn encounter_dataset() -> Dataset {
        let mut ds = Dataset::new();
        ds.insert(
            "PAT_ENC",
            cols(&["PAT_ENC_CSN_ID", "PAT_ID", "DEPARTMENT_ID"]),
            vec![
                vec![Scalar::Int(802_802_103), "Z1".into(), Scalar::Int(10)],
                vec![Scalar::Int(799_951_565), "Z1".into(), Scalar::Int(11)],
            ],
        )
        .unwrap();
        ds.insert(
            "PAT_ENC_2",
            cols(&["PAT_ENC_CSN_ID", "BMI", "DEPARTMENT_ID"]),
            vec![vec!["802802103".into(), Scalar::Float(22.5), Scalar::Int(99)]],
        )
        .unwrap();
        ds.insert(
            "PAT_ENC_3",
            cols(&["PAT_ENC_CSN", "BP_SYSTOLIC"]),
            vec![
                vec![Scalar::Int(799_951_565), Scalar::Int(118)],
                vec![Scalar::Int(802_802_103), Scalar::Int(121)],
            ],
        )
        .unwrap();
        ds
    }

    #[test]
    fn renamed_join_column_falls_back_to_base_key() {
        let ds = encounter_dataset();
        let mut ctx = ReconContext::new(&ds);
        let plans = JoinPlans::build(&encounter_manifest(), &mut ctx).unwrap();
        let plan = plans.get("PAT_ENC").unwrap();
        assert_eq!(plan.base_column, "PAT_ENC_CSN_ID");
        assert_eq!(plan.members[1].join_column, "PAT_ENC_CSN");
        assert_eq!(plan.members[1].base_column, "PAT_ENC_CSN_ID");
        assert_eq!(plan.skipped, vec!["PAT_ENC_4"]);
    }

    #[test]
    fn merge_folds_columns_first_occurrence_wins() {
        let ds = encounter_dataset();
        let mut ctx = ReconContext::new(&ds);
        let plans = JoinPlans::build(&encounter_manifest(), &mut ctx).unwrap();
        let rows = plans.fetch(
            &ctx,
            "PAT_ENC",
            true,
            &RowFilter::eq("PAT_ENC_CSN_ID", &Scalar::Int(802_802_103)),
        );
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.table(), "PAT_ENC");
        assert_eq!(row.get("DEPARTMENT_ID"), Some(&Scalar::Int(10)));
        assert_eq!(row.get("BMI"), Some(&Scalar::Float(22.5)));
        assert_eq!(row.get("BP_SYSTOLIC"), Some(&Scalar::Int(121)));
    }

    #[test]
    fn unmerged_fetch_is_a_plain_read() {
        let ds = encounter_dataset();
        let mut ctx = ReconContext::new(&ds);
        let plans = JoinPlans::build(&encounter_manifest(), &mut ctx).unwrap();
        let rows = plans.fetch(&ctx, "PAT_ENC", false, &RowFilter::All);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| !r.has_column("BMI")));
    }

    #[test]
    fn base_row_without_member_row_gets_member_columns_as_null() {
        let ds = encounter_dataset();
        let mut ctx = ReconContext::new(&ds);
        let plans = JoinPlans::build(&encounter_manifest(), &mut ctx).unwrap();
        let rows = plans.fetch(
            &ctx,
            "PAT_ENC",
            true,
            &RowFilter::eq("PAT_ENC_CSN_ID", &Scalar::Int(799_951_565)),
        );
        assert_eq!(rows[0].get("BMI"), Some(&Scalar::Null));
        assert_eq!(rows[0].get("DEPARTMENT_ID"), Some(&Scalar::Int(11)));
        assert_eq!(rows[0].get("BP_SYSTOLIC"), Some(&Scalar::Int(118)));

        // Matched or not, every merged row carries the same columns.
        let all = plans.fetch(&ctx, "PAT_ENC", true, &RowFilter::All);
        let shapes: Vec<Vec<&str>> = all
            .iter()
            .map(|r| r.columns().collect())
            .collect();
        assert_eq!(shapes[0], shapes[1]);
    }

    #[test]
    fn member_join_column_missing_is_ambiguous() {
        let mut ds = encounter_dataset();
        ds.insert("PAT_ENC_4", cols(&["CSN"]), Vec::new()).unwrap();
        let mut ctx = ReconContext::new(&ds);
        let err = JoinPlans::build(&encounter_manifest(), &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            EngineError::AmbiguousJoinColumn { ref table, ref column, .. }
                if table == "PAT_ENC_4" && column == "PAT_ENC_CSN_ID"
        ));
    }

    #[test]
    fn base_override_used_when_declared_key_absent() {
        let mut ds = Dataset::new();
        ds.insert("CLAIM", cols(&["CLAIM_REC_ID", "AMOUNT"]), vec![vec![
            Scalar::Int(5),
            Scalar::Float(12.5),
        ]])
        .unwrap();
        ds.insert("CLAIM_2", cols(&["CLAIM_ID", "PAYER"]), vec![vec![
            Scalar::Int(5),
            "ACME".into(),
        ]])
        .unwrap();
        let manifest = ManifestConfig {
            tables: vec![SplitTable {
                name: "CLAIM".into(),
                base_key: "CLAIM_ID".into(),
                base_join_override: Some("CLAIM_REC_ID".into()),
                splits: vec![SplitMember {
                    table: "CLAIM_2".into(),
                    join_column: "CLAIM_ID".into(),
                }],
            }],
            aliases: Vec::new(),
        };
        let mut ctx = ReconContext::new(&ds);
        let plans = JoinPlans::build(&manifest, &mut ctx).unwrap();
        let rows = plans.fetch(&ctx, "CLAIM", true, &RowFilter::All);
        assert_eq!(rows[0].get("PAYER"), Some(&Scalar::Text("ACME".into())));
    }

    #[test]
    fn alias_maps_renamed_column_to_verified_base_column() {
        let mut ds = Dataset::new();
        ds.insert(
            "ORDER_PROC",
            cols(&["ORDER_PROC_ID", "PAT_ENC_CSN_ID"]),
            vec![vec![Scalar::Int(945_468_368), Scalar::Int(802_802_103)]],
        )
        .unwrap();
        ds.insert(
            "ORDER_PROC_3",
            cols(&["ORDER_ID", "SPECIMEN_TYPE"]),
            vec![vec![Scalar::Int(945_468_368), "Blood".into()]],
        )
        .unwrap();
        let manifest = ManifestConfig {
            tables: vec![SplitTable {
                name: "ORDER_PROC".into(),
                base_key: "ORDER_PROC_ID".into(),
                base_join_override: None,
                splits: vec![SplitMember {
                    table: "ORDER_PROC_3".into(),
                    join_column: "ORDER_ID".into(),
                }],
            }],
            aliases: vec![JoinAlias {
                logical: "ORDER_PROC".into(),
                join_column: "ORDER_ID".into(),
                base_column: "ORDER_PROC_ID".into(),
            }],
        };
        let mut ctx = ReconContext::new(&ds);
        let plans = JoinPlans::build(&manifest, &mut ctx).unwrap();
        let rows = plans.fetch(&ctx, "ORDER_PROC", true, &RowFilter::All);
        assert_eq!(
            rows[0].get("SPECIMEN_TYPE"),
            Some(&Scalar::Text("Blood".into()))
        );
    }

    #[test]
    fn absent_base_table_has_no_plan() {
        let ds = Dataset::new();
        let mut ctx = ReconContext::new(&ds);
        let plans = JoinPlans::build(&encounter_manifest(), &mut ctx).unwrap();
        assert!(plans.is_empty());
        assert!(plans.fetch(&ctx, "PAT_ENC", true, &RowFilter::All).is_empty());
    }
}
