//! Counters for degraded-but-completed projections.

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::Serialize;

/// What a projection had to skip, guess, or leave unresolved.
///
/// A projection always completes; this is where partial input shows up.
/// Every collection is ordered so two runs over the same input report
/// identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Diagnostics {
    /// Configured tables absent from the export.
    pub missing_tables: BTreeSet<String>,
    /// Split members skipped because their physical table is absent, by
    /// logical table.
    pub skipped_split_members: BTreeMap<String, Vec<String>>,
    /// Patient-level tables read without a patient filter.
    pub unfiltered_reads: BTreeSet<String>,
    /// Order links whose parent order was never materialized.
    pub orphaned_order_links: usize,
    /// Result rows moved from a child order onto its parent.
    pub chained_results: usize,
    /// Cross-reference rows pointing at no projected encounter, by table.
    pub unresolved_cross_references: BTreeMap<String, usize>,
    /// Provenance stamps pointing at no projected encounter, by table.
    pub unresolved_provenance: BTreeMap<String, usize>,
    /// History rows left out of a timeline for lack of a contact date, by
    /// timeline.
    pub undated_snapshots: BTreeMap<String, usize>,
    /// Rows dropped for lacking a usable identifier, by table.
    pub unidentified_rows: BTreeMap<String, usize>,
    /// Ids with no entry in their lookup table, by lookup.
    pub unresolved_lookups: BTreeMap<String, usize>,
    /// Keys that appear more than once in a lookup table, by lookup.
    pub duplicate_lookup_keys: BTreeMap<String, usize>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the projection ran without any degradation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn count(map: &mut BTreeMap<String, usize>, key: &str, n: usize) {
        if n > 0 {
            *map.entry(key.to_string()).or_default() += n;
        }
    }
}
