//! Memoized id → display-name resolution against dimension tables.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use recon_config::{LookupSpec, ResolveSpec};
use recon_core::{RawRecord, Scalar};
use recon_source::{RowFilter, TableSource};

use crate::diagnostics::Diagnostics;

/// One loaded dimension table.
#[derive(Debug, Default)]
pub struct LookupTable {
    names: BTreeMap<String, Scalar>,
    duplicates: usize,
}

impl LookupTable {
    fn load(source: &dyn TableSource, spec: &LookupSpec) -> Self {
        let mut table = Self::default();
        for row in source.scan(&spec.table, &RowFilter::All) {
            let Some(key) = row.key_of(&spec.key_column) else {
                continue;
            };
            let name = row.get(&spec.name_column).cloned().unwrap_or_default();
            match table.names.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(name);
                }
                Entry::Occupied(mut slot) => {
                    table.duplicates += 1;
                    if name.canonical_cmp(slot.get()).is_lt() {
                        slot.insert(name);
                    }
                }
            }
        }
        if table.duplicates > 0 {
            tracing::warn!(
                lookup = %spec.name,
                table = %spec.table,
                duplicates = table.duplicates,
                "lookup table has repeated keys; keeping the lowest name"
            );
        }
        table
    }
}

/// Lookup tables loaded on first use.
///
/// Keyed by table and column pair, never by patient, so the cache stays
/// correct when reused across projections. An absent table is cached as
/// empty and is not read again.
#[derive(Debug, Default)]
pub struct LookupCache {
    tables: BTreeMap<(String, String, String), LookupTable>,
}

impl LookupCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&mut self, source: &dyn TableSource, spec: &LookupSpec) -> &LookupTable {
        self.tables
            .entry((
                spec.table.clone(),
                spec.key_column.clone(),
                spec.name_column.clone(),
            ))
            .or_insert_with(|| LookupTable::load(source, spec))
    }

    /// Display name for `id`, or `None` if the id is blank, unknown, or
    /// maps to a null name.
    pub fn resolve_name(
        &mut self,
        source: &dyn TableSource,
        spec: &LookupSpec,
        id: &Scalar,
    ) -> Option<Scalar> {
        let key = id.key()?;
        self.table(source, spec)
            .names
            .get(&key)
            .filter(|name| !name.is_null())
            .cloned()
    }

    /// Number of tables loaded so far.
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.tables.len()
    }

    /// Add resolved names to `row` and every row attached below it.
    ///
    /// A name is written to the rule's `into` column only if the row does
    /// not already carry that column.
    pub(crate) fn resolve_tree(
        &mut self,
        source: &dyn TableSource,
        resolve: &[(&ResolveSpec, &LookupSpec)],
        row: &mut RawRecord,
        diag: &mut Diagnostics,
    ) {
        for (rule, spec) in resolve {
            if rule.table != row.table() {
                continue;
            }
            let Some(id) = row.get(&rule.column).filter(|v| v.key().is_some()).cloned() else {
                continue;
            };
            match self.resolve_name(source, spec, &id) {
                Some(name) => {
                    row.insert_if_absent(&rule.into, name);
                }
                None => Diagnostics::count(&mut diag.unresolved_lookups, &spec.name, 1),
            }
            let duplicates = self.table(source, spec).duplicates;
            if duplicates > 0 {
                diag.duplicate_lookup_keys
                    .insert(spec.name.clone(), duplicates);
            }
        }
        for child in row.attached_rows_mut() {
            self.resolve_tree(source, resolve, child, diag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use recon_source::Dataset;

    fn provider() -> LookupSpec {
        LookupSpec {
            name: "provider".into(),
            table: "CLARITY_SER".into(),
            key_column: "PROV_ID".into(),
            name_column: "PROV_NAME".into(),
        }
    }

    fn dataset() -> Dataset {
        let mut ds = Dataset::new();
        ds.insert(
            "CLARITY_SER",
            vec!["PROV_ID".into(), "PROV_NAME".into()],
            vec![
                vec!["144590".into(), "RAMMELKAMP, ZOE".into()],
                vec!["144590".into(), "ZZ DUPLICATE".into()],
                vec!["200001".into(), Scalar::Null],
            ],
        )
        .unwrap();
        ds
    }

    #[test]
    fn resolves_across_representations_and_memoizes() {
        let ds = dataset();
        let mut cache = LookupCache::new();
        assert_eq!(
            cache.resolve_name(&ds, &provider(), &Scalar::Int(144_590)),
            Some(Scalar::Text("RAMMELKAMP, ZOE".into()))
        );
        assert_eq!(cache.resolve_name(&ds, &provider(), &Scalar::Int(200_001)), None);
        assert_eq!(cache.resolve_name(&ds, &provider(), &Scalar::Null), None);
        assert_eq!(cache.loaded(), 1);
    }

    #[test]
    fn absent_table_is_cached_as_empty() {
        let ds = Dataset::new();
        let mut cache = LookupCache::new();
        assert_eq!(cache.resolve_name(&ds, &provider(), &Scalar::Int(1)), None);
        assert_eq!(cache.resolve_name(&ds, &provider(), &Scalar::Int(2)), None);
        assert_eq!(cache.loaded(), 1);
    }

    #[test]
    fn resolve_tree_fills_nested_rows_and_counts_misses() {
        let ds = dataset();
        let mut cache = LookupCache::new();
        let rule = ResolveSpec {
            table: "ORDER_PROC".into(),
            column: "AUTHRZING_PROV_ID".into(),
            lookup: "provider".into(),
            into: "AUTHRZING_PROV_NAME".into(),
        };
        let spec = provider();
        let mut encounter = RawRecord::new("PAT_ENC");
        encounter.set_attached(
            "orders",
            vec![
                RawRecord::new("ORDER_PROC").with("AUTHRZING_PROV_ID", "144590"),
                RawRecord::new("ORDER_PROC").with("AUTHRZING_PROV_ID", "999"),
            ],
        );
        let mut diag = Diagnostics::new();
        cache.resolve_tree(&ds, &[(&rule, &spec)], &mut encounter, &mut diag);

        let orders = encounter.attached("orders").unwrap();
        assert_eq!(
            orders[0].get("AUTHRZING_PROV_NAME"),
            Some(&Scalar::Text("RAMMELKAMP, ZOE".into()))
        );
        assert!(!orders[1].has_column("AUTHRZING_PROV_NAME"));
        assert_eq!(diag.unresolved_lookups["provider"], 1);
        assert_eq!(diag.duplicate_lookup_keys["provider"], 1);
    }
}
