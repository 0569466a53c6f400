//! Explicit per-run context: the table source plus the caches shared by
//! every projection that uses it.

use std::collections::BTreeMap;

use recon_core::RawRecord;
use recon_source::{RowFilter, TableSource};

use crate::lookup::LookupCache;

/// Table existence and column cache.
///
/// Entries are written once per table name and never invalidated, so one
/// probe stays valid for every patient projected from the same source.
#[derive(Debug, Default)]
pub struct SchemaProbe {
    known: BTreeMap<String, Option<Vec<String>>>,
}

impl SchemaProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns of `table`, or `None` when the export does not have it.
    pub fn columns(&mut self, source: &dyn TableSource, table: &str) -> Option<&[String]> {
        self.known
            .entry(table.to_string())
            .or_insert_with(|| source.columns(table))
            .as_deref()
    }

    pub fn exists(&mut self, source: &dyn TableSource, table: &str) -> bool {
        self.columns(source, table).is_some()
    }

    pub fn has_column(&mut self, source: &dyn TableSource, table: &str, column: &str) -> bool {
        self.columns(source, table)
            .is_some_and(|cols| cols.iter().any(|c| c == column))
    }

    /// Number of distinct tables probed so far.
    #[must_use]
    pub fn probed(&self) -> usize {
        self.known.len()
    }
}

/// Everything a projection reads through.
///
/// Construct one per source and pass it to every projection; tests build a
/// fresh one to start with cold caches.
pub struct ReconContext<'s> {
    source: &'s dyn TableSource,
    probe: SchemaProbe,
    pub(crate) lookups: LookupCache,
}

impl<'s> ReconContext<'s> {
    #[must_use]
    pub fn new(source: &'s dyn TableSource) -> Self {
        Self {
            source,
            probe: SchemaProbe::new(),
            lookups: LookupCache::new(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &'s dyn TableSource {
        self.source
    }

    pub fn exists(&mut self, table: &str) -> bool {
        self.probe.exists(self.source, table)
    }

    pub fn has_column(&mut self, table: &str, column: &str) -> bool {
        self.probe.has_column(self.source, table, column)
    }

    pub fn columns(&mut self, table: &str) -> Option<Vec<String>> {
        self.probe.columns(self.source, table).map(<[String]>::to_vec)
    }

    /// Filtered read of one physical table. An absent table reads as empty.
    #[must_use]
    pub fn scan(&self, table: &str, filter: &RowFilter) -> Vec<RawRecord> {
        self.source.scan(table, filter)
    }

    #[must_use]
    pub const fn probe(&self) -> &SchemaProbe {
        &self.probe
    }

    #[must_use]
    pub const fn lookups(&self) -> &LookupCache {
        &self.lookups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_source::Dataset;

    #[test]
    fn probe_answers_absent_tables_without_error() {
        let mut ds = Dataset::new();
        ds.insert("PAT_ENC", vec!["PAT_ENC_CSN_ID".into()], Vec::new())
            .unwrap();
        let mut ctx = ReconContext::new(&ds);
        assert!(ctx.exists("PAT_ENC"));
        assert!(!ctx.exists("HNO_INFO"));
        assert!(ctx.has_column("PAT_ENC", "PAT_ENC_CSN_ID"));
        assert!(!ctx.has_column("PAT_ENC", "PAT_ID"));
        assert!(!ctx.has_column("HNO_INFO", "PAT_ENC_CSN_ID"));
        assert_eq!(ctx.probe().probed(), 2);
    }
}
