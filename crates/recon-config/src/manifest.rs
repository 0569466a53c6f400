//! Join-column manifest for split tables.
//!
//! Wide logical tables are exported as a base table plus numbered split
//! tables (`PAT_ENC`, `PAT_ENC_2`, `PAT_ENC_3`, ...). The split tables do not
//! always name their join column the way the base table names its key, so
//! the manifest records each split's join column explicitly. The engine never
//! infers join columns from naming conventions.

use serde::{Deserialize, Serialize};

/// One split member of a logical table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SplitMember {
    /// Physical table name, e.g. `PAT_ENC_3`.
    pub table: String,
    /// Join column on the split table. May differ from the base key's name.
    pub join_column: String,
}

/// A logical table and its physical splits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SplitTable {
    /// Logical (and base physical) table name, e.g. `PAT_ENC`.
    pub name: String,
    /// Primary key column of the base table.
    pub base_key: String,
    /// Base-side join column to use when `base_key` is not a column of the
    /// base table in this export.
    #[serde(default)]
    pub base_join_override: Option<String>,
    /// Split members in join order.
    #[serde(default)]
    pub splits: Vec<SplitMember>,
}

/// A documented rename: a split's join column that joins against a
/// different, verified-equivalent base column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JoinAlias {
    /// Logical table the alias applies to.
    pub logical: String,
    /// Join column name as it appears on the split table.
    pub join_column: String,
    /// Base table column it is equivalent to.
    pub base_column: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ManifestConfig {
    #[serde(default)]
    pub tables: Vec<SplitTable>,
    #[serde(default)]
    pub aliases: Vec<JoinAlias>,
}

impl ManifestConfig {
    /// Manifest entry for a logical table, if it is split.
    #[must_use]
    pub fn entry(&self, logical: &str) -> Option<&SplitTable> {
        self.tables.iter().find(|t| t.name == logical)
    }

    /// Alias declared for `join_column` on a split of `logical`.
    #[must_use]
    pub fn alias(&self, logical: &str, join_column: &str) -> Option<&JoinAlias> {
        self.aliases
            .iter()
            .find(|a| a.logical == logical && a.join_column == join_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> ManifestConfig {
        ManifestConfig {
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
        }
    }

    #[test]
    fn finds_entry_and_alias() {
        let m = manifest();
        assert_eq!(m.entry("ORDER_PROC").map(|e| e.splits.len()), Some(1));
        assert!(m.entry("PAT_ENC").is_none());
        assert_eq!(
            m.alias("ORDER_PROC", "ORDER_ID").map(|a| a.base_column.as_str()),
            Some("ORDER_PROC_ID")
        );
        assert!(m.alias("PAT_ENC", "ORDER_ID").is_none());
    }
}
