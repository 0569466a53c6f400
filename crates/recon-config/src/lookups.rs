//! Dimension lookups and the columns they resolve.

use serde::{Deserialize, Serialize};

/// Column suffixes that mark coded or key values rather than labels.
const CODED_SUFFIXES: &[&str] = &["_ID", "_C", "_CSN"];

/// An id → display-name dimension table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LookupSpec {
    pub name: String,
    pub table: String,
    pub key_column: String,
    /// Human-readable label column.
    pub name_column: String,
}

impl LookupSpec {
    /// Whether `name_column` looks like a coded column instead of a label.
    #[must_use]
    pub fn name_column_is_coded(&self) -> bool {
        self.name_column == self.key_column
            || CODED_SUFFIXES
                .iter()
                .any(|suffix| self.name_column.ends_with(suffix))
    }
}

/// Resolve `table.column` through `lookup` into a derived `into` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResolveSpec {
    pub table: String,
    pub column: String,
    pub lookup: String,
    pub into: String,
}
