//! Row predicates evaluated by a table source.
//!
//! Values are compared by canonical key (see `Scalar::key`), so a filter on
//! `945468368` matches the text cell `"945468368"`. A row with no cell for
//! the filtered column never matches.

use std::collections::BTreeSet;

use recon_core::{RawRecord, Scalar};

#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    /// Every row.
    All,
    /// Rows whose `column` equals `value`.
    Eq { column: String, value: String },
    /// Rows whose `column` equals any of `values`.
    AnyOf {
        column: String,
        values: BTreeSet<String>,
    },
}

impl RowFilter {
    /// Rows whose `column` has the same canonical key as `value`. A value with
    /// no key (null, blank) produces a filter that matches nothing.
    #[must_use]
    pub fn eq(column: impl Into<String>, value: &Scalar) -> Self {
        let column = column.into();
        match value.key() {
            Some(value) => Self::Eq { column, value },
            None => Self::AnyOf {
                column,
                values: BTreeSet::new(),
            },
        }
    }

    /// Rows whose `column` matches one of the given canonical keys.
    #[must_use]
    pub fn any_of<I, S>(column: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyOf {
            column: column.into(),
            values: keys.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn matches(&self, row: &RawRecord) -> bool {
        match self {
            Self::All => true,
            Self::Eq { column, value } => row.key_of(column).is_some_and(|k| &k == value),
            Self::AnyOf { column, values } => {
                row.key_of(column).is_some_and(|k| values.contains(&k))
            }
        }
    }
}
