//! Identifier newtypes.
//!
//! Orders and order-link rows share one numeric space in the export, and a
//! contact serial number looks like any other integer. Each identity gets its
//! own type so that an order's id cannot be confused with a link row's key or
//! with a CSN.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CoreError;
use crate::record::RawRecord;

/// Identifier of the patient whose record is being projected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contact serial number: the unique id of one recorded interaction.
///
/// Which contact a CSN column denotes (the row's own contact, its owning
/// contact, a provenance stamp, or a cross-reference) is decided by the table
/// it sits on, never by the column name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct Csn(i64);

impl Csn {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Read a CSN from `row.column`. Null or blank cells yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidIdentifier` if the cell holds a non-numeric value.
    pub fn from_row(row: &RawRecord, column: &str) -> Result<Option<Self>, CoreError> {
        read_numeric(row, column, "CSN").map(|v| v.map(Self))
    }
}

impl fmt::Display for Csn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an order as it appears on the order table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// # Errors
    ///
    /// Returns `CoreError::InvalidIdentifier` if the cell holds a non-numeric value.
    pub fn from_row(row: &RawRecord, column: &str) -> Result<Option<Self>, CoreError> {
        read_numeric(row, column, "order").map(|v| v.map(Self))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of a row on the parent/child order link table.
///
/// Numerically this is the child order's id, but it identifies the link row.
/// Use [`LinkRowId::child_order`] to cross into order identity deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkRowId(i64);

impl LinkRowId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// The order this link row points down to.
    #[must_use]
    pub const fn child_order(self) -> OrderId {
        OrderId(self.0)
    }

    /// # Errors
    ///
    /// Returns `CoreError::InvalidIdentifier` if the cell holds a non-numeric value.
    pub fn from_row(row: &RawRecord, column: &str) -> Result<Option<Self>, CoreError> {
        read_numeric(row, column, "order link").map(|v| v.map(Self))
    }
}

impl fmt::Display for LinkRowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn read_numeric(
    row: &RawRecord,
    column: &str,
    kind: &'static str,
) -> Result<Option<i64>, CoreError> {
    let Some(value) = row.get(column) else {
        return Ok(None);
    };
    let Some(key) = value.key() else {
        return Ok(None);
    };
    value
        .as_i64()
        .map(Some)
        .ok_or_else(|| CoreError::InvalidIdentifier {
            kind,
            table: row.table().to_string(),
            column: column.to_string(),
            value: key,
        })
}
