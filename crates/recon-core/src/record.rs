//! Table-tagged raw rows.
//!
//! A `RawRecord` is an export row that the engine passes through without a
//! bespoke struct. It keeps the table it came from as a tag, its cells in a
//! key-sorted map, and any structural children attached to it under
//! declared attachment keys.
//!
//! Serialization emits the cells followed by the attachments; both maps are
//! ordered, so the same row always serializes to the same bytes. The tag is
//! not serialized.

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::Serialize;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::value::Scalar;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    #[serde(skip)]
    table: String,
    #[serde(flatten)]
    fields: BTreeMap<String, Scalar>,
    #[serde(flatten)]
    attachments: BTreeMap<String, Vec<RawRecord>>,
}

impl RawRecord {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: BTreeMap::new(),
            attachments: BTreeMap::new(),
        }
    }

    /// Build a record from already-collected cells.
    #[must_use]
    pub fn from_fields(table: impl Into<String>, fields: BTreeMap<String, Scalar>) -> Self {
        Self {
            table: table.into(),
            fields,
            attachments: BTreeMap::new(),
        }
    }

    /// Builder-style cell setter, mostly for fixtures.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Re-tag the row, e.g. when a physical split row becomes part of a
    /// logical row.
    #[must_use]
    pub fn retagged(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.fields.get(column)
    }

    /// Canonical join key of `column`, if the cell is present and non-blank.
    #[must_use]
    pub fn key_of(&self, column: &str) -> Option<String> {
        self.fields.get(column).and_then(Scalar::key)
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, Scalar> {
        &self.fields
    }

    /// Insert a cell only if the column is not already present.
    ///
    /// Returns `true` when the value was stored. Used when columns from
    /// several physical tables fold into one logical row (first occurrence
    /// wins) and when resolved display names are added next to raw cells.
    pub fn insert_if_absent(&mut self, column: &str, value: Scalar) -> bool {
        if self.fields.contains_key(column) {
            return false;
        }
        self.fields.insert(column.to_string(), value);
        true
    }

    /// Rows attached under `key`, if anything was ever attached there.
    #[must_use]
    pub fn attached(&self, key: &str) -> Option<&[Self]> {
        self.attachments.get(key).map(Vec::as_slice)
    }

    #[must_use]
    pub const fn attachments(&self) -> &BTreeMap<String, Vec<Self>> {
        &self.attachments
    }

    /// Set the attachment at `key`, replacing any previous rows.
    pub fn set_attached(&mut self, key: impl Into<String>, rows: Vec<Self>) {
        self.attachments.insert(key.into(), rows);
    }

    /// Every attached row, mutably, across all attachment keys.
    pub fn attached_rows_mut(&mut self) -> impl Iterator<Item = &mut Self> {
        self.attachments.values_mut().flatten()
    }

    /// Compare two rows cell by cell in column order. Attachments are not
    /// compared. Gives rows a stable order that does not depend on the order
    /// the export happened to list them in.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        let mut left = self.fields.iter();
        let mut right = other.fields.iter();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some((lc, lv)), Some((rc, rv))) => {
                    let ord = lc.cmp(rc).then_with(|| lv.canonical_cmp(rv));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }

    /// Append rows to the attachment at `key`, creating it if needed.
    pub fn extend_attached(&mut self, key: &str, rows: impl IntoIterator<Item = Self>) {
        self.attachments
            .entry(key.to_string())
            .or_default()
            .extend(rows);
    }
}

// Cells and attachments share one JSON object, so the schema is a single map
// whose values are either a scalar or a list of nested records.
impl JsonSchema for RawRecord {
    fn schema_name() -> Cow<'static, str> {
        "RawRecord".into()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        let scalar = generator.subschema_for::<Scalar>();
        let children = generator.subschema_for::<Vec<Self>>();
        json_schema!({
            "type": "object",
            "additionalProperties": { "anyOf": [scalar, children] }
        })
    }
}
