//! Relationship specs.
//!
//! How a table relates to the rest of the record is decided ahead of time by
//! a reviewer and written down here, in one of three disjoint shapes:
//!
//! - structural children (`patient`, `encounter`, and the order lists in
//!   [`crate::OrderConfig`]): rows owned by and nested under a parent;
//! - cross-references: rows with their own identity that point at a
//!   clinical contact, kept flat and resolved through an index;
//! - provenance stamps: a "last touched during contact X" column on a
//!   patient-level row, stored as a plain field.
//!
//! The engine never guesses which shape a table has.

use serde::{Deserialize, Serialize};

/// Patient-to-entity bridge for patient-level tables with no patient column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BridgeSpec {
    /// Bridge table holding (patient, entity key) pairs, e.g. `PAT_ALLERGIES`.
    pub table: String,
    /// Entity key column on the bridge table.
    pub key_column: String,
    /// Matching key column on the entity table. Defaults to `key_column`.
    #[serde(default)]
    pub entity_column: Option<String>,
}

impl BridgeSpec {
    #[must_use]
    pub fn entity_column(&self) -> &str {
        self.entity_column.as_deref().unwrap_or(&self.key_column)
    }
}

/// How a child table attaches to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChildSpec {
    /// Child table (logical name when `merged`).
    pub table: String,
    /// Foreign-key column on the child holding the parent's key.
    pub foreign_key: String,
    /// Synonymous key column tried only when `foreign_key` resolves no rows.
    #[serde(default)]
    pub alternate_key: Option<String>,
    /// Key the attached rows are stored under on the parent.
    pub key: String,
    /// Whether child rows are split across physical tables.
    #[serde(default)]
    pub merged: bool,
    /// Bridge used when the child has no `foreign_key` column. Patient-level
    /// entities only.
    #[serde(default)]
    pub bridge: Option<BridgeSpec>,
}

impl ChildSpec {
    #[must_use]
    pub fn new(table: impl Into<String>, foreign_key: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            foreign_key: foreign_key.into(),
            alternate_key: None,
            key: key.into(),
            merged: false,
            bridge: None,
        }
    }

    #[must_use]
    pub fn merged(mut self) -> Self {
        self.merged = true;
        self
    }

    #[must_use]
    pub fn with_alternate_key(mut self, column: impl Into<String>) -> Self {
        self.alternate_key = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_bridge(mut self, bridge: BridgeSpec) -> Self {
        self.bridge = Some(bridge);
        self
    }
}

/// A patient-level entity column that points at a clinical contact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CrossRefSpec {
    pub table: String,
    pub column: String,
}

/// A patient-level entity column recording the contact that last touched
/// the row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProvenanceSpec {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RelationshipConfig {
    /// Patient-level entity tables, projected as flat lists.
    #[serde(default)]
    pub patient: Vec<ChildSpec>,
    /// Structural children of an encounter, keyed by the encounter's CSN.
    #[serde(default)]
    pub encounter: Vec<ChildSpec>,
    #[serde(default)]
    pub cross_references: Vec<CrossRefSpec>,
    #[serde(default)]
    pub provenance: Vec<ProvenanceSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_entity_column_defaults_to_key_column() {
        let bridge = BridgeSpec {
            table: "PAT_PROBLEM_LIST".into(),
            key_column: "PROBLEM_LIST_ID".into(),
            entity_column: None,
        };
        assert_eq!(bridge.entity_column(), "PROBLEM_LIST_ID");

        let renamed = BridgeSpec {
            entity_column: Some("ALLERGY_ID".into()),
            ..bridge
        };
        assert_eq!(renamed.entity_column(), "ALLERGY_ID");
    }

    #[test]
    fn builder_sets_flags() {
        let spec = ChildSpec::new("ORDER_RESULTS", "ORDER_PROC_ID", "results")
            .with_alternate_key("ORDER_ID")
            .merged();
        assert!(spec.merged);
        assert_eq!(spec.alternate_key.as_deref(), Some("ORDER_ID"));
        assert!(spec.bridge.is_none());
    }
}
