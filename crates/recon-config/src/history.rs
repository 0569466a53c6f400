//! History-fact timelines.

use serde::{Deserialize, Serialize};

fn default_own_csn_column() -> String {
    "PAT_ENC_CSN_ID".to_string()
}

fn default_date_column() -> String {
    "CONTACT_DATE".to_string()
}

/// One patient-level history fact captured per reviewing contact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistorySpec {
    /// Timeline name in the projected record, e.g. `social`.
    pub name: String,
    pub table: String,
    /// The snapshot's own contact.
    #[serde(default = "default_own_csn_column")]
    pub own_csn_column: String,
    /// Clinical contact the snapshot was reviewed during, if tracked.
    #[serde(default)]
    pub reviewed_csn_column: Option<String>,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default)]
    pub merged: bool,
}

impl HistorySpec {
    #[must_use]
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            own_csn_column: default_own_csn_column(),
            reviewed_csn_column: None,
            date_column: default_date_column(),
            merged: false,
        }
    }

    #[must_use]
    pub fn reviewed_in(mut self, column: impl Into<String>) -> Self {
        self.reviewed_csn_column = Some(column.into());
        self
    }
}
