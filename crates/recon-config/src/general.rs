//! General projection settings.

use serde::{Deserialize, Serialize};

fn default_patient_table() -> String {
    "PATIENT".to_string()
}

fn default_patient_column() -> String {
    "PAT_ID".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Logical table holding one row per patient.
    #[serde(default = "default_patient_table")]
    pub patient_table: String,

    /// Patient identifier column, on the patient table and on every
    /// patient-scoped table and bridge table.
    #[serde(default = "default_patient_column")]
    pub patient_column: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            patient_table: default_patient_table(),
            patient_column: default_patient_column(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert_eq!(config.patient_table, "PATIENT");
        assert_eq!(config.patient_column, "PAT_ID");
    }
}
