//! Engine error types.

use recon_config::ConfigError;
use thiserror::Error;

/// Errors that abort a projection run.
///
/// Missing tables and unresolved references are not errors; they are
/// counted in [`crate::Diagnostics`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// A manifest join column does not exist on the side it must join from
    /// and no declared fallback resolves it.
    #[error("Ambiguous join column for {logical}: {table}.{column} does not exist")]
    AmbiguousJoinColumn {
        logical: String,
        table: String,
        column: String,
    },

    /// A lookup points at a column its table does not have.
    #[error("Lookup '{lookup}' reads {table}.{column}, which does not exist")]
    LookupColumn {
        lookup: String,
        table: String,
        column: String,
    },

    /// The patient table is present but holds no row for the patient.
    #[error("Patient {patient} not found in {table}.{column}")]
    PatientNotFound {
        patient: String,
        table: String,
        column: String,
    },

    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
