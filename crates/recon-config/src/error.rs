//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// A table was given two relationship roles.
    #[error("Table '{table}' is classified as both {first} and {second}")]
    ConflictingClassification {
        table: String,
        first: String,
        second: String,
    },

    /// A configuration entry refers to something that is not declared.
    #[error("Unknown {kind} '{name}' referenced from {from}")]
    UnknownReference {
        kind: &'static str,
        name: String,
        from: String,
    },

    /// Two entries share a name that must be unique.
    #[error("Duplicate {kind} '{name}'")]
    DuplicateEntry { kind: &'static str, name: String },

    /// A configuration field has an invalid value.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
