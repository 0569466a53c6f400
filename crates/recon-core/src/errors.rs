//! Cross-cutting error types for ehi-recon.
//!
//! Errors that can originate from any crate working with the core value
//! model. Domain-specific errors (`ConfigError`, `SourceError`, `EngineError`)
//! are defined in their respective crates and converge in `recon-cli`.

use thiserror::Error;

/// Errors raised while interpreting export values as typed domain data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A column value could not be read as the identifier it is declared to hold.
    #[error("Invalid {kind} identifier in {table}.{column}: {value}")]
    InvalidIdentifier {
        kind: &'static str,
        table: String,
        column: String,
        value: String,
    },
}
