//! # recon-core
//!
//! Foundational types for reconstructing a hierarchical patient record from a
//! flat clinical export.
//!
//! This crate provides the types shared across all ehi-recon crates:
//! - `Scalar`, the cell value of an export row, and its canonical join key
//! - `RawRecord`, the table-tagged row that flows opaquely through the engine
//! - Identifier newtypes (`PatientId`, `Csn`, `OrderId`, `LinkRowId`)
//! - Contact-date parsing for the export's date formats
//! - `HistorySnapshot` / `HistoryTimeline`, the versioned "as-of" view of
//!   patient-level facts
//! - Cross-cutting error types

pub mod dates;
pub mod errors;
pub mod ids;
pub mod record;
pub mod timeline;
pub mod value;

pub use errors::CoreError;
pub use ids::{Csn, LinkRowId, OrderId, PatientId};
pub use record::RawRecord;
pub use timeline::{HistorySnapshot, HistoryTimeline};
pub use value::Scalar;
