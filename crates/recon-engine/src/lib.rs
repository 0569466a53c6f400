//! # recon-engine
//!
//! Rebuilds one patient's hierarchical record from a flat export.
//!
//! The pipeline runs bottom-up over a [`ReconContext`]:
//!
//! 1. **Schema probe**: which tables exist and with which columns.
//! 2. **Split merger** ([`JoinPlans`]): wide logical tables rebuilt from
//!    their physical splits using the configured join columns.
//! 3. **Lookups** and **attachment**: display names for coded ids, and
//!    structural children nested under their parents.
//! 4. **Order chains** ([`OrderLinks`]): results of child orders appended
//!    to the parent order that caused them.
//! 5. **Timelines**: patient-level history snapshots in chronological order.
//! 6. **Projector** ([`RecordProjector`]): drives the above and freezes the
//!    result into a [`PatientRecord`].
//!
//! ```no_run
//! use recon_config::ReconConfig;
//! use recon_core::PatientId;
//! use recon_engine::{ReconContext, RecordProjector};
//! use recon_source::TsvLoader;
//!
//! let config = ReconConfig::load().expect("config");
//! let dataset = TsvLoader::new("export/tsv").load().expect("export");
//! let mut ctx = ReconContext::new(&dataset);
//! let projector = RecordProjector::new(&config, &mut ctx).expect("join plans");
//! let projection = projector
//!     .project(&mut ctx, &PatientId::new("Z7004242"))
//!     .expect("projection");
//! println!("{}", serde_json::to_string_pretty(&projection.record).unwrap());
//! ```

pub mod attach;
pub mod chain;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod history;
pub mod lookup;
pub mod merge;
pub mod projector;
pub mod record;

pub use chain::OrderLinks;
pub use context::{ReconContext, SchemaProbe};
pub use diagnostics::Diagnostics;
pub use error::EngineError;
pub use lookup::LookupCache;
pub use merge::{JoinPlan, JoinPlans, MemberJoin};
pub use projector::RecordProjector;
pub use record::{Encounter, PatientRecord, Projection, RecordBuilder};
