use recon_engine::{Diagnostics, PatientRecord};
use schemars::schema_for;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{SchemaArgs, SchemaTarget};
use crate::output::output;

/// Handle `recon schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let schema = match args.target {
        SchemaTarget::Record => schema_for!(PatientRecord),
        SchemaTarget::Diagnostics => schema_for!(Diagnostics),
    };
    output(&schema, flags.format, None)
}
