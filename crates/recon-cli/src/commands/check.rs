use anyhow::Context;
use recon_engine::{JoinPlans, ReconContext, RecordProjector};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CheckArgs;
use crate::commands::shared;
use crate::output::output;

/// What `recon check` reports about an export.
#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    tables: usize,
    rows: usize,
    missing_tables: Vec<&'a str>,
    plans: &'a JoinPlans,
}

/// Handle `recon check`.
pub fn handle(args: &CheckArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = shared::load_config(flags)?;
    let dataset = shared::load_export(&args.export)?;

    let mut ctx = ReconContext::new(&dataset);
    let projector = RecordProjector::new(&config, &mut ctx)
        .context("configuration does not fit this export")?;
    let missing_tables = config
        .referenced_tables()
        .into_iter()
        .filter(|table| !ctx.exists(table))
        .collect();

    let report = CheckReport {
        tables: dataset.len(),
        rows: dataset.row_count(),
        missing_tables,
        plans: projector.plans(),
    };
    output(&report, flags.format, None)
}
