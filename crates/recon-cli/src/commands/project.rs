use anyhow::Context;
use recon_engine::{ReconContext, RecordProjector};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ProjectArgs;
use crate::commands::shared;
use crate::output::output;

/// Handle `recon project`.
pub fn handle(args: &ProjectArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = shared::load_config(flags)?;
    let dataset = shared::load_export(&args.export)?;
    let patient = shared::resolve_patient(args.patient.as_deref(), &dataset, &config)?;

    let mut ctx = ReconContext::new(&dataset);
    let projector = RecordProjector::new(&config, &mut ctx)
        .context("configuration does not fit this export")?;
    let projection = projector
        .project(&mut ctx, &patient)
        .with_context(|| format!("failed to project patient {patient}"))?;

    if !projection.diagnostics.is_clean() {
        let diag = &projection.diagnostics;
        tracing::warn!(
            missing_tables = diag.missing_tables.len(),
            unfiltered_reads = diag.unfiltered_reads.len(),
            orphaned_order_links = diag.orphaned_order_links,
            "projection degraded; rerun with --diagnostics for details"
        );
    }

    let path = args.output.as_deref();
    if args.diagnostics {
        output(&projection, flags.format, path)
    } else {
        output(&projection.record, flags.format, path)
    }
}
