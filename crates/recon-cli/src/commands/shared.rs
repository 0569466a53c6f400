use std::collections::BTreeSet;

use anyhow::{Context, bail};
use recon_config::ReconConfig;
use recon_core::PatientId;
use recon_source::{Dataset, RowFilter, TableSource, TsvLoader};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExportArgs;

/// Layered configuration, with `--config` on top when given.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<ReconConfig> {
    let config = match &flags.config {
        Some(path) => ReconConfig::load_from(path),
        None => ReconConfig::load_with_dotenv(),
    };
    config.context("failed to load recon configuration")
}

pub fn load_export(args: &ExportArgs) -> anyhow::Result<Dataset> {
    let mut loader = TsvLoader::new(&args.data);
    if let Some(schemas) = &args.schemas {
        loader = loader.with_schemas(schemas);
    }
    let dataset = loader
        .load()
        .with_context(|| format!("failed to load export from {}", args.data.display()))?;
    tracing::info!(
        tables = dataset.len(),
        rows = dataset.row_count(),
        "export loaded"
    );
    Ok(dataset)
}

/// The explicit patient, or the only patient the export contains.
pub fn resolve_patient(
    explicit: Option<&str>,
    dataset: &Dataset,
    config: &ReconConfig,
) -> anyhow::Result<PatientId> {
    if let Some(id) = explicit {
        return Ok(PatientId::new(id));
    }
    let general = &config.general;
    if !dataset.has_table(&general.patient_table) {
        bail!(
            "no --patient given and the export has no {} table to infer one from",
            general.patient_table
        );
    }
    let ids: BTreeSet<String> = dataset
        .scan(&general.patient_table, &RowFilter::All)
        .iter()
        .filter_map(|row| row.key_of(&general.patient_column))
        .collect();
    let mut ids = ids.into_iter();
    match (ids.next(), ids.next()) {
        (Some(id), None) => Ok(PatientId::new(id)),
        (None, _) => bail!("{} holds no patient ids", general.patient_table),
        (Some(_), Some(_)) => bail!(
            "{} holds several patients; pass --patient",
            general.patient_table
        ),
    }
}
