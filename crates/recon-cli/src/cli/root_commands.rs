use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Project one patient's record out of an export.
    Project(ProjectArgs),
    /// Resolve join plans and report missing tables without projecting.
    Check(CheckArgs),
    /// Print the JSON Schema of the output.
    Schema(SchemaArgs),
}

/// Where the export lives on disk.
#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    /// Directory of `<TABLE>.tsv` files
    #[arg(short, long)]
    pub data: PathBuf,

    /// Directory of `<TABLE>.json` schema documents (optional)
    #[arg(short, long)]
    pub schemas: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub export: ExportArgs,

    /// Patient id; defaults to the only patient in the export
    #[arg(long)]
    pub patient: Option<String>,

    /// Emit the record together with its diagnostics
    #[arg(long)]
    pub diagnostics: bool,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub export: ExportArgs,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SchemaTarget {
    Record,
    Diagnostics,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Which document to describe
    #[arg(default_value = "record")]
    pub target: SchemaTarget,
}
