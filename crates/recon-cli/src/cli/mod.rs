use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `recon` binary.
#[derive(Debug, Parser)]
#[command(
    name = "recon",
    version,
    about = "Rebuild a hierarchical patient record from a flat EHI export"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file layered above the user and project files
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            config: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::root_commands::SchemaTarget;
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn project_parses_export_and_patient() {
        let cli = Cli::try_parse_from([
            "recon",
            "--verbose",
            "project",
            "--data",
            "/tmp/tsv",
            "--schemas",
            "/tmp/schemas",
            "--patient",
            "Z7004242",
            "--diagnostics",
        ])
        .expect("cli should parse");

        assert!(cli.verbose);
        let Commands::Project(args) = cli.command else {
            panic!("expected project");
        };
        assert_eq!(args.export.data.to_str(), Some("/tmp/tsv"));
        assert_eq!(
            args.export.schemas.as_deref().and_then(|p| p.to_str()),
            Some("/tmp/schemas")
        );
        assert_eq!(args.patient.as_deref(), Some("Z7004242"));
        assert!(args.diagnostics);
        assert!(args.output.is_none());
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "recon", "check", "--data", "/tmp/tsv", "--format", "raw", "--quiet",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Check(_)));
    }

    #[test]
    fn project_requires_data_dir() {
        assert!(Cli::try_parse_from(["recon", "project", "--patient", "Z1"]).is_err());
    }

    #[test]
    fn schema_target_defaults_to_record() {
        let cli = Cli::try_parse_from(["recon", "schema"]).expect("cli should parse");
        let Commands::Schema(args) = cli.command else {
            panic!("expected schema");
        };
        assert_eq!(args.target, SchemaTarget::Record);

        let cli = Cli::try_parse_from(["recon", "schema", "diagnostics"]).expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Schema(args) if args.target == SchemaTarget::Diagnostics
        ));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        assert!(Cli::try_parse_from(["recon", "--format", "xml", "schema"]).is_err());
    }

    #[test]
    fn global_flags_extraction_copies_values() {
        let cli = Cli::try_parse_from(["recon", "--config", "/tmp/recon.toml", "schema"])
            .expect("cli should parse");
        let flags = cli.global_flags();
        assert_eq!(
            flags.config.as_deref().and_then(|p| p.to_str()),
            Some("/tmp/recon.toml")
        );
    }
}
