//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// wheelhouse -- static pip index generator for object storage buckets.
///
/// Use `wheelhouse <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "wheelhouse", version, about, long_about = None)]
pub struct Cli {
    /// Path to the wheelhouse.toml configuration file.
    #[arg(short, long, global = true, default_value = "wheelhouse.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the bucket and publish the index pages.
    Build(BuildArgs),

    /// Manage configuration.
    Config(ConfigArgs),

    /// Show how object keys are parsed into package artifacts.
    Parse(ParseArgs),
}

// ---- build ----

/// Scan the bucket and publish the index pages.
///
/// Flags override values from the configuration file and environment.
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Bucket name (directory path for the local backend).
    #[arg(long)]
    pub bucket: Option<String>,

    /// Only index keys under this prefix.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Path inside the destination where the index tree is written.
    #[arg(long)]
    pub index_prefix: Option<String>,

    /// Make links absolute against this URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Write pages to this local directory instead of the bucket.
    #[arg(long)]
    pub local_dir: Option<PathBuf>,

    /// Compute everything but write nothing.
    #[arg(long, conflicts_with = "no_dry_run")]
    pub dry_run: bool,

    /// Actually write the pages.
    #[arg(long)]
    pub no_dry_run: bool,

    /// Link `<key>.sha256` sidecar digests.
    #[arg(long)]
    pub digests: bool,

    /// Also build one index per first-level directory.
    #[arg(long)]
    pub ref_indexes: bool,
}

// ---- config ----

/// Manage wheelhouse configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, storage, index, publish).
        #[arg(long)]
        section: Option<String>,
    },
}

// ---- parse ----

/// Parse object keys the way the indexer does.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Object keys or file names.
    #[arg(required = true)]
    pub keys: Vec<String>,
}
