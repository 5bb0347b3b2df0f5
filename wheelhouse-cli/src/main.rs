//! wheelhouse -- static pip index generator
//!
//! Parses the command line, initializes logging from `[general]` and
//! dispatches to a subcommand handler. Errors are printed to stderr and
//! mapped to an exit code by [`CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use wheelhouse_core::config::{GeneralConfig, WheelhouseConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 설정 에러는 각 명령이 보고하므로 여기서는 로깅 설정만 가져옴
    let general = WheelhouseConfig::load_or_default(&cli.config)
        .await
        .map(|config| config.general)
        .unwrap_or_else(|_| GeneralConfig::default());
    if let Err(e) = logging::init_tracing(&general, cli.log_level.as_deref()) {
        eprintln!("{} {e}", "warning:".yellow().bold());
    }

    wheelhouse_core::metrics::describe_all();
    tracing::debug!(config = %cli.config.display(), "wheelhouse starting");

    if let Err(e) = run(cli).await {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
        Commands::Parse(args) => commands::parse::execute(args, &writer),
    }
}
