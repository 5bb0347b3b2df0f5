//! `wheelhouse parse` command handler

use std::io::Write;

use serde::Serialize;

use wheelhouse_indexer::{ParsedArtifact, parse};

use crate::cli::ParseArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `parse` command.
///
/// Keys that are not artifacts are reported, not treated as errors.
pub fn execute(args: ParseArgs, writer: &OutputWriter) -> Result<(), CliError> {
    let report = ParseReport::new(args.keys);
    writer.render(&report)?;
    Ok(())
}

/// Parser results, in input order.
#[derive(Serialize)]
pub struct ParseReport {
    pub results: Vec<ParseResult>,
}

#[derive(Serialize)]
pub struct ParseResult {
    pub key: String,
    /// `None` when the key is skipped
    pub artifact: Option<ParsedArtifact>,
}

impl ParseReport {
    fn new(keys: Vec<String>) -> Self {
        let results = keys
            .into_iter()
            .map(|key| ParseResult {
                artifact: parse(&key),
                key,
            })
            .collect();
        Self { results }
    }
}

impl Render for ParseReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        for result in &self.results {
            match &result.artifact {
                Some(artifact) => writeln!(
                    w,
                    "{} {} -> {} {} ({})",
                    "ok".green().bold(),
                    result.key,
                    artifact.package_name.bold(),
                    artifact.version,
                    artifact.kind
                )?,
                None => writeln!(
                    w,
                    "{} {} (not a distribution artifact)",
                    "skip".yellow().bold(),
                    result.key
                )?,
            }
        }
        Ok(())
    }
}
