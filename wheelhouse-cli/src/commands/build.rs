//! `wheelhouse build` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use wheelhouse_core::config::WheelhouseConfig;
use wheelhouse_core::error::{IndexError, WheelhouseError};
use wheelhouse_indexer::{
    IndexerConfig, IndexerConfigBuilder, ObjectStoreBackend, PublishOutcome, RunSummary,
    WheelIndexer,
};

use crate::cli::BuildArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `build` command.
///
/// # Errors
///
/// - `CliError::Core(Config)` for invalid configuration (exit code 2)
/// - `CliError::Core(Index(ScanFailed))` when listing fails (exit code 1)
/// - `CliError::Core(Index(PublishIncomplete))` when some pages failed (exit code 5)
pub async fn execute(
    args: BuildArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let core = WheelhouseConfig::load_or_default(config_path).await?;
    let config = indexer_config(&core, &args)?;

    if config.local_dir.is_some() && config.base_url.is_none() {
        warn!("writing to a local directory with relative links; they only resolve inside the bucket layout (set --base-url for a browsable preview)");
    }

    info!(
        bucket = %config.bucket,
        prefix = %config.prefix,
        dry_run = config.dry_run,
        "building index"
    );

    let bucket = config.bucket.clone();
    let prefix = config.prefix.clone();
    let source = Arc::new(ObjectStoreBackend::open_source(&config)?);
    let summary = match ObjectStoreBackend::open_local_destination(&config) {
        Some(destination) => {
            WheelIndexer::new(config, source, Arc::new(destination))?
                .run()
                .await?
        }
        None => WheelIndexer::with_storage(config, source)?.run().await?,
    };

    let report = BuildReport {
        bucket,
        prefix,
        summary,
    };
    writer.render(&report)?;

    if !report.summary.is_success() {
        return Err(WheelhouseError::Index(IndexError::PublishIncomplete {
            failed: report.summary.report.failed_count(),
            total: report.summary.report.total(),
        })
        .into());
    }

    Ok(())
}

/// Merge command-line flags over the file/env configuration.
fn indexer_config(core: &WheelhouseConfig, args: &BuildArgs) -> Result<IndexerConfig, CliError> {
    let mut builder = IndexerConfigBuilder::from_config(IndexerConfig::from_core(core));

    if let Some(bucket) = &args.bucket {
        builder = builder.bucket(bucket.as_str());
    }
    if let Some(prefix) = &args.prefix {
        builder = builder.prefix(prefix.as_str());
    }
    if let Some(index_prefix) = &args.index_prefix {
        builder = builder.index_prefix(index_prefix.as_str());
    }
    if let Some(base_url) = &args.base_url {
        builder = builder.base_url(base_url.as_str());
    }
    if let Some(local_dir) = &args.local_dir {
        builder = builder.local_dir(local_dir.as_path());
    }
    if args.dry_run {
        builder = builder.dry_run(true);
    } else if args.no_dry_run {
        builder = builder.dry_run(false);
    }
    if args.digests {
        builder = builder.with_digests(true);
    }
    if args.ref_indexes {
        builder = builder.ref_indexes(true);
    }

    Ok(builder.build()?)
}

/// Result of one `build` run.
#[derive(Serialize)]
pub struct BuildReport {
    /// Scanned bucket
    pub bucket: String,
    /// Scan prefix
    pub prefix: String,
    #[serde(flatten)]
    pub summary: RunSummary,
}

impl Render for BuildReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let summary = &self.summary;
        let report = &summary.report;

        let scope = if self.prefix.is_empty() {
            self.bucket.clone()
        } else {
            format!("{} (prefix: {})", self.bucket, self.prefix)
        };
        writeln!(w, "Index build: {}", scope.bold())?;
        if report.dry_run {
            writeln!(w, "  Destination: {} {}", report.destination, "[DRY RUN]".yellow().bold())?;
        } else {
            writeln!(w, "  Destination: {}", report.destination)?;
        }
        writeln!(w, "  Run ID: {}", report.run_id)?;
        writeln!(w, "  Packages: {}", summary.packages)?;
        writeln!(w, "  Artifacts: {}", summary.artifacts)?;
        writeln!(
            w,
            "  Pages: {} ({} bytes)",
            summary.pages,
            report.total_bytes()
        )?;
        if let Some(digests) = &summary.digests {
            writeln!(
                w,
                "  Digests: {} attached, {} missing, {} invalid",
                digests.attached, digests.missing, digests.invalid
            )?;
        }
        if !summary.skipped_refs.is_empty() {
            writeln!(
                w,
                "  Skipped refs: {}",
                summary.skipped_refs.join(", ").yellow()
            )?;
        }
        writeln!(w, "  Elapsed: {}ms", summary.elapsed.as_millis())?;
        writeln!(w)?;

        if report.dry_run {
            writeln!(w, "Would write {} pages:", report.skipped().count())?;
            for entry in report.skipped() {
                writeln!(w, "  {} ({} bytes)", entry.path, entry.bytes)?;
            }
            return Ok(());
        }

        writeln!(
            w,
            "Written: {}",
            report.written().count().to_string().green().bold()
        )?;
        if !report.is_success() {
            writeln!(
                w,
                "Failed: {}",
                report.failed_count().to_string().red().bold()
            )?;
            for entry in report.failed() {
                if let PublishOutcome::Failed { reason } = &entry.outcome {
                    writeln!(w, "  {} {}", entry.path.red(), reason)?;
                }
            }
        }

        Ok(())
    }
}
