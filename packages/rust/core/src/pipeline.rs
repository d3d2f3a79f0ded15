//! End-to-end `rebuild` pipeline: data root → scan → entries → catalog file.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument};

use datacatalog_shared::{CatalogDocument, RebuildConfig, Result};

use crate::assembler::{self, RebuildStats};

/// Result of the `rebuild` pipeline.
#[derive(Debug)]
pub struct RebuildResult {
    /// Where the catalog was written.
    pub output_path: PathBuf,
    /// The document that was written.
    pub document: CatalogDocument,
    /// How the datasets were classified.
    pub stats: RebuildStats,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting rebuild status.
pub trait ScanReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each catalog entry is built.
    fn entry_built(&self, csv_path: &str, current: usize, total: usize);
    /// Called when a sidecar is dropped because it could not be used.
    fn sidecar_skipped(&self, path: &Path, reason: &str);
    /// Called when the catalog has been assembled.
    fn done(&self, stats: &RebuildStats);
}

/// No-op reporter for headless/test usage.
pub struct SilentReporter;

impl ScanReporter for SilentReporter {
    fn phase(&self, _name: &str) {}
    fn entry_built(&self, _csv_path: &str, _current: usize, _total: usize) {}
    fn sidecar_skipped(&self, _path: &Path, _reason: &str) {}
    fn done(&self, _stats: &RebuildStats) {}
}

/// Run the full rebuild.
///
/// 1. Validate the configuration
/// 2. Scan the data root and build every entry in memory
/// 3. Write the catalog, replacing any previous file
///
/// Nothing is written unless the whole document was built.
#[instrument(skip_all, fields(data_dir = %config.data_dir.display()))]
pub fn rebuild(config: &RebuildConfig, reporter: &dyn ScanReporter) -> Result<RebuildResult> {
    let start = Instant::now();
    config.validate()?;

    let outcome = assembler::build_catalog(config, reporter)?;

    reporter.phase("Writing catalog");
    assembler::write_catalog(&config.output_path, &outcome.document)?;

    info!(
        total = outcome.document.total_datasets,
        output = %config.output_path.display(),
        "catalog rebuilt"
    );

    Ok(RebuildResult {
        output_path: config.output_path.clone(),
        document: outcome.document,
        stats: outcome.stats,
        elapsed: start.elapsed(),
    })
}
