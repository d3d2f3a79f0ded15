//! Catalog assembler.
//!
//! Drives both entry passes over the scanned datasets, sorts the result and
//! wraps it in the document envelope, then writes `catalog.json` to disk.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use datacatalog_shared::{
    CATALOG_SCHEMA_VERSION, CatalogDocument, CatalogEntry, CatalogError, RebuildConfig, Result,
};

use crate::classify::is_year_month;
use crate::entry::EntryBuilder;
use crate::pipeline::ScanReporter;
use crate::scan::{DatasetIndex, DatasetKind};

/// How the datasets of one rebuild were classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Entries built from a sidecar.
    pub with_metadata: usize,
    /// Fallback entries for CSVs without a sidecar.
    pub fallback: usize,
    /// Sidecars that could not be read or parsed; their datasets are omitted.
    pub malformed_sidecars: usize,
    /// Sidecars without a companion CSV.
    pub orphaned_sidecars: usize,
}

/// A fully built catalog plus how it was put together.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub document: CatalogDocument,
    pub stats: RebuildStats,
}

/// Scan the data root and build the catalog in memory.
///
/// A dataset whose sidecar exists but cannot be parsed is left out entirely;
/// it is not demoted to a fallback entry.
#[instrument(skip_all, fields(data_dir = %config.data_dir.display()))]
pub fn build_catalog(config: &RebuildConfig, reporter: &dyn ScanReporter) -> Result<BuildOutcome> {
    reporter.phase("Scanning data directory");
    let index = DatasetIndex::scan(&config.data_dir)?;

    let builder = EntryBuilder::new(config.root_dir_name.clone());
    let (entries, stats) = build_entries(&index, &builder, reporter)?;

    let document = assemble(entries, Utc::now());
    reporter.done(&stats);

    info!(
        total = document.total_datasets,
        with_metadata = stats.with_metadata,
        fallback = stats.fallback,
        malformed = stats.malformed_sidecars,
        orphaned = stats.orphaned_sidecars,
        "catalog assembled"
    );

    Ok(BuildOutcome { document, stats })
}

/// Build entries for every dataset in the index.
///
/// Metadata-bearing datasets are handled first, then CSVs without a sidecar.
/// Recoverable sidecar errors are logged and counted; anything else aborts.
pub fn build_entries(
    index: &DatasetIndex,
    builder: &EntryBuilder,
    reporter: &dyn ScanReporter,
) -> Result<(Vec<CatalogEntry>, RebuildStats)> {
    let total = index.len();
    let mut stats = RebuildStats::default();
    let mut entries = Vec::with_capacity(total);

    reporter.phase("Reading metadata sidecars");
    for kind in index.iter() {
        match kind {
            DatasetKind::WithSidecar { csv, sidecar } => {
                match builder.with_metadata(csv, sidecar) {
                    Ok(entry) => {
                        stats.with_metadata += 1;
                        reporter.entry_built(&entry.csv_path, entries.len() + 1, total);
                        entries.push(entry);
                    }
                    Err(err) if err.is_recoverable() => {
                        warn!(%err, "dataset omitted from catalog");
                        reporter.sidecar_skipped(sidecar, &err.to_string());
                        stats.malformed_sidecars += 1;
                    }
                    Err(err) => return Err(err),
                }
            }
            DatasetKind::Orphan { sidecar } => {
                debug!(path = %sidecar.display(), "orphaned sidecar, no companion CSV");
                stats.orphaned_sidecars += 1;
            }
            DatasetKind::CsvOnly { .. } => {}
        }
    }

    reporter.phase("Adding datasets without metadata");
    for kind in index.iter() {
        if let DatasetKind::CsvOnly { csv } = kind {
            let entry = builder.fallback(csv);
            stats.fallback += 1;
            reporter.entry_built(&entry.csv_path, entries.len() + 1, total);
            entries.push(entry);
        }
    }

    Ok((entries, stats))
}

/// Sort entries by `csv_path` and wrap them in the document envelope.
pub fn assemble(mut entries: Vec<CatalogEntry>, generated_at: DateTime<Utc>) -> CatalogDocument {
    entries.sort_by(|a, b| a.csv_path.cmp(&b.csv_path));
    CatalogDocument {
        schema_version: CATALOG_SCHEMA_VERSION.into(),
        generated_at,
        total_datasets: entries.len(),
        datasets: entries,
    }
}

/// Serialize a catalog as pretty-printed JSON (2-space indent, UTF-8 kept as is).
pub fn render_catalog(document: &CatalogDocument) -> Result<String> {
    serde_json::to_string_pretty(document).map_err(|e| CatalogError::Serialize(e.to_string()))
}

/// Write the catalog to `path`, creating parent directories and replacing
/// any existing file.
///
/// The JSON goes to a temporary sibling first and is renamed into place, so
/// a failed write never leaves a truncated catalog behind.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_catalog(path: &Path, document: &CatalogDocument) -> Result<()> {
    let json = render_catalog(document)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CatalogError::config(format!("{} is not a file path", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, json).map_err(|e| CatalogError::io(&temp, e))?;
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(CatalogError::io(path, e));
    }

    debug!(datasets = document.total_datasets, "wrote catalog");
    Ok(())
}

/// Load a catalog document from disk.
pub fn read_catalog(path: &Path) -> Result<CatalogDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| CatalogError::validation(format!("invalid {}: {e}", path.display())))
}

/// Verify that a catalog document upholds its invariants.
pub fn validate_catalog(document: &CatalogDocument, root_dir_name: &str) -> Result<()> {
    if document.schema_version != CATALOG_SCHEMA_VERSION {
        return Err(CatalogError::validation(format!(
            "unsupported schema_version: {} (expected {})",
            document.schema_version, CATALOG_SCHEMA_VERSION
        )));
    }

    if document.total_datasets != document.datasets.len() {
        return Err(CatalogError::validation(format!(
            "total_datasets {} does not match {} entries",
            document.total_datasets,
            document.datasets.len()
        )));
    }

    for pair in document.datasets.windows(2) {
        if pair[0].csv_path >= pair[1].csv_path {
            return Err(CatalogError::validation(format!(
                "datasets not strictly ordered by csv_path: '{}' before '{}'",
                pair[0].csv_path, pair[1].csv_path
            )));
        }
    }

    for entry in &document.datasets {
        validate_entry(entry, root_dir_name)?;
    }

    Ok(())
}

fn validate_entry(entry: &CatalogEntry, root_dir_name: &str) -> Result<()> {
    if entry.source.import_type().is_none() {
        return Err(CatalogError::validation(format!(
            "{}: source.import_type is missing",
            entry.csv_path
        )));
    }

    if let Some(thematic) = &entry.thematic_name {
        if is_year_month(thematic) || thematic == root_dir_name {
            return Err(CatalogError::validation(format!(
                "{}: '{thematic}' is not a valid thematic_name",
                entry.csv_path
            )));
        }
    }

    if entry.has_metadata != entry.metadata_path.is_some() {
        return Err(CatalogError::validation(format!(
            "{}: has_metadata disagrees with metadata_path",
            entry.csv_path
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
