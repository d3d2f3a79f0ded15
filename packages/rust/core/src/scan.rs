//! Dataset discovery under the data root.
//!
//! A single recursive walk pairs every `<name>.csv` with its optional
//! `<name>.meta.json` sidecar in the same directory. The pairing is keyed by
//! `(directory, name)`, so each dataset is classified exactly once:
//!
//! | csv | sidecar | kind                         |
//! |-----|---------|------------------------------|
//! | yes | yes     | [`DatasetKind::WithSidecar`] |
//! | yes | no      | [`DatasetKind::CsvOnly`]     |
//! | no  | yes     | [`DatasetKind::Orphan`]      |

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use datacatalog_shared::{CatalogError, Result};

/// Extension of dataset files.
pub const CSV_EXTENSION: &str = ".csv";

/// Suffix of metadata sidecar files.
pub const SIDECAR_SUFFIX: &str = ".meta.json";

/// Pairing key: parent directory and basename without suffix.
///
/// Kept as two parts because joining them into one `PathBuf` would make
/// `x/..csv` (stem `.`) compare equal to `x.csv`.
type DatasetKey = (PathBuf, String);

/// What a discovered file contributes to its dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileRole {
    Csv,
    Sidecar,
}

/// The files found for one dataset key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetFiles {
    pub csv: Option<PathBuf>,
    pub sidecar: Option<PathBuf>,
}

/// How a dataset key must be turned into a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind<'a> {
    /// CSV with a sidecar next to it: build from metadata.
    WithSidecar { csv: &'a Path, sidecar: &'a Path },
    /// CSV without a sidecar: build a fallback entry.
    CsvOnly { csv: &'a Path },
    /// Sidecar whose CSV does not exist: dropped.
    Orphan { sidecar: &'a Path },
}

impl DatasetFiles {
    pub fn kind(&self) -> Option<DatasetKind<'_>> {
        match (self.csv.as_deref(), self.sidecar.as_deref()) {
            (Some(csv), Some(sidecar)) => Some(DatasetKind::WithSidecar { csv, sidecar }),
            (Some(csv), None) => Some(DatasetKind::CsvOnly { csv }),
            (None, Some(sidecar)) => Some(DatasetKind::Orphan { sidecar }),
            (None, None) => None,
        }
    }
}

/// Every dataset under a data root, keyed by directory + basename.
#[derive(Debug, Clone, Default)]
pub struct DatasetIndex {
    by_key: BTreeMap<DatasetKey, DatasetFiles>,
}

impl DatasetIndex {
    /// Walk `root` recursively and pair CSV files with their sidecars.
    ///
    /// A missing root yields an empty index. Symlinks are not followed.
    /// Unreadable entries below the root are skipped with a warning; failing
    /// to read the root itself is an error.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn scan(root: &Path) -> Result<Self> {
        if !root.exists() {
            warn!("data root does not exist, catalog will be empty");
            return Ok(Self::default());
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(CatalogError::Walk(format!("walking {}: {e}", root.display())));
                }
                Err(e) => {
                    warn!(
                        path = %e.path().unwrap_or(root).display(),
                        error = %e,
                        "skipping unreadable entry"
                    );
                    continue;
                }
            };
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }

        let index = Self::from_paths(paths);
        debug!(datasets = index.len(), "scan complete");
        Ok(index)
    }

    /// Build an index from already-discovered file paths.
    ///
    /// Paths that are neither CSV files nor sidecars are ignored.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut by_key: BTreeMap<DatasetKey, DatasetFiles> = BTreeMap::new();
        for path in paths {
            let Some((key, role)) = dataset_key(&path) else {
                continue;
            };
            let files = by_key.entry(key).or_default();
            match role {
                FileRole::Csv => files.csv = Some(path),
                FileRole::Sidecar => files.sidecar = Some(path),
            }
        }
        Self { by_key }
    }

    /// Number of dataset keys (including orphaned sidecars).
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Datasets in key order.
    pub fn iter(&self) -> impl Iterator<Item = DatasetKind<'_>> {
        self.by_key.values().filter_map(DatasetFiles::kind)
    }
}

/// Derive the pairing key and role of a file, if it takes part in the catalog.
fn dataset_key(path: &Path) -> Option<(DatasetKey, FileRole)> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        debug!(path = %path.display(), "skipping non UTF-8 file name");
        return None;
    };

    // Check the longer suffix first: `x.meta.json` must never count as data.
    let (stem, role) = if let Some(stem) = name.strip_suffix(SIDECAR_SUFFIX) {
        (stem, FileRole::Sidecar)
    } else if let Some(stem) = name.strip_suffix(CSV_EXTENSION) {
        (stem, FileRole::Csv)
    } else {
        return None;
    };

    let parent = path.parent().unwrap_or(Path::new("")).to_path_buf();
    Some(((parent, stem.to_string()), role))
}

/// Render a path with `/` separators, dropping `.` components.
pub fn to_posix(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::RootDir => out.push('/'),
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    if out.is_empty() { ".".into() } else { out }
}
