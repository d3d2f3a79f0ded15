//! Path classification: derives a dataset's identity from where it lives.
//!
//! Given `data/2026-01/charts/foo.csv` the classifier yields the thematic
//! folder (`charts`), the year-month bucket (`2026-01`) and the filename.

use std::sync::LazyLock;

use regex::Regex;

use datacatalog_shared::DEFAULT_DATA_DIR;

/// Matches a `YYYY-MM` path segment.
static YEAR_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}$").expect("year-month regex"));

/// Identity derived from a dataset's `/`-separated path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathIdentity {
    pub thematic_name: Option<String>,
    pub year_month: Option<String>,
    pub filename: String,
}

/// Whether a path segment looks like a year-month bucket.
pub fn is_year_month(segment: &str) -> bool {
    YEAR_MONTH_RE.is_match(segment)
}

/// Classify a path using the conventional `data` root name.
pub fn classify(path: &str) -> PathIdentity {
    classify_with_root(path, DEFAULT_DATA_DIR)
}

/// Classify a path, never treating `root_dir_name` as a thematic folder.
pub fn classify_with_root(path: &str, root_dir_name: &str) -> PathIdentity {
    let parts: Vec<&str> = path.split('/').collect();
    let filename = parts.last().copied().unwrap_or_default().to_string();

    let year_month = parts
        .iter()
        .find(|part| is_year_month(part))
        .map(|part| part.to_string());

    let thematic_name = match parts.as_slice() {
        [.., parent, _] if !is_year_month(parent) && *parent != root_dir_name => {
            Some(parent.to_string())
        }
        _ => None,
    };

    PathIdentity {
        thematic_name,
        year_month,
        filename,
    }
}
