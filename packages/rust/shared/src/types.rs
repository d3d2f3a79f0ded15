//! Core domain types for the dataset catalog.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Schema version written into every catalog document.
pub const CATALOG_SCHEMA_VERSION: &str = "1.0";

/// Placeholder used for unknown source names and licenses.
pub const UNKNOWN: &str = "Unknown";

/// `source.import_type` injected when a sidecar does not provide one.
pub const DEFAULT_IMPORT_TYPE: &str = "csv";

// ---------------------------------------------------------------------------
// CatalogDocument
// ---------------------------------------------------------------------------

/// The `catalog.json` document: envelope plus every discovered dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Always [`CATALOG_SCHEMA_VERSION`].
    pub schema_version: String,
    /// When the catalog was built (UTC).
    pub generated_at: DateTime<Utc>,
    /// Number of entries in `datasets`.
    pub total_datasets: usize,
    /// Entries ordered by ascending `csv_path`.
    pub datasets: Vec<CatalogEntry>,
}

// ---------------------------------------------------------------------------
// CatalogEntry
// ---------------------------------------------------------------------------

/// One dataset (CSV file) in the catalog.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Path of the CSV file, `/`-separated.
    pub csv_path: String,
    /// Path of the merged sidecar, if any.
    pub metadata_path: Option<String>,
    pub title: String,
    pub description: String,
    pub source: DatasetSource,
    pub tags: Vec<String>,
    pub license: String,
    pub created_at: Option<String>,
    /// Parent folder grouping related datasets.
    pub thematic_name: Option<String>,
    /// `YYYY-MM` publication bucket.
    pub year_month: Option<String>,
    /// Basename of the CSV file, extension included.
    pub filename: String,
    /// True iff a valid sidecar was merged into this entry.
    pub has_metadata: bool,
    #[serde(flatten)]
    pub freshness: Freshness,
}

/// Freshness placeholders.
///
/// Always null in a freshly built catalog; a separate process fills them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Freshness {
    pub freshness_score: Option<f64>,
    pub freshness_status: Option<String>,
    pub freshness_indicator: Option<String>,
    pub data_as_of: Option<String>,
    pub source_reliability: Option<String>,
    pub days_since_check: Option<i64>,
    pub warning: Option<String>,
}

impl Freshness {
    /// True when no freshness field has been populated.
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// DatasetSource
// ---------------------------------------------------------------------------

/// Provenance object of a dataset.
///
/// Kept as a JSON object so that keys a sidecar adds beyond `name`, `url` and
/// `import_type` survive the merge. Keys serialize in sorted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetSource(pub Map<String, Value>);

impl DatasetSource {
    /// `{name: "Unknown", url: null}` without an import type.
    pub fn unknown() -> Self {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(UNKNOWN.into()));
        map.insert("url".into(), Value::Null);
        Self(map)
    }

    /// Set `import_type` to [`DEFAULT_IMPORT_TYPE`] when it is absent or null.
    pub fn with_default_import_type(mut self) -> Self {
        let import_type = self.0.entry("import_type").or_insert(Value::Null);
        if import_type.is_null() {
            *import_type = Value::String(DEFAULT_IMPORT_TYPE.into());
        }
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn url(&self) -> Option<&str> {
        self.0.get("url").and_then(Value::as_str)
    }

    /// The import type, if present and non-null.
    pub fn import_type(&self) -> Option<&Value> {
        self.0.get("import_type").filter(|v| !v.is_null())
    }
}

// ---------------------------------------------------------------------------
// SidecarMetadata
// ---------------------------------------------------------------------------

/// Contents of a `<name>.meta.json` sidecar. Every field is optional.
///
/// Fields are read leniently: a known field holding the wrong JSON type is
/// treated as absent, so it gets its default instead of rejecting the whole
/// sidecar. `source` stays untyped and is checked when merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidecarMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub license: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
}

/// `Some` only when the value has the expected type.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A list keeps its string elements; any other value counts as absent.
fn lenient_tags<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(tag) => Some(tag),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    };
    Ok(tags)
}
