//! Catalog entry construction.
//!
//! Every dataset becomes exactly one [`CatalogEntry`], built in one of two
//! ways:
//! - from its metadata sidecar ([`EntryBuilder::with_metadata`]), with
//!   defaults filled in for whatever the sidecar leaves out;
//! - as a bare fallback ([`EntryBuilder::fallback`]) when no sidecar exists.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use datacatalog_shared::{
    CatalogEntry, CatalogError, DEFAULT_DATA_DIR, DatasetSource, Freshness, Result,
    SidecarMetadata, UNKNOWN,
};

use crate::classify::{PathIdentity, classify_with_root};
use crate::scan::to_posix;

/// Builds catalog entries for datasets under one data root.
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    root_dir_name: String,
}

impl Default for EntryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl EntryBuilder {
    /// `root_dir_name` is never reported as a thematic name.
    pub fn new(root_dir_name: impl Into<String>) -> Self {
        Self {
            root_dir_name: root_dir_name.into(),
        }
    }

    /// Read `sidecar` and build a metadata-bearing entry for `csv`.
    ///
    /// Fails with [`CatalogError::Sidecar`] when the sidecar cannot be read
    /// or parsed; the sidecar file itself is never modified.
    pub fn with_metadata(&self, csv: &Path, sidecar: &Path) -> Result<CatalogEntry> {
        let meta = read_sidecar(sidecar)?;
        Ok(self.merge(csv, sidecar, &meta))
    }

    /// Merge already-parsed sidecar metadata into an entry.
    pub fn merge(&self, csv: &Path, sidecar: &Path, meta: &SidecarMetadata) -> CatalogEntry {
        let csv_path = to_posix(csv);
        let identity = self.classify(&csv_path);

        CatalogEntry {
            csv_path,
            metadata_path: Some(to_posix(sidecar)),
            title: meta
                .title
                .clone()
                .unwrap_or_else(|| humanize_title(&file_stem(csv))),
            description: meta.description.clone().unwrap_or_default(),
            source: merge_source(meta.source.as_ref()),
            tags: meta.tags.clone().unwrap_or_default(),
            license: meta.license.clone().unwrap_or_else(|| UNKNOWN.into()),
            created_at: meta.created_at.clone(),
            thematic_name: identity.thematic_name,
            year_month: identity.year_month,
            filename: identity.filename,
            has_metadata: true,
            freshness: Freshness::default(),
        }
    }

    /// Build an entry for a CSV that has no sidecar.
    pub fn fallback(&self, csv: &Path) -> CatalogEntry {
        let csv_path = to_posix(csv);
        let identity = self.classify(&csv_path);
        let title = humanize_title(&file_stem(csv));

        CatalogEntry {
            csv_path,
            metadata_path: None,
            description: format!("Dataset: {title}"),
            title,
            source: DatasetSource::unknown().with_default_import_type(),
            tags: identity.thematic_name.iter().cloned().collect(),
            license: UNKNOWN.into(),
            created_at: None,
            thematic_name: identity.thematic_name,
            year_month: identity.year_month,
            filename: identity.filename,
            has_metadata: false,
            freshness: Freshness::default(),
        }
    }

    fn classify(&self, csv_path: &str) -> PathIdentity {
        classify_with_root(csv_path, &self.root_dir_name)
    }
}

/// Read and parse a sidecar file.
///
/// Only a read failure, invalid JSON, or a top-level value that is not an
/// object is a sidecar error. Known fields of the wrong type fall back to
/// their defaults.
pub fn read_sidecar(path: &Path) -> Result<SidecarMetadata> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CatalogError::sidecar(path, format!("read failed: {e}")))?;

    let value: Value = serde_json::from_str(&content)
        .map_err(|e| CatalogError::sidecar(path, format!("invalid JSON: {e}")))?;

    if !value.is_object() {
        return Err(CatalogError::sidecar(path, "expected a JSON object"));
    }

    let meta = serde_json::from_value(value)
        .map_err(|e| CatalogError::sidecar(path, format!("invalid metadata: {e}")))?;
    debug!(path = %path.display(), "parsed sidecar");
    Ok(meta)
}

/// Copy the sidecar's `source` object, falling back to the unknown source,
/// and make sure it carries an `import_type`.
pub fn merge_source(raw: Option<&Value>) -> DatasetSource {
    let source = match raw {
        Some(Value::Object(map)) => DatasetSource(map.clone()),
        _ => DatasetSource::unknown(),
    };
    source.with_default_import_type()
}

/// Turn a filename stem into a display title.
///
/// Hyphens and underscores become spaces, then each word is title-cased:
/// the first letter of a run of letters is upper-cased, the rest lower-cased.
/// `gdp-growth_rate` becomes `Gdp Growth Rate`.
pub fn humanize_title(stem: &str) -> String {
    let spaced = stem.replace('-', " ").replace('_', " ");

    let mut title = String::with_capacity(spaced.len());
    let mut after_letter = false;
    for c in spaced.chars() {
        if after_letter {
            title.extend(c.to_lowercase());
        } else {
            title.extend(c.to_uppercase());
        }
        after_letter = c.is_lowercase() || c.is_uppercase();
    }
    title
}

/// The CSV filename without its final extension.
fn file_stem(csv: &Path) -> String {
    csv.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("datacatalog-entry-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn humanize_examples() {
        assert_eq!(humanize_title("gdp-growth_rate"), "Gdp Growth Rate");
        assert_eq!(humanize_title("GDP_2026q1"), "Gdp 2026Q1");
        assert_eq!(humanize_title("foo"), "Foo");
        assert_eq!(humanize_title("a--b"), "A  B");
        assert_eq!(humanize_title("städte-ranking"), "Städte Ranking");
        assert_eq!(humanize_title(""), "");
    }

    #[test]
    fn fallback_entry() {
        let builder = EntryBuilder::default();
        let entry = builder.fallback(Path::new("data/2026-01/charts/gdp-growth_rate.csv"));

        assert_eq!(entry.csv_path, "data/2026-01/charts/gdp-growth_rate.csv");
        assert_eq!(entry.metadata_path, None);
        assert_eq!(entry.title, "Gdp Growth Rate");
        assert_eq!(entry.description, "Dataset: Gdp Growth Rate");
        assert_eq!(entry.tags, vec!["charts".to_string()]);
        assert_eq!(entry.license, "Unknown");
        assert_eq!(entry.source.name(), Some("Unknown"));
        assert_eq!(entry.source.import_type(), Some(&Value::from("csv")));
        assert_eq!(entry.source.0.get("url"), Some(&Value::Null));
        assert_eq!(entry.filename, "gdp-growth_rate.csv");
        assert!(!entry.has_metadata);
        assert!(entry.freshness.is_unset());
    }

    #[test]
    fn fallback_without_thematic_folder_has_no_tags() {
        let entry = EntryBuilder::default().fallback(Path::new("data/2026-01/bar.csv"));
        assert!(entry.tags.is_empty());
        assert_eq!(entry.thematic_name, None);
        assert_eq!(entry.year_month.as_deref(), Some("2026-01"));
    }

    #[test]
    fn merge_applies_defaults() {
        let builder = EntryBuilder::default();
        let entry = builder.merge(
            Path::new("data/economy/gdp_total.csv"),
            Path::new("data/economy/gdp_total.meta.json"),
            &SidecarMetadata::default(),
        );

        assert_eq!(entry.metadata_path.as_deref(), Some("data/economy/gdp_total.meta.json"));
        assert_eq!(entry.title, "Gdp Total");
        assert_eq!(entry.description, "");
        assert!(entry.tags.is_empty());
        assert_eq!(entry.license, "Unknown");
        assert_eq!(entry.created_at, None);
        assert_eq!(entry.source.name(), Some("Unknown"));
        assert_eq!(entry.source.import_type(), Some(&Value::from("csv")));
        assert_eq!(entry.thematic_name.as_deref(), Some("economy"));
        assert!(entry.has_metadata);
    }

    #[test]
    fn merge_keeps_sidecar_values() {
        let meta: SidecarMetadata = serde_json::from_str(
            r#"{
                "title": "Bruttoinlandsprodukt",
                "description": "Quarterly GDP",
                "source": {"name": "Destatis", "url": "https://destatis.de", "import_type": "api"},
                "tags": ["economy", "gdp"],
                "license": "CC-BY-4.0",
                "created_at": "2026-01-15T10:00:00Z"
            }"#,
        )
        .unwrap();

        let entry = EntryBuilder::default().merge(
            Path::new("data/gdp.csv"),
            Path::new("data/gdp.meta.json"),
            &meta,
        );
        assert_eq!(entry.title, "Bruttoinlandsprodukt");
        assert_eq!(entry.description, "Quarterly GDP");
        assert_eq!(entry.source.url(), Some("https://destatis.de"));
        assert_eq!(entry.source.import_type(), Some(&Value::from("api")));
        assert_eq!(entry.tags, vec!["economy".to_string(), "gdp".to_string()]);
        assert_eq!(entry.license, "CC-BY-4.0");
        assert_eq!(entry.created_at.as_deref(), Some("2026-01-15T10:00:00Z"));
        // the data root itself is not a thematic folder
        assert_eq!(entry.thematic_name, None);
    }

    #[test]
    fn merge_source_copies_and_injects() {
        let raw = serde_json::json!({"name": "Eurostat", "license_note": "see site"});
        let source = merge_source(Some(&raw));

        assert_eq!(source.import_type(), Some(&Value::from("csv")));
        assert_eq!(source.0.get("license_note"), Some(&Value::from("see site")));
        // the input object is left as it was
        assert!(raw.get("import_type").is_none());
    }

    #[test]
    fn non_object_source_becomes_unknown() {
        for raw in [Value::Null, Value::from("Eurostat"), serde_json::json!([1, 2])] {
            let source = merge_source(Some(&raw));
            assert_eq!(source.name(), Some("Unknown"));
            assert_eq!(source.import_type(), Some(&Value::from("csv")));
        }
    }

    #[test]
    fn with_metadata_reads_sidecar_without_touching_it() {
        let dir = temp_dir();
        let csv = dir.join("rates.csv");
        let sidecar = dir.join("rates.meta.json");
        let original = r#"{"title": "Rates", "source": {"name": "ECB"}}"#;
        std::fs::write(&csv, "a,b\n1,2\n").unwrap();
        std::fs::write(&sidecar, original).unwrap();

        let entry = EntryBuilder::default().with_metadata(&csv, &sidecar).unwrap();
        assert_eq!(entry.title, "Rates");
        assert_eq!(entry.source.import_type(), Some(&Value::from("csv")));
        assert_eq!(std::fs::read_to_string(&sidecar).unwrap(), original);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_sidecars_are_sidecar_errors() {
        let dir = temp_dir();
        let cases = [
            ("broken.meta.json", "{not json"),
            ("array.meta.json", "[1, 2, 3]"),
        ];

        for (name, content) in cases {
            let path = dir.join(name);
            std::fs::write(&path, content).unwrap();
            let err = read_sidecar(&path).unwrap_err();
            assert!(err.is_recoverable(), "{name}: {err}");
        }

        let err = read_sidecar(&dir.join("missing.meta.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Sidecar { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn wrongly_typed_fields_keep_the_entry() {
        let dir = temp_dir();
        let csv = dir.join("gdp.csv");
        let sidecar = dir.join("gdp.meta.json");
        std::fs::write(&csv, "a\n").unwrap();
        std::fs::write(
            &sidecar,
            r#"{"title": "GDP", "created_at": 1700000000, "tags": "economy", "license": 4}"#,
        )
        .unwrap();

        let entry = EntryBuilder::default().with_metadata(&csv, &sidecar).unwrap();
        assert!(entry.has_metadata);
        assert_eq!(entry.title, "GDP");
        assert_eq!(entry.created_at, None);
        assert!(entry.tags.is_empty());
        assert_eq!(entry.license, "Unknown");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
