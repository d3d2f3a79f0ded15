//! Application configuration for the dataset catalog.
//!
//! User config lives at `~/.datacatalog/datacatalog.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "datacatalog.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".datacatalog";

/// Conventional name of the data root directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Conventional catalog location, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "data/catalog.json";

// ---------------------------------------------------------------------------
// Config structs (matching datacatalog.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog rebuild settings.
    #[serde(default)]
    pub catalog: CatalogSettings,
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Directory tree scanned for datasets.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Where the catalog document is written.
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Directory name that never counts as a thematic folder.
    #[serde(default = "default_root_dir_name")]
    pub root_dir_name: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_path: default_output_path(),
            root_dir_name: default_root_dir_name(),
        }
    }
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.into()
}
fn default_output_path() -> String {
    DEFAULT_OUTPUT_PATH.into()
}
fn default_root_dir_name() -> String {
    DEFAULT_DATA_DIR.into()
}

// ---------------------------------------------------------------------------
// Rebuild config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime rebuild configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RebuildConfig {
    /// Root of the scanned directory tree.
    pub data_dir: PathBuf,
    /// Catalog output file.
    pub output_path: PathBuf,
    /// Segment excluded from thematic names.
    pub root_dir_name: String,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for RebuildConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            data_dir: PathBuf::from(&config.catalog.data_dir),
            output_path: PathBuf::from(&config.catalog.output_path),
            root_dir_name: config.catalog.root_dir_name.clone(),
        }
    }
}

impl RebuildConfig {
    /// Reject settings the rebuild cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(CatalogError::config("data_dir must not be empty"));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(CatalogError::config("output_path must not be empty"));
        }
        if self.root_dir_name.contains('/') {
            return Err(CatalogError::config(format!(
                "root_dir_name must be a single path segment, got '{}'",
                self.root_dir_name
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.datacatalog/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CatalogError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.datacatalog/datacatalog.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = match config_file_path() {
        Ok(path) => path,
        Err(err) => {
            tracing::debug!(%err, "no home directory, using defaults");
            return Ok(AppConfig::default());
        }
    };

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CatalogError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CatalogError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| CatalogError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}
