//! Shared types, error model, and configuration for the dataset catalog.
//!
//! This crate is the foundation depended on by the other catalog crates.
//! It provides:
//! - [`CatalogError`], the unified error type
//! - Domain types ([`CatalogDocument`], [`CatalogEntry`], [`SidecarMetadata`])
//! - Configuration ([`AppConfig`], [`RebuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogSettings, DEFAULT_DATA_DIR, DEFAULT_OUTPUT_PATH, RebuildConfig, config_dir,
    config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{CatalogError, Result};
pub use types::{
    CATALOG_SCHEMA_VERSION, CatalogDocument, CatalogEntry, DEFAULT_IMPORT_TYPE, DatasetSource,
    Freshness, SidecarMetadata, UNKNOWN,
};
