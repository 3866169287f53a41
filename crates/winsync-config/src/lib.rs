//! winsync configuration system.
//!
//! Provides TOML-based configuration with full validation. All config
//! sections use defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use winsync_config::load_config;
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("heartbeat every {} ms", config.coordinator.heartbeat_interval_ms);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{SyncConfig, CONFIG_SCHEMA_VERSION};
pub use toml_loader::{default_config_path, default_store_dir};

use std::path::{Path, PathBuf};
use winsync_common::ConfigError;

/// Load config from an explicit path, or from the platform default path
/// when `path` is `None`.
///
/// The default path is created with a commented template if missing; an
/// explicit path must exist.
pub fn load_config(path: Option<&Path>) -> Result<SyncConfig, ConfigError> {
    let config = match path {
        Some(p) => toml_loader::load_from_path(p)?,
        None => toml_loader::load_default()?,
    };
    validation::validate(&config)?;
    Ok(config)
}

/// Directory the file store should use for this config.
pub fn resolve_store_dir(config: &SyncConfig) -> Result<PathBuf, ConfigError> {
    match &config.store.directory {
        Some(dir) => Ok(dir.clone()),
        None => default_store_dir(),
    }
}
