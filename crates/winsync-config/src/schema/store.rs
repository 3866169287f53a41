//! Shared registry store configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which store implementation backs the registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum StoreBackend {
    /// JSON files in a shared directory, watched for changes.
    #[default]
    File,
    /// Process-local store; only useful for demos and tests.
    Memory,
}

/// Shared registry store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory holding the registry files. Empty means the platform
    /// data directory (`<data_dir>/winsync/registry`).
    pub directory: Option<PathBuf>,
    /// Well-known key holding the serialized window list.
    pub key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            directory: None,
            key: "windows".into(),
        }
    }
}
