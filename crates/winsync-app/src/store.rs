//! Opening the shared store selected by config and CLI.

use std::path::Path;
use std::sync::Arc;

use winsync_common::SyncError;
use winsync_config::schema::{StoreBackend, SyncConfig};
use winsync_store::{FileStore, MemoryStore, SharedStore};

/// Open the configured store. `dir_override` (from `--store-dir`) wins over
/// the configured directory and forces the file backend.
pub fn open(config: &SyncConfig, dir_override: Option<&Path>) -> Result<Arc<dyn SharedStore>, SyncError> {
    if let Some(dir) = dir_override {
        return Ok(Arc::new(FileStore::open(dir)?));
    }
    match config.store.backend {
        StoreBackend::File => {
            let dir = winsync_config::resolve_store_dir(config)?;
            Ok(Arc::new(FileStore::open(dir)?))
        }
        StoreBackend::Memory => {
            tracing::warn!("memory store selected: windows in other processes will not be seen");
            Ok(Arc::new(MemoryStore::standalone()))
        }
    }
}

/// Wipe every key in the store.
pub fn clear(store: &dyn SharedStore) -> Result<(), SyncError> {
    store.clear()?;
    tracing::info!("shared window list cleared");
    Ok(())
}
