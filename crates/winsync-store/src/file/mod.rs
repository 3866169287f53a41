//! File-backed store shared between processes.
//!
//! Each key is a `<key>.json` file in one directory. Writes go to a
//! per-handle `.tmp` file and are renamed into place so readers never see a
//! half-written list. A `notify` watcher on the directory turns other
//! processes' writes into [`StoreChange`](crate::StoreChange) notifications.

mod watcher;


use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use winsync_common::{new_correlation_id, StoreError};

use crate::store::{SharedStore, Subscription};

const EXTENSION: &str = "json";

/// Values this handle wrote last, per key. Used to recognize (and drop)
/// watcher events caused by our own writes.
pub(crate) type OwnWrites = Arc<Mutex<HashMap<String, String>>>;

pub struct FileStore {
    dir: PathBuf,
    context: String,
    own_writes: OwnWrites,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "opened file store");
        Ok(Self {
            dir,
            context: new_correlation_id(),
            own_writes: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{EXTENSION}"))
    }

    fn remember_write(&self, key: &str, value: Option<&str>) {
        let mut own = self.own_writes.lock().unwrap_or_else(|p| p.into_inner());
        match value {
            Some(v) => own.insert(key.to_string(), v.to_string()),
            None => own.remove(key),
        };
    }
}

impl SharedStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!(".{key}.{}.tmp", self.context));

        // Remember first so the watcher event for the rename is recognized.
        self.remember_write(key, Some(value));

        std::fs::write(&tmp_path, value)?;
        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            // Rename failed (e.g. target locked on Windows); write in place.
            warn!("atomic rename failed ({e}), falling back to direct write");
            let _ = std::fs::remove_file(&tmp_path);
            std::fs::write(&path, value)?;
        }

        debug!(path = %path.display(), bytes = value.len(), "store write");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.remember_write(key, None);
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut removed = 0usize;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == EXTENSION).unwrap_or(false) {
                match std::fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        self.own_writes
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
        debug!(dir = %self.dir.display(), removed, "file store cleared");
        Ok(())
    }

    fn subscribe(&self, key: &str) -> Result<Subscription, StoreError> {
        watcher::watch_key(
            &self.dir,
            format!("{key}.{EXTENSION}"),
            key.to_string(),
            Arc::clone(&self.own_writes),
        )
    }
}
