//! Directory watcher that turns registry file events into store changes.

use std::ffi::OsString;
use std::path::Path;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use winsync_common::StoreError;

use super::OwnWrites;
use crate::store::{StoreChange, Subscription};

/// Watch `dir` for changes to `file_name`, skipping events whose resulting
/// content is exactly what this handle last wrote.
pub(super) fn watch_key(
    dir: &Path,
    file_name: String,
    key: String,
    own_writes: OwnWrites,
) -> Result<Subscription, StoreError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let file_name = OsString::from(file_name);
    let watched = dir.join(&file_name);

    info!("watching {} for registry changes", watched.display());

    let mut watcher = RecommendedWatcher::new(
        move |result: Result<Event, notify::Error>| match result {
            Ok(event) => {
                let relevant = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );
                if !relevant {
                    return;
                }

                let is_our_file = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n == file_name).unwrap_or(false));
                if !is_our_file {
                    return;
                }

                if is_own_write(&watched, &key, &own_writes) {
                    return;
                }

                debug!(key = %key, "registry change detected");
                let _ = tx.send(StoreChange { key: key.clone() });
            }
            Err(e) => {
                error!("registry watcher error: {e}");
            }
        },
        notify::Config::default(),
    )
    .map_err(|e| StoreError::WatchError(format!("failed to create watcher: {e}")))?;

    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| StoreError::WatchError(format!("failed to watch {}: {e}", dir.display())))?;

    // The watcher stops when the subscription drops it.
    Ok(Subscription::new(rx, watcher))
}

fn is_own_write(path: &Path, key: &str, own_writes: &OwnWrites) -> bool {
    let current = std::fs::read_to_string(path).ok();
    let own = own_writes.lock().unwrap_or_else(|p| p.into_inner());
    matches!((current, own.get(key)), (Some(current), Some(written)) if &current == written)
}
