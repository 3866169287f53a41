//! The store contract shared by every backend.

use tokio::sync::mpsc;
use winsync_common::StoreError;

/// A key that changed in another context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub key: String,
}

/// Live subscription to change notifications for one key.
///
/// Dropping the subscription stops delivery; for the file store it also
/// stops the underlying file watcher.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<StoreChange>,
    _guard: Box<dyn std::any::Any + Send>,
}

impl Subscription {
    pub fn new(
        rx: mpsc::UnboundedReceiver<StoreChange>,
        guard: impl std::any::Any + Send + 'static,
    ) -> Self {
        Self {
            rx,
            _guard: Box::new(guard),
        }
    }

    /// Discard every pending notification, returning how many there were.
    ///
    /// Several notifications in one frame collapse into a single reconcile.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while self.rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    /// Wait for the next notification. Returns `None` once the store side
    /// has gone away.
    pub async fn recv(&mut self) -> Option<StoreChange> {
        self.rx.recv().await
    }
}

/// A same-host key-value store shared by every window.
///
/// Writes notify every *other* subscribed context; the writer never sees
/// its own change and must rely on its in-memory state instead.
pub trait SharedStore: Send + Sync {
    /// Current value for `key`, or `None` if it was never written.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every key.
    fn clear(&self) -> Result<(), StoreError>;

    fn subscribe(&self, key: &str) -> Result<Subscription, StoreError>;
}
