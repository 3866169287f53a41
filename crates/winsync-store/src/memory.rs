//! In-process store with per-context change notification.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::debug;
use winsync_common::StoreError;

use crate::store::{SharedStore, StoreChange, Subscription};

struct Subscriber {
    context: u64,
    key: String,
    tx: mpsc::UnboundedSender<StoreChange>,
}

#[derive(Default)]
struct Backend {
    values: HashMap<String, String>,
    subscribers: Vec<Subscriber>,
    next_context: u64,
}

impl Backend {
    /// Deliver a change to every live subscriber of `key` outside `origin`.
    fn notify(&mut self, origin: u64, key: &str) {
        self.subscribers.retain(|s| !s.tx.is_closed());
        for sub in self
            .subscribers
            .iter()
            .filter(|s| s.context != origin && s.key == key)
        {
            let _ = sub.tx.send(StoreChange {
                key: key.to_string(),
            });
        }
    }
}

/// The shared origin that [`MemoryStore`] handles point into.
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    backend: Arc<Mutex<Backend>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new context (one "window") onto this registry.
    pub fn context(&self) -> MemoryStore {
        let context = {
            let mut backend = self.backend.lock().unwrap_or_else(|p| p.into_inner());
            backend.next_context += 1;
            backend.next_context
        };
        MemoryStore {
            backend: Arc::clone(&self.backend),
            context,
        }
    }
}

/// One context's handle onto a [`MemoryRegistry`].
pub struct MemoryStore {
    backend: Arc<Mutex<Backend>>,
    context: u64,
}

impl MemoryStore {
    /// A standalone store with no siblings.
    pub fn standalone() -> Self {
        MemoryRegistry::new().context()
    }

    pub fn context_id(&self) -> u64 {
        self.context
    }

    fn lock(&self) -> Result<MutexGuard<'_, Backend>, StoreError> {
        self.backend
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl SharedStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut backend = self.lock()?;
        backend.values.insert(key.to_string(), value.to_string());
        backend.notify(self.context, key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut backend = self.lock()?;
        if backend.values.remove(key).is_some() {
            backend.notify(self.context, key);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut backend = self.lock()?;
        let keys: Vec<String> = backend.values.drain().map(|(k, _)| k).collect();
        for key in &keys {
            backend.notify(self.context, key);
        }
        debug!(context = self.context, cleared = keys.len(), "memory store cleared");
        Ok(())
    }

    fn subscribe(&self, key: &str) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock()?.subscribers.push(Subscriber {
            context: self.context,
            key: key.to_string(),
            tx,
        });
        Ok(Subscription::new(rx, ()))
    }
}
