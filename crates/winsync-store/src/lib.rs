//! Shared registry stores.
//!
//! A store is a string key-value map visible to every window of one host,
//! with change notifications delivered to every *other* handle that
//! subscribed to a key. Two backends are provided:
//!
//! - [`MemoryStore`]: handles onto one in-process [`MemoryRegistry`]; each
//!   handle is a separate context, which is how tests model several windows.
//! - [`FileStore`]: one JSON file per key in a shared directory, watched
//!   with the `notify` crate so separate processes see each other's writes.

mod file;
mod memory;
mod store;

pub use file::FileStore;
pub use memory::{MemoryRegistry, MemoryStore};
pub use store::{SharedStore, StoreChange, Subscription};
