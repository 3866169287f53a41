//! Internal constants for the app state module.

/// Capacity of the coordinator event bus.
pub(super) const EVENT_CAPACITY: usize = 64;
