//! Graceful shutdown: unregister from the shared list, drop the window.

use super::core::SyncApp;

// =============================================================================
// SHUTDOWN
// =============================================================================

impl SyncApp {
    /// Unregister and release the window. Safe to call more than once.
    pub(super) fn shutdown(&mut self) {
        if let Some(mut coordinator) = self.coordinator.take() {
            tracing::info!("Unregistering window");
            if let Err(e) = coordinator.teardown() {
                tracing::warn!("Failed to unregister window: {e}");
            }
        }

        self.start_at = None;
        self.scene_rx = None;
        self.window = None;
        self.should_exit = true;
    }
}

// =============================================================================
// TESTS
// =============================================================================
