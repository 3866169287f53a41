//! Window creation and deferred coordinator start.

use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

use winsync_common::Shape;
use winsync_core::WindowCoordinator;

use crate::scene;

use super::core::SyncApp;

// =============================================================================
// INITIALIZATION
// =============================================================================

impl SyncApp {
    /// Create the window and schedule the coordinator start.
    /// Returns `false` if the window could not be created.
    pub(super) fn initialize_window(&mut self, event_loop: &ActiveEventLoop) -> bool {
        let attrs = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(self.config.window.width),
                f64::from(self.config.window.height),
            ));

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                tracing::error!("Failed to create window: {e}");
                return false;
            }
        };

        self.probe.set(measure(&window));
        self.window = Some(window);

        // Positions reported right after creation are often wrong on some
        // platforms, so registration waits for the window to settle.
        let delay = Duration::from_millis(self.config.window.settle_delay_ms);
        self.start_at = Some(Instant::now() + delay);
        tracing::debug!(delay_ms = self.config.window.settle_delay_ms, "window created");
        true
    }

    /// Register in the shared list. Called once, after the settle delay.
    /// Returns `false` if registration failed and the app should exit.
    pub(super) fn start_coordinator(&mut self) -> bool {
        self.start_at = None;
        let Some(metadata) = self.metadata.take() else {
            return true;
        };
        if let Some(window) = &self.window {
            self.probe.set(measure(window));
        }

        let mut coordinator = WindowCoordinator::new(
            self.store.clone(),
            self.probe.clone(),
            self.config.coordinator.clone(),
            self.config.store.key.clone(),
        )
        .with_event_bus(&self.event_bus);
        self.scene_rx = Some(scene::connect(&mut coordinator));

        if let Err(e) = coordinator.init(metadata) {
            tracing::error!("Failed to register window: {e}");
            return false;
        }
        if let Some(shape) = coordinator.shape() {
            self.scene.set_own_shape(shape);
        }
        self.coordinator = Some(coordinator);
        true
    }
}

/// Screen position and viewport size in logical pixels. Platforms that
/// cannot report a window position (Wayland) get the origin.
pub(super) fn measure(window: &Window) -> Shape {
    let scale = window.scale_factor();
    let size = window.inner_size().to_logical::<f64>(scale);
    let (x, y) = window
        .outer_position()
        .map(|p| {
            let p = p.to_logical::<f64>(scale);
            (p.x, p.y)
        })
        .unwrap_or((0.0, 0.0));
    Shape::new(x, y, size.width, size.height)
}
