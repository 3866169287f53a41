//! Per-frame coordinator tick and wake-up scheduling.

use std::time::Instant;

use tokio::sync::broadcast::error::TryRecvError;
use winit::event_loop::{ActiveEventLoop, ControlFlow};

use winsync_core::seconds_since_midnight;

use crate::event_log::log_event;
use crate::scene;

use super::core::SyncApp;

impl SyncApp {
    /// Run one frame and schedule the next wake-up.
    pub(super) fn poll_and_schedule(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();

        if self.start_at.is_some_and(|at| now >= at) && !self.start_coordinator() {
            self.should_exit = true;
            event_loop.exit();
            return;
        }

        self.tick();

        let frame = scene::frame_interval(self.config.scene.frame_rate);
        let next = match self.start_at {
            Some(at) => at.min(now + frame),
            None => now + frame,
        };
        event_loop.set_control_flow(ControlFlow::WaitUntil(next));
    }

    /// Advance the coordinator and the scene by one frame.
    pub(super) fn tick(&mut self) {
        let Some(coordinator) = self.coordinator.as_mut() else {
            return;
        };
        coordinator.update();
        self.drain_events();

        let roster_changed = match &self.scene_rx {
            Some(rx) => self.scene.apply_pending(rx) > 0,
            None => false,
        };
        self.scene.step(seconds_since_midnight());
        if roster_changed {
            self.update_window_title();
        }
    }

    /// Log every pending coordinator event, returning how many there were.
    pub(super) fn drain_events(&mut self) -> usize {
        let mut count = 0;
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => {
                    log_event(&event);
                    count += 1;
                }
                Err(TryRecvError::Lagged(n)) => {
                    tracing::warn!("event log skipped {n} coordinator events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        count
    }
}
