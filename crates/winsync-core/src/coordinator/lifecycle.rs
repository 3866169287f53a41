//! Joining and leaving the shared registry.

use tracing::{debug, info, warn};
use winsync_common::{CoordinatorError, CoordinatorEvent, Metadata, WindowId};

use super::WindowCoordinator;
use crate::reconcile::{dedupe, parse_roster, retain_live};
use crate::record::WindowRecord;

impl WindowCoordinator {
    /// Register this window in the shared list and start listening for
    /// sibling changes.
    ///
    /// Fires the roster-changed callback once with the fresh roster, which
    /// contains at least this window.
    pub fn init(&mut self, metadata: Metadata) -> Result<(), CoordinatorError> {
        if let Some(own) = &self.own {
            return Err(CoordinatorError::AlreadyInitialized(own.id.to_string()));
        }

        // Subscribe before reading so a sibling write between the two is
        // not lost.
        let subscription = self.store.subscribe(&self.key)?;

        let now = self.clock.now_ms();
        let (current, _) = parse_roster(self.store.read(&self.key)?.as_deref());
        let (mut list, pruned) =
            retain_live(dedupe(current), None, now, self.config.stale_after());

        let id = self.generate_id(&list)?;
        let shape = self.probe.current_geometry();
        let record = WindowRecord::new(id.clone(), shape, metadata, now);
        list.push(record.clone());
        self.write_list(&list)?;

        self.own = Some(record);
        self.sampled = Some(shape);
        self.roster = list;
        self.subscription = Some(subscription);
        self.last_heartbeat_ms = now;
        self.last_poll_ms = now;
        self.retry_publish_at_ms = 0;

        info!(
            window_id = %id,
            shape = %shape,
            windows = self.roster.len(),
            "window registered"
        );
        for gone in pruned {
            debug!(window_id = %gone, "dropped stale window while registering");
            self.emit_event(CoordinatorEvent::Pruned(gone));
        }

        self.emit_event(CoordinatorEvent::Initialized(id));
        self.emit_roster_changed();
        Ok(())
    }

    /// Remove this window's record and stop syncing.
    ///
    /// Idempotent: a second call, or a call before `init`, does nothing.
    /// Siblings also drop the record through staleness pruning, so skipping
    /// this (a crash, a killed process) only delays their cleanup.
    pub fn teardown(&mut self) -> Result<(), CoordinatorError> {
        let Some(own) = self.own.take() else {
            return Ok(());
        };
        self.subscription = None;
        self.sampled = None;
        self.roster.clear();

        let (current, _) = parse_roster(self.store.read(&self.key)?.as_deref());
        let remaining: Vec<WindowRecord> =
            current.into_iter().filter(|r| r.id != own.id).collect();
        self.write_list(&remaining)?;

        info!(window_id = %own.id, remaining = remaining.len(), "window unregistered");
        self.emit_event(CoordinatorEvent::TornDown(own.id));
        Ok(())
    }

    fn generate_id(&mut self, taken: &[WindowRecord]) -> Result<WindowId, CoordinatorError> {
        let limit = self.config.id_retry_limit.max(1);
        for attempt in 1..=limit {
            let id = (self.id_source)();
            if !taken.iter().any(|r| r.id == id) {
                return Ok(id);
            }
            debug!(window_id = %id, attempt, "generated id already registered, retrying");
        }
        Err(CoordinatorError::IdentityExhausted(limit))
    }
}

impl Drop for WindowCoordinator {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!("best-effort teardown failed: {e}");
        }
    }
}
