//! Per-frame publishing and inbound reconciliation.

use std::time::Duration;

use tracing::{debug, info, warn};
use winsync_common::{CoordinatorError, CoordinatorEvent, Shape};

use super::WindowCoordinator;
use crate::reconcile::{dedupe, parse_roster, reconcile, retain_live, roster_differs, ReconcileContext};
use crate::record::{encode_list, WindowRecord};

impl WindowCoordinator {
    /// Per-frame tick.
    ///
    /// Samples the geometry probe and republishes on any change, rewrites
    /// the own record when a heartbeat is due, and reconciles when a store
    /// notification arrived or the fallback poll interval elapsed. A
    /// rejected write is retried no sooner than one heartbeat later.
    pub fn update(&mut self) {
        let Some(published) = self.own.as_ref().map(|r| r.shape) else {
            return;
        };
        let now = self.clock.now_ms();

        let sampled = self.probe.current_geometry();
        if self.sampled != Some(sampled) {
            self.sampled = Some(sampled);
            self.emit_own_shape_changed(sampled);
        }

        let heartbeat_due =
            elapsed(now, self.last_heartbeat_ms) >= self.config.heartbeat_interval();
        if (sampled != published || heartbeat_due) && now >= self.retry_publish_at_ms {
            if let Err(e) = self.publish(sampled, now) {
                warn!("failed to publish window record: {e}");
                self.defer_publish(now);
            }
        }

        let notified = self
            .subscription
            .as_mut()
            .map(|s| s.drain())
            .unwrap_or(0);
        let poll_due = elapsed(now, self.last_poll_ms) >= self.config.poll_interval();
        if notified > 0 || poll_due {
            self.sync(now);
        }
    }

    /// Reconcile immediately, for hosts that receive store change events
    /// themselves instead of waiting for the next [`update`](Self::update).
    pub fn notify_store_changed(&mut self) {
        if self.own.is_none() {
            return;
        }
        if let Some(subscription) = self.subscription.as_mut() {
            subscription.drain();
        }
        let now = self.clock.now_ms();
        self.sync(now);
    }

    /// Read the store and fold it into the local roster.
    fn sync(&mut self, now: u64) {
        self.last_poll_ms = now;

        let raw = match self.store.read(&self.key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to read shared window list: {e}");
                return;
            }
        };

        let Some(own) = self.own.clone() else {
            return;
        };
        let outcome = reconcile(
            &self.roster,
            raw.as_deref(),
            &ReconcileContext {
                own_id: Some(&own.id),
                own_shape: Some(&own.shape),
                now_ms: now,
                stale_after: self.config.stale_after(),
            },
        );

        let mut roster = outcome.roster;
        if outcome.own_missing || outcome.own_shape_diverged {
            // Another writer dropped or rewrote our record. Re-assert it;
            // the republish folds in everything else from the same read.
            if now >= self.retry_publish_at_ms {
                info!(
                    missing = outcome.own_missing,
                    diverged = outcome.own_shape_diverged,
                    "own record lost from shared list, republishing"
                );
                match self.publish(own.shape, now) {
                    Ok(()) => {
                        if outcome.own_shape_diverged {
                            self.emit_own_shape_changed(own.shape);
                        }
                        return;
                    }
                    Err(e) => {
                        warn!("failed to republish window record: {e}");
                        self.defer_publish(now);
                    }
                }
            }

            // Until a write goes through, follow siblings with the local
            // record standing in for the stored one.
            match roster.iter_mut().find(|r| r.id == own.id) {
                Some(slot) => *slot = own,
                None => roster.push(own),
            }
        }

        for gone in &outcome.pruned {
            debug!(window_id = %gone, "pruned stale window");
            self.emit_event(CoordinatorEvent::Pruned(gone.clone()));
        }

        let changed = roster_differs(&self.roster, &roster, None);
        self.roster = roster;
        if changed {
            debug!(windows = self.roster.len(), "roster changed");
            self.emit_roster_changed();
        }
    }

    fn defer_publish(&mut self, now: u64) {
        self.retry_publish_at_ms = now.saturating_add(self.config.heartbeat_interval_ms);
    }

    /// Read-modify-write the shared list with this window's record in place.
    ///
    /// Stale foreign records are left out of the rewrite. No compare-and-swap
    /// exists, so a sibling writing at the same moment can be overwritten; it
    /// notices its record missing on its next reconcile and republishes.
    fn publish(&mut self, shape: Shape, now: u64) -> Result<(), CoordinatorError> {
        let mut record = self
            .own
            .clone()
            .ok_or(CoordinatorError::NotInitialized)?;
        record.shape = shape;
        record.seen_at = Some(now);

        let (current, _) = parse_roster(self.store.read(&self.key)?.as_deref());
        let (mut list, pruned) = retain_live(
            dedupe(current),
            Some(&record.id),
            now,
            self.config.stale_after(),
        );
        match list.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record.clone(),
            None => list.push(record.clone()),
        }
        self.write_list(&list)?;

        debug!(window_id = %record.id, shape = %shape, "published window record");
        let id = record.id.clone();
        self.own = Some(record);
        self.last_heartbeat_ms = now;
        self.retry_publish_at_ms = 0;

        for gone in pruned {
            debug!(window_id = %gone, "pruned stale window while publishing");
            self.emit_event(CoordinatorEvent::Pruned(gone));
        }

        let changed = roster_differs(&self.roster, &list, Some(&id));
        self.roster = list;
        if changed {
            self.emit_roster_changed();
        }
        Ok(())
    }

    pub(super) fn write_list(&self, list: &[WindowRecord]) -> Result<(), CoordinatorError> {
        let encoded = encode_list(list)?;
        self.store.write(&self.key, &encoded)?;
        Ok(())
    }
}

fn elapsed(now: u64, since: u64) -> Duration {
    Duration::from_millis(now.saturating_sub(since))
}
