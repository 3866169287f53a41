//! The window coordinator: identity, publication, reconciliation, teardown.
//!
//! One coordinator runs per window and is driven from that window's own
//! loop. Outbound updates are paced by [`WindowCoordinator::update`] (once
//! per frame); inbound changes arrive as store notifications, drained on the
//! same call, with a fallback poll for notifications the store coalesced or
//! dropped.

mod lifecycle;
mod sync;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tokio::sync::broadcast;
use winsync_common::{CoordinatorEvent, EventBus, Metadata, Shape, WindowId};
use winsync_config::schema::CoordinatorConfig;
use winsync_store::{SharedStore, Subscription};

use crate::clock::{Clock, SystemClock};
use crate::geometry::GeometryProbe;
use crate::record::WindowRecord;

type RosterCallback = Box<dyn FnMut(&[WindowRecord]) + Send>;
type ShapeCallback = Box<dyn FnMut(&Shape) + Send>;
type IdSource = Box<dyn FnMut() -> WindowId + Send>;

pub struct WindowCoordinator {
    store: Arc<dyn SharedStore>,
    probe: Box<dyn GeometryProbe>,
    clock: Arc<dyn Clock>,
    config: CoordinatorConfig,
    key: String,
    id_source: IdSource,

    /// This window's record as last published. `None` before `init` and
    /// after `teardown`.
    own: Option<WindowRecord>,
    /// Geometry seen on the previous frame, for own-shape callbacks.
    sampled: Option<Shape>,
    roster: Vec<WindowRecord>,
    subscription: Option<Subscription>,
    last_heartbeat_ms: u64,
    last_poll_ms: u64,
    /// Earliest time a publish is attempted again after the store
    /// rejected one.
    retry_publish_at_ms: u64,

    on_roster_changed: Option<RosterCallback>,
    on_own_shape_changed: Option<ShapeCallback>,
    events: Option<broadcast::Sender<CoordinatorEvent>>,
}

impl WindowCoordinator {
    pub fn new(
        store: Arc<dyn SharedStore>,
        probe: impl GeometryProbe + 'static,
        config: CoordinatorConfig,
        key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            probe: Box::new(probe),
            clock: Arc::new(SystemClock),
            config,
            key: key.into(),
            id_source: Box::new(WindowId::new),
            own: None,
            sampled: None,
            roster: Vec::new(),
            subscription: None,
            last_heartbeat_ms: 0,
            last_poll_ms: 0,
            retry_publish_at_ms: 0,
            on_roster_changed: None,
            on_own_shape_changed: None,
            events: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the id generator. The default is a random UUID v4.
    pub fn with_id_source(mut self, source: impl FnMut() -> WindowId + Send + 'static) -> Self {
        self.id_source = Box::new(source);
        self
    }

    /// Also publish lifecycle events on `bus` for async consumers.
    pub fn with_event_bus(mut self, bus: &EventBus) -> Self {
        self.events = Some(bus.sender());
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The current roster in store order. Index `i` keeps referring to the
    /// same window only while that window's id stays at `i`.
    pub fn windows(&self) -> &[WindowRecord] {
        &self.roster
    }

    pub fn window_id(&self) -> Option<&WindowId> {
        self.own.as_ref().map(|r| &r.id)
    }

    /// Position of this window in the roster.
    pub fn own_index(&self) -> Option<usize> {
        let id = self.window_id()?;
        self.roster.iter().position(|r| &r.id == id)
    }

    /// Shape this window last published.
    pub fn shape(&self) -> Option<Shape> {
        self.own.as_ref().map(|r| r.shape)
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.own.as_ref().map(|r| &r.metadata)
    }

    pub fn is_initialized(&self) -> bool {
        self.own.is_some()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    // -------------------------------------------------------------------------
    // Callbacks
    // -------------------------------------------------------------------------

    /// Called with the new roster whenever it changes. Replaces any
    /// previously registered callback.
    pub fn on_roster_changed(&mut self, callback: impl FnMut(&[WindowRecord]) + Send + 'static) {
        self.on_roster_changed = Some(Box::new(callback));
    }

    /// Called with this window's shape when it moves or resizes, or when
    /// another writer clobbered the stored copy. Replaces any previously
    /// registered callback.
    pub fn on_own_shape_changed(&mut self, callback: impl FnMut(&Shape) + Send + 'static) {
        self.on_own_shape_changed = Some(Box::new(callback));
    }

    /// The roster is already updated when this runs, so a panicking
    /// callback cannot leave it half-applied.
    fn emit_roster_changed(&mut self) {
        let roster = &self.roster;
        if let Some(events) = &self.events {
            let _ = events.send(CoordinatorEvent::RosterChanged {
                count: roster.len(),
                ids: roster.iter().map(|r| r.id.clone()).collect(),
            });
        }
        if let Some(callback) = self.on_roster_changed.as_mut() {
            callback(roster);
        }
    }

    fn emit_own_shape_changed(&mut self, shape: Shape) {
        self.emit_event(CoordinatorEvent::OwnShapeChanged(shape));
        if let Some(callback) = self.on_own_shape_changed.as_mut() {
            callback(&shape);
        }
    }

    fn emit_event(&self, event: CoordinatorEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
