use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use winsync_common::{
    CoordinatorError, CoordinatorEvent, EventBus, Metadata, Shape, StoreError, WindowId,
};
use winsync_config::schema::CoordinatorConfig;
use winsync_store::{MemoryRegistry, MemoryStore, SharedStore, Subscription};

use super::WindowCoordinator;
use crate::clock::ManualClock;
use crate::geometry::SharedProbe;
use crate::record::{decode_list, encode_list, WindowRecord};

const KEY: &str = "windows";
const START: u64 = 10_000;

/// Several windows sharing one in-memory store and one clock.
struct Host {
    registry: MemoryRegistry,
    clock: ManualClock,
}

impl Host {
    fn new() -> Self {
        Self {
            registry: MemoryRegistry::new(),
            clock: ManualClock::new(START),
        }
    }

    fn window(&self, shape: Shape) -> (WindowCoordinator, SharedProbe) {
        self.window_with(shape, CoordinatorConfig::default())
    }

    fn window_with(
        &self,
        shape: Shape,
        config: CoordinatorConfig,
    ) -> (WindowCoordinator, SharedProbe) {
        let probe = SharedProbe::new(shape);
        let coordinator =
            WindowCoordinator::new(Arc::new(self.registry.context()), probe.clone(), config, KEY)
                .with_clock(Arc::new(self.clock.clone()));
        (coordinator, probe)
    }

    fn stored(&self) -> Vec<WindowRecord> {
        let raw = self.registry.context().read(KEY).unwrap();
        decode_list(raw.as_deref()).unwrap()
    }

    /// A window whose store handle can be made to reject writes.
    fn gated_window(&self, shape: Shape) -> (WindowCoordinator, SharedProbe, WriteGate) {
        let probe = SharedProbe::new(shape);
        let gate = WriteGate::default();
        let store = GatedStore {
            inner: self.registry.context(),
            gate: gate.clone(),
        };
        let coordinator = WindowCoordinator::new(
            Arc::new(store),
            probe.clone(),
            CoordinatorConfig::default(),
            KEY,
        )
        .with_clock(Arc::new(self.clock.clone()));
        (coordinator, probe, gate)
    }

    /// Write as an unrelated context, so every coordinator is notified.
    fn write_raw(&self, value: &str) {
        self.registry.context().write(KEY, value).unwrap();
    }
}

#[derive(Clone, Default)]
struct WriteGate {
    closed: Arc<AtomicBool>,
    attempts: Arc<AtomicUsize>,
}

impl WriteGate {
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn open(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

struct GatedStore {
    inner: MemoryStore,
    gate: WriteGate,
}

impl SharedStore for GatedStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.gate.attempts.fetch_add(1, Ordering::SeqCst);
        if self.gate.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes rejected".into()));
        }
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.inner.clear()
    }

    fn subscribe(&self, key: &str) -> Result<Subscription, StoreError> {
        self.inner.subscribe(key)
    }
}

fn left() -> Shape {
    Shape::new(0.0, 0.0, 800.0, 600.0)
}

fn right() -> Shape {
    Shape::new(800.0, 0.0, 800.0, 600.0)
}

fn meta(foo: &str) -> Metadata {
    let mut m = Metadata::new();
    m.insert("foo".into(), json!(foo));
    m
}

fn ids(records: &[WindowRecord]) -> Vec<WindowId> {
    records.iter().map(|r| r.id.clone()).collect()
}

fn record_rosters(coordinator: &mut WindowCoordinator) -> Arc<Mutex<Vec<Vec<WindowRecord>>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    coordinator.on_roster_changed(move |roster| sink.lock().unwrap().push(roster.to_vec()));
    seen
}

fn record_shapes(coordinator: &mut WindowCoordinator) -> Arc<Mutex<Vec<Shape>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    coordinator.on_own_shape_changed(move |shape| sink.lock().unwrap().push(*shape));
    seen
}

fn ghost(seen_at: Option<u64>) -> WindowRecord {
    WindowRecord {
        id: WindowId::from("ghost"),
        shape: Shape::new(-500.0, 0.0, 400.0, 300.0),
        metadata: Metadata::new(),
        seen_at,
    }
}

fn add_ghost(host: &Host, seen_at: Option<u64>) {
    let mut list = host.stored();
    list.push(ghost(seen_at));
    host.write_raw(&encode_list(&list).unwrap());
}

// -----------------------------------------------------------------------------
// Registration
// -----------------------------------------------------------------------------

#[test]
fn init_publishes_and_reports_roster_once() {
    let host = Host::new();
    let (mut a, _probe) = host.window(left());
    let rosters = record_rosters(&mut a);

    a.init(meta("bar")).unwrap();

    let stored = host.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].shape, left());
    assert_eq!(stored[0].metadata, meta("bar"));
    assert_eq!(stored[0].seen_at, Some(START));

    let rosters = rosters.lock().unwrap();
    assert_eq!(rosters.len(), 1);
    assert_eq!(ids(&rosters[0]), vec![a.window_id().cloned().unwrap()]);
    assert_eq!(a.own_index(), Some(0));
}

#[test]
fn second_init_is_rejected() {
    let host = Host::new();
    let (mut a, _probe) = host.window(left());
    a.init(Metadata::new()).unwrap();

    let err = a.init(Metadata::new()).unwrap_err();
    assert!(matches!(err, CoordinatorError::AlreadyInitialized(_)));
    assert_eq!(host.stored().len(), 1);
}

#[test]
fn ids_are_unique_across_windows() {
    let host = Host::new();
    let mut windows: Vec<WindowCoordinator> = (0..5)
        .map(|i| host.window(Shape::new(f64::from(i) * 100.0, 0.0, 100.0, 100.0)).0)
        .collect();
    for w in &mut windows {
        w.init(Metadata::new()).unwrap();
    }
    for w in &mut windows {
        w.update();
    }

    let unique: HashSet<WindowId> = windows
        .iter()
        .filter_map(|w| w.window_id().cloned())
        .collect();
    assert_eq!(unique.len(), 5);
    for (i, w) in windows.iter().enumerate() {
        assert_eq!(w.windows().len(), 5);
        assert_eq!(w.own_index(), Some(i));
    }
}

#[test]
fn id_collision_retries() {
    let host = Host::new();
    let (a, _pa) = host.window(left());
    let mut a = a.with_id_source(|| WindowId::from("dup"));
    a.init(Metadata::new()).unwrap();

    let mut script = vec!["dup", "dup", "fresh"].into_iter();
    let (b, _pb) = host.window(right());
    let mut b = b.with_id_source(move || WindowId::from(script.next().unwrap_or("late")));
    b.init(Metadata::new()).unwrap();

    assert_eq!(b.window_id().map(WindowId::as_str), Some("fresh"));
    assert_eq!(
        ids(&host.stored()),
        vec![WindowId::from("dup"), WindowId::from("fresh")]
    );
}

#[test]
fn id_collision_gives_up_after_limit() {
    let host = Host::new();
    let (a, _pa) = host.window(left());
    let mut a = a.with_id_source(|| WindowId::from("dup"));
    a.init(Metadata::new()).unwrap();

    let config = CoordinatorConfig {
        id_retry_limit: 3,
        ..Default::default()
    };
    let (b, _pb) = host.window_with(right(), config);
    let mut b = b.with_id_source(|| WindowId::from("dup"));

    let err = b.init(Metadata::new()).unwrap_err();
    assert!(matches!(err, CoordinatorError::IdentityExhausted(3)));
    assert!(!b.is_initialized());
    assert_eq!(host.stored().len(), 1);
}

#[test]
fn init_over_malformed_store_starts_fresh() {
    let host = Host::new();
    host.write_raw("{this is not a window list");

    let (mut a, _probe) = host.window(left());
    a.init(Metadata::new()).unwrap();

    assert_eq!(a.windows().len(), 1);
    assert_eq!(host.stored().len(), 1);
}

#[test]
fn init_drops_unstamped_records() {
    let host = Host::new();
    host.write_raw(&encode_list(&[ghost(None)]).unwrap());

    let (mut a, _probe) = host.window(left());
    a.init(Metadata::new()).unwrap();

    assert_eq!(ids(&host.stored()), ids(a.windows()));
    assert_eq!(a.windows().len(), 1);
}

// -----------------------------------------------------------------------------
// Synchronization
// -----------------------------------------------------------------------------

#[test]
fn two_windows_converge() {
    let host = Host::new();
    let (mut a, probe_a) = host.window(left());
    let (mut b, _probe_b) = host.window(right());
    let a_rosters = record_rosters(&mut a);
    let b_rosters = record_rosters(&mut b);

    a.init(meta("bar")).unwrap();
    b.init(meta("baz")).unwrap();
    a.update();

    let a_id = a.window_id().cloned().unwrap();
    let b_id = b.window_id().cloned().unwrap();
    assert_eq!(ids(a.windows()), vec![a_id.clone(), b_id.clone()]);
    assert_eq!(ids(b.windows()), vec![a_id, b_id]);
    assert_eq!(a.own_index(), Some(0));
    assert_eq!(b.own_index(), Some(1));
    assert_eq!(b.windows()[0].metadata["foo"], json!("bar"));
    assert_eq!(a.windows()[1].metadata["foo"], json!("baz"));
    assert_eq!(a_rosters.lock().unwrap().len(), 2);
    assert_eq!(b_rosters.lock().unwrap().len(), 1);

    probe_a.set_position(100.0, 0.0);
    a.update();
    b.update();

    let moved = Shape::new(100.0, 0.0, 800.0, 600.0);
    assert_eq!(a.shape(), Some(moved));
    assert_eq!(b.windows()[0].shape, moved);
    assert_eq!(b_rosters.lock().unwrap().len(), 2);
    // Moving itself is reported through the own-shape callback only.
    assert_eq!(a_rosters.lock().unwrap().len(), 2);
}

#[test]
fn own_movement_fires_shape_callback() {
    let host = Host::new();
    let (mut a, probe) = host.window(left());
    let shapes = record_shapes(&mut a);
    a.init(Metadata::new()).unwrap();

    a.update();
    assert!(shapes.lock().unwrap().is_empty());

    probe.set_size(1024.0, 768.0);
    a.update();
    a.update();

    assert_eq!(
        *shapes.lock().unwrap(),
        vec![Shape::new(0.0, 0.0, 1024.0, 768.0)]
    );
    assert_eq!(host.stored()[0].shape, Shape::new(0.0, 0.0, 1024.0, 768.0));
}

#[test]
fn unchanged_state_fires_no_callbacks() {
    let host = Host::new();
    let (mut a, _pa) = host.window(left());
    let (mut b, _pb) = host.window(right());
    a.init(Metadata::new()).unwrap();
    b.init(Metadata::new()).unwrap();
    a.update();

    let a_rosters = record_rosters(&mut a);
    let b_rosters = record_rosters(&mut b);
    let a_shapes = record_shapes(&mut a);

    a.update();
    b.update();

    // Poll only.
    host.clock.advance(300);
    a.update();
    b.update();

    // Heartbeats rewrite both records; only `seen_at` differs.
    host.clock.advance(1_000);
    a.update();
    b.update();
    a.update();

    assert!(a_rosters.lock().unwrap().is_empty());
    assert!(b_rosters.lock().unwrap().is_empty());
    assert!(a_shapes.lock().unwrap().is_empty());
}

#[test]
fn heartbeat_refreshes_liveness_stamp() {
    let host = Host::new();
    let (mut a, _probe) = host.window(left());
    a.init(Metadata::new()).unwrap();

    host.clock.advance(999);
    a.update();
    assert_eq!(host.stored()[0].seen_at, Some(START));

    host.clock.advance(1);
    a.update();
    assert_eq!(host.stored()[0].seen_at, Some(START + 1_000));

    host.clock.advance(500);
    a.update();
    assert_eq!(host.stored()[0].seen_at, Some(START + 1_000));
}

#[test]
fn abandoned_window_is_pruned_once() {
    let host = Host::new();
    let (mut a, _pa) = host.window(left());
    let (mut b, _pb) = host.window(right());
    a.init(Metadata::new()).unwrap();
    b.init(Metadata::new()).unwrap();

    add_ghost(&host, Some(START));
    a.update();
    b.update();
    assert_eq!(a.windows().len(), 3);
    assert_eq!(b.windows().len(), 3);

    let a_rosters = record_rosters(&mut a);
    let b_rosters = record_rosters(&mut b);

    for _ in 0..12 {
        host.clock.advance(500);
        a.update();
        b.update();
    }

    for rosters in [a_rosters, b_rosters] {
        let rosters = rosters.lock().unwrap();
        assert_eq!(rosters.len(), 1);
        assert_eq!(rosters[0].len(), 2);
    }
    assert!(!host
        .stored()
        .iter()
        .any(|r| r.id == WindowId::from("ghost")));
}

#[test]
fn pruning_can_be_disabled() {
    let host = Host::new();
    let config = CoordinatorConfig {
        stale_after_missed: 0,
        ..Default::default()
    };
    let (mut a, _probe) = host.window_with(left(), config);
    a.init(Metadata::new()).unwrap();
    add_ghost(&host, None);

    for _ in 0..10 {
        host.clock.advance(10_000);
        a.update();
    }
    assert_eq!(a.windows().len(), 2);
    assert_eq!(host.stored().len(), 2);
}

#[test]
fn malformed_store_is_repaired() {
    let host = Host::new();
    let (mut a, _probe) = host.window(left());
    a.init(Metadata::new()).unwrap();
    let rosters = record_rosters(&mut a);

    host.write_raw("[{\"id\": 7}]");
    a.update();

    assert_eq!(ids(&host.stored()), ids(a.windows()));
    assert_eq!(a.windows().len(), 1);
    assert!(rosters.lock().unwrap().is_empty());
}

#[test]
fn external_removal_of_own_record_is_reasserted() {
    let host = Host::new();
    let (mut a, _pa) = host.window(left());
    let (mut b, _pb) = host.window(right());
    a.init(Metadata::new()).unwrap();
    b.init(Metadata::new()).unwrap();
    a.update();

    let b_only: Vec<WindowRecord> = host
        .stored()
        .into_iter()
        .filter(|r| Some(&r.id) == b.window_id())
        .collect();
    host.write_raw(&encode_list(&b_only).unwrap());

    a.update();
    let stored = host.stored();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().any(|r| Some(&r.id) == a.window_id()));
}

#[test]
fn foreign_rewrite_of_own_shape_is_restored() {
    let host = Host::new();
    let (mut a, _probe) = host.window(left());
    a.init(Metadata::new()).unwrap();
    let shapes = record_shapes(&mut a);

    let mut list = host.stored();
    list[0].shape = Shape::new(555.0, 0.0, 10.0, 10.0);
    host.write_raw(&encode_list(&list).unwrap());

    a.update();

    assert_eq!(host.stored()[0].shape, left());
    assert_eq!(*shapes.lock().unwrap(), vec![left()]);
}

#[test]
fn notify_store_changed_reconciles_immediately() {
    let host = Host::new();
    let (mut a, _pa) = host.window(left());
    let (mut b, _pb) = host.window(right());
    a.init(Metadata::new()).unwrap();
    b.init(Metadata::new()).unwrap();

    a.notify_store_changed();
    assert_eq!(a.windows().len(), 2);
}

#[test]
fn rejected_republish_still_follows_siblings() {
    let host = Host::new();
    let (mut a, _probe, gate) = host.gated_window(left());
    let rosters = record_rosters(&mut a);
    a.init(Metadata::new()).unwrap();
    let a_id = a.window_id().cloned().unwrap();

    gate.close();
    let sibling = |id: &str, x: f64| WindowRecord {
        id: WindowId::from(id),
        shape: Shape::new(x, 0.0, 400.0, 300.0),
        metadata: Metadata::new(),
        seen_at: Some(START),
    };
    host.write_raw(&encode_list(&[sibling("b", 800.0), sibling("c", 1200.0)]).unwrap());

    a.update();
    let expected = vec![WindowId::from("b"), WindowId::from("c"), a_id.clone()];
    assert_eq!(ids(a.windows()), expected);
    assert_eq!(a.own_index(), Some(2));
    assert_eq!(ids(rosters.lock().unwrap().last().unwrap()), expected);
    assert!(!host.stored().iter().any(|r| r.id == a_id));

    // A sibling leaving is still picked up while writes keep failing.
    host.write_raw(&encode_list(&[sibling("c", 1200.0)]).unwrap());
    host.clock.advance(300);
    a.update();
    assert_eq!(ids(a.windows()), vec![WindowId::from("c"), a_id.clone()]);

    gate.open();
    host.clock.advance(1_000);
    a.update();
    assert_eq!(ids(&host.stored()), vec![WindowId::from("c"), a_id]);
}

#[test]
fn rejected_publish_is_retried_once_per_heartbeat() {
    let host = Host::new();
    let (mut a, probe, gate) = host.gated_window(left());
    a.init(Metadata::new()).unwrap();
    let after_init = gate.attempts();

    gate.close();
    probe.set(right());
    for _ in 0..30 {
        host.clock.advance(16);
        a.update();
    }
    assert_eq!(gate.attempts(), after_init + 1);

    gate.open();
    host.clock.advance(1_000);
    a.update();
    assert_eq!(gate.attempts(), after_init + 2);
    assert_eq!(host.stored()[0].shape, right());
}

// -----------------------------------------------------------------------------
// Callbacks and events
// -----------------------------------------------------------------------------

#[test]
fn last_registered_callback_wins() {
    let host = Host::new();
    let (mut a, _pa) = host.window(left());
    let first = record_rosters(&mut a);
    let second = record_rosters(&mut a);
    a.init(Metadata::new()).unwrap();

    assert!(first.lock().unwrap().is_empty());
    assert_eq!(second.lock().unwrap().len(), 1);
}

#[test]
fn panicking_callback_leaves_state_consistent() {
    let host = Host::new();
    let (mut a, _pa) = host.window(left());
    let (mut b, probe_b) = host.window(right());
    a.init(Metadata::new()).unwrap();
    a.on_roster_changed(|_| panic!("consumer bug"));
    b.init(Metadata::new()).unwrap();

    let result = catch_unwind(AssertUnwindSafe(|| a.update()));
    assert!(result.is_err());
    assert_eq!(a.windows().len(), 2);

    let rosters = record_rosters(&mut a);
    a.update();
    assert!(rosters.lock().unwrap().is_empty());

    probe_b.set_position(900.0, 0.0);
    b.update();
    a.update();
    let rosters = rosters.lock().unwrap();
    assert_eq!(rosters.len(), 1);
    assert_eq!(rosters[0][1].shape.x, 900.0);
}

#[test]
fn lifecycle_events_reach_the_bus() {
    let host = Host::new();
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let (a, _probe) = host.window(left());
    let mut a = a.with_event_bus(&bus);

    a.init(Metadata::new()).unwrap();
    let id = a.window_id().cloned().unwrap();

    assert!(matches!(rx.try_recv().unwrap(), CoordinatorEvent::Initialized(got) if got == id));
    assert!(matches!(
        rx.try_recv().unwrap(),
        CoordinatorEvent::RosterChanged { count: 1, .. }
    ));

    a.teardown().unwrap();
    assert!(matches!(rx.try_recv().unwrap(), CoordinatorEvent::TornDown(got) if got == id));
}

// -----------------------------------------------------------------------------
// Teardown
// -----------------------------------------------------------------------------

#[test]
fn teardown_removes_record_and_is_idempotent() {
    let host = Host::new();
    let (mut a, _pa) = host.window(left());
    let (mut b, _pb) = host.window(right());
    a.init(Metadata::new()).unwrap();
    b.init(Metadata::new()).unwrap();
    a.update();
    let a_rosters = record_rosters(&mut a);

    b.teardown().unwrap();
    b.teardown().unwrap();
    assert!(!b.is_initialized());
    assert!(b.windows().is_empty());
    b.update();

    a.update();
    assert_eq!(ids(&host.stored()), ids(a.windows()));
    assert_eq!(a.windows().len(), 1);
    assert_eq!(a_rosters.lock().unwrap().len(), 1);
}

#[test]
fn dropping_a_coordinator_unregisters_it() {
    let host = Host::new();
    let (mut a, _pa) = host.window(left());
    a.init(Metadata::new()).unwrap();
    {
        let (mut b, _pb) = host.window(right());
        b.init(Metadata::new()).unwrap();
        assert_eq!(host.stored().len(), 2);
    }
    assert_eq!(ids(&host.stored()), vec![a.window_id().cloned().unwrap()]);
}

#[test]
fn calls_before_init_are_inert() {
    let host = Host::new();
    let (mut a, _probe) = host.window(left());
    a.update();
    a.notify_store_changed();
    a.teardown().unwrap();
    assert!(a.windows().is_empty());
    assert_eq!(a.window_id(), None);
    assert!(host.stored().is_empty());
}
