//! Windowless driver: a scripted probe on a fixed frame clock.
//!
//! Useful for watching the registry from a terminal, or for running many
//! simulated windows against one store directory.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use winsync_common::{CoordinatorEvent, EventBus, Metadata, Shape, SyncError};
use winsync_config::schema::SyncConfig;
use winsync_core::{seconds_since_midnight, Clock, ScriptedProbe, SystemClock, WindowCoordinator};
use winsync_store::SharedStore;

use crate::event_log::log_event;
use crate::scene::{self, SceneState};

const ORBIT_RADIUS: f64 = 120.0;
const ORBIT_PERIOD_MS: u64 = 8_000;
const EVENT_CAPACITY: usize = 64;

pub struct HeadlessOptions {
    pub shape: Shape,
    pub metadata: Metadata,
    /// Stop after this many frames; run until interrupted when `None`.
    pub frames: Option<u64>,
}

/// Register a simulated window, drive it until Ctrl-C or the frame limit,
/// then unregister.
pub async fn run(
    config: &SyncConfig,
    store: Arc<dyn SharedStore>,
    options: HeadlessOptions,
) -> Result<(), SyncError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let probe = ScriptedProbe::orbit(options.shape, ORBIT_RADIUS, ORBIT_PERIOD_MS, clock.clone());

    let bus = EventBus::new(EVENT_CAPACITY);
    let logger = tokio::spawn(log_events(bus.subscribe()));

    let mut coordinator = WindowCoordinator::new(
        store,
        probe,
        config.coordinator.clone(),
        config.store.key.clone(),
    )
    .with_clock(clock)
    .with_event_bus(&bus);
    let scene_rx = scene::connect(&mut coordinator);
    let mut scene = SceneState::new(config.scene.falloff);

    coordinator.init(options.metadata)?;
    if let Some(shape) = coordinator.shape() {
        scene.set_own_shape(shape);
    }

    let mut ticker = tokio::time::interval(scene::frame_interval(config.scene.frame_rate));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    let mut frame: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = &mut interrupted => {
                if let Err(e) = result {
                    warn!("failed to listen for Ctrl-C: {e}");
                }
                info!("interrupted");
                break;
            }
        }

        coordinator.update();
        scene.apply_pending(&scene_rx);
        scene.step(seconds_since_midnight());

        frame += 1;
        if options.frames.is_some_and(|limit| frame >= limit) {
            break;
        }
    }

    info!(
        frames = frame,
        windows = coordinator.windows().len(),
        "headless run finished"
    );
    coordinator.teardown()?;

    // The logger exits once every sender is gone.
    drop(coordinator);
    drop(bus);
    let _ = logger.await;
    Ok(())
}

async fn log_events(mut rx: broadcast::Receiver<CoordinatorEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => log_event(&event),
            Err(RecvError::Lagged(n)) => warn!("event logger skipped {n} events"),
            Err(RecvError::Closed) => break,
        }
    }
}
