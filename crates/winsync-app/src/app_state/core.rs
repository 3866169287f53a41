//! SyncApp struct definition and constructor.

use std::sync::{mpsc, Arc};
use std::time::Instant;

use winit::window::Window;

use tokio::sync::broadcast;

use winsync_common::{CoordinatorEvent, EventBus, Metadata, Shape};
use winsync_config::schema::SyncConfig;
use winsync_core::{SharedProbe, WindowCoordinator};
use winsync_store::SharedStore;

use crate::scene::{SceneState, SceneUpdate};

use super::types::EVENT_CAPACITY;

/// Top-level application state for one synchronized window.
pub struct SyncApp {
    pub(super) config: SyncConfig,
    pub(super) store: Arc<dyn SharedStore>,
    pub(super) event_bus: EventBus,
    /// Coordinator events, drained into the log each frame.
    pub(super) event_rx: broadcast::Receiver<CoordinatorEvent>,

    // Windowing
    pub(super) window: Option<Arc<Window>>,
    /// Fed from move/resize events, read by the coordinator each frame.
    pub(super) probe: SharedProbe,

    // Registry; created once the window has settled
    pub(super) metadata: Option<Metadata>,
    pub(super) coordinator: Option<WindowCoordinator>,
    pub(super) start_at: Option<Instant>,

    // Scene
    pub(super) scene: SceneState,
    pub(super) scene_rx: Option<mpsc::Receiver<SceneUpdate>>,

    pub(super) should_exit: bool,
}

impl SyncApp {
    pub fn new(config: SyncConfig, store: Arc<dyn SharedStore>, metadata: Metadata) -> Self {
        let scene = SceneState::new(config.scene.falloff);
        let event_bus = EventBus::new(EVENT_CAPACITY);
        let event_rx = event_bus.subscribe();
        Self {
            config,
            store,
            event_bus,
            event_rx,
            window: None,
            probe: SharedProbe::new(Shape::default()),
            metadata: Some(metadata),
            coordinator: None,
            start_at: None,
            scene,
            scene_rx: None,
            should_exit: false,
        }
    }
}
