use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::id::WindowId;
use crate::types::Shape;

/// Notifications fanned out to async consumers of a coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CoordinatorEvent {
    Initialized(WindowId),
    RosterChanged { count: usize, ids: Vec<WindowId> },
    OwnShapeChanged(Shape),
    Pruned(WindowId),
    TornDown(WindowId),
    #[serde(other)]
    Unknown,
}

pub struct EventBus {
    sender: broadcast::Sender<CoordinatorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: CoordinatorEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// A sender handle that can be moved into `Send` callbacks.
    pub fn sender(&self) -> broadcast::Sender<CoordinatorEvent> {
        self.sender.clone()
    }
}
