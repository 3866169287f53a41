//! Scene smoothing: turns the coordinator's roster into eased positions.
//!
//! Each window draws the whole desktop in screen coordinates, shifted by its
//! own screen position. One node per roster entry sits at that window's
//! center. Offset and nodes move a fixed fraction of the way to their
//! targets each frame.

use std::sync::mpsc;
use std::time::Duration;

use winsync_common::{Color, Shape, WindowId};
use winsync_core::{WindowCoordinator, WindowRecord};

/// Change delivered from coordinator callbacks to the render loop.
#[derive(Debug, Clone)]
pub enum SceneUpdate {
    Roster(Vec<WindowRecord>),
    OwnShape(Shape),
}

/// Route both coordinator callbacks into a channel the frame loop drains.
pub fn connect(coordinator: &mut WindowCoordinator) -> mpsc::Receiver<SceneUpdate> {
    let (tx, rx) = mpsc::channel();
    let roster_tx = tx.clone();
    coordinator.on_roster_changed(move |roster| {
        let _ = roster_tx.send(SceneUpdate::Roster(roster.to_vec()));
    });
    coordinator.on_own_shape_changed(move |shape| {
        let _ = tx.send(SceneUpdate::OwnShape(*shape));
    });
    rx
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: WindowId,
    pub position: (f64, f64),
    pub target: (f64, f64),
    pub color: Color,
    pub orbit_radius: f64,
    /// Radians about (x, y), driven by the shared scene clock.
    pub rotation: (f64, f64),
    spin: f64,
}

#[derive(Debug, Clone)]
pub struct SceneState {
    falloff: f64,
    offset: (f64, f64),
    offset_target: (f64, f64),
    has_shape: bool,
    nodes: Vec<SceneNode>,
}

impl SceneState {
    pub fn new(falloff: f64) -> Self {
        Self {
            falloff,
            offset: (0.0, 0.0),
            offset_target: (0.0, 0.0),
            has_shape: false,
            nodes: Vec::new(),
        }
    }

    pub fn apply(&mut self, update: SceneUpdate) {
        match update {
            SceneUpdate::Roster(roster) => self.set_roster(&roster),
            SceneUpdate::OwnShape(shape) => self.set_own_shape(shape),
        }
    }

    /// Drain every pending update.
    pub fn apply_pending(&mut self, rx: &mpsc::Receiver<SceneUpdate>) -> usize {
        let mut applied = 0;
        while let Ok(update) = rx.try_recv() {
            self.apply(update);
            applied += 1;
        }
        applied
    }

    /// Rebuild the node list from a roster. Nodes for windows that were
    /// already present keep their current position; new ones start on
    /// their target.
    pub fn set_roster(&mut self, roster: &[WindowRecord]) {
        let previous = std::mem::take(&mut self.nodes);
        self.nodes = roster
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let target = record.shape.center();
                let position = previous
                    .iter()
                    .find(|n| n.id == record.id)
                    .map_or(target, |n| n.position);
                SceneNode {
                    id: record.id.clone(),
                    position,
                    target,
                    color: Color::for_roster_index(i),
                    orbit_radius: 60.0 + i as f64 * 30.0,
                    rotation: (0.0, 0.0),
                    spin: spin_rate(i),
                }
            })
            .collect();
    }

    /// Aim the scene offset at this window's screen position. The first
    /// shape is applied immediately, later ones are eased.
    pub fn set_own_shape(&mut self, shape: Shape) {
        self.offset_target = (-shape.x, -shape.y);
        if !self.has_shape {
            self.offset = self.offset_target;
            self.has_shape = true;
        }
    }

    /// Advance one frame. `t` is the shared scene time in seconds.
    pub fn step(&mut self, t: f64) {
        self.offset = ease(self.offset, self.offset_target, self.falloff);
        for node in &mut self.nodes {
            node.position = ease(node.position, node.target, self.falloff);
            node.rotation = (t * node.spin, t * node.spin);
        }
    }

    pub fn offset(&self) -> (f64, f64) {
        self.offset
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }
}

/// Time between frames at `frame_rate` frames per second.
pub fn frame_interval(frame_rate: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(frame_rate.max(1)))
}

fn ease(from: (f64, f64), to: (f64, f64), falloff: f64) -> (f64, f64) {
    (
        from.0 + (to.0 - from.0) * falloff,
        from.1 + (to.1 - from.1) * falloff,
    )
}

/// Per-index rotation speed in `[0.1, 0.2)`, stable across windows so the
/// same node spins the same way everywhere.
fn spin_rate(index: usize) -> f64 {
    let i = index as f64;
    let v = (((i + 6506.0) * (3894.0 - i).abs()) % 1209.0).powf(3.0 / (i + 1.0));
    0.1 + (v - v.floor()) * 0.1
}
