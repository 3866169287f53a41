//! Geometry probes: where this window is on screen right now.

use std::f64::consts::TAU;
use std::sync::{Arc, Mutex};

use winsync_common::Shape;

use crate::clock::Clock;

/// Synchronous snapshot of this window's screen position and viewport size.
pub trait GeometryProbe: Send {
    fn current_geometry(&self) -> Shape;
}

/// Probe fed by the host: resize and move handlers call [`SharedProbe::set`],
/// the coordinator reads the latest value once per frame.
#[derive(Debug, Clone, Default)]
pub struct SharedProbe {
    shape: Arc<Mutex<Shape>>,
}

impl SharedProbe {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape: Arc::new(Mutex::new(shape)),
        }
    }

    pub fn set(&self, shape: Shape) {
        *self.shape.lock().unwrap_or_else(|p| p.into_inner()) = shape;
    }

    /// Update only the position, keeping the size.
    pub fn set_position(&self, x: f64, y: f64) {
        let mut shape = self.shape.lock().unwrap_or_else(|p| p.into_inner());
        shape.x = x;
        shape.y = y;
    }

    /// Update only the size, keeping the position.
    pub fn set_size(&self, w: f64, h: f64) {
        let mut shape = self.shape.lock().unwrap_or_else(|p| p.into_inner());
        shape.w = w;
        shape.h = h;
    }
}

impl GeometryProbe for SharedProbe {
    fn current_geometry(&self) -> Shape {
        *self.shape.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Probe that moves a window along a circle around `base`, for headless
/// runs where there is no real window to measure.
pub struct ScriptedProbe {
    base: Shape,
    radius: f64,
    period_ms: u64,
    start_ms: u64,
    clock: Arc<dyn Clock>,
}

impl ScriptedProbe {
    /// A probe that never moves.
    pub fn fixed(base: Shape, clock: Arc<dyn Clock>) -> Self {
        Self::orbit(base, 0.0, 1, clock)
    }

    pub fn orbit(base: Shape, radius: f64, period_ms: u64, clock: Arc<dyn Clock>) -> Self {
        let start_ms = clock.now_ms();
        Self {
            base,
            radius,
            period_ms: period_ms.max(1),
            start_ms,
            clock,
        }
    }
}

impl GeometryProbe for ScriptedProbe {
    fn current_geometry(&self) -> Shape {
        if self.radius == 0.0 {
            return self.base;
        }
        let elapsed = self.clock.now_ms().saturating_sub(self.start_ms) % self.period_ms;
        let angle = TAU * elapsed as f64 / self.period_ms as f64;
        // Screen coordinates are whole pixels; rounding keeps sub-pixel
        // jitter from counting as movement.
        Shape {
            x: (self.base.x + self.radius * angle.cos()).round(),
            y: (self.base.y + self.radius * angle.sin()).round(),
            ..self.base
        }
    }
}
