//! Consumer scene configuration types.

use serde::{Deserialize, Serialize};

/// Smoothing applied by the scene consumer when chasing window targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Fraction of the remaining distance covered per frame
    /// (valid range: 0.001-1.0).
    pub falloff: f64,
    /// Frame rate of the driver loop (valid range: 1-240).
    pub frame_rate: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            falloff: 0.05,
            frame_rate: 60,
        }
    }
}
