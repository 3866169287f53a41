//! Window configuration types.

use serde::{Deserialize, Serialize};

/// Settings for the window opened by the windowed driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Static title prefix; the roster position is appended.
    pub title: String,
    /// Initial inner width in logical pixels (valid range: 100-8192).
    pub width: u32,
    /// Initial inner height in logical pixels (valid range: 100-8192).
    pub height: u32,
    /// Delay before the first geometry sample, in milliseconds. Some
    /// platforms report a wrong position right after the window appears
    /// (valid range: 0-5000).
    pub settle_delay_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "winsync".into(),
            width: 800,
            height: 600,
            settle_delay_ms: 500,
        }
    }
}
