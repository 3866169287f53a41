//! Validation for the window and scene sections.

use crate::schema::SyncConfig;

use super::helpers::{validate_range, validate_range_f64, validate_range_u64};

/// Validate window size and settle delay.
pub(crate) fn validate_window(errors: &mut Vec<String>, config: &SyncConfig) {
    validate_range(errors, "window.width", config.window.width, 100, 8192);
    validate_range(errors, "window.height", config.window.height, 100, 8192);
    validate_range_u64(
        errors,
        "window.settle_delay_ms",
        config.window.settle_delay_ms,
        0,
        5000,
    );
}

/// Validate scene smoothing.
pub(crate) fn validate_scene(errors: &mut Vec<String>, config: &SyncConfig) {
    validate_range_f64(errors, "scene.falloff", config.scene.falloff, 0.001, 1.0);
    validate_range(errors, "scene.frame_rate", config.scene.frame_rate, 1, 240);
}
