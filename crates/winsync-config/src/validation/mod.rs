//! Full configuration validation.
//!
//! Validates numeric ranges and the store key format. Each section has
//! its own submodule; this orchestrator calls them all and collects errors
//! into a single `ConfigError`.

mod coordinator;
mod helpers;
mod window;


use crate::schema::SyncConfig;
use winsync_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &SyncConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    coordinator::validate_coordinator(&mut errors, config);
    coordinator::validate_store(&mut errors, config);
    window::validate_window(&mut errors, config);
    window::validate_scene(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
