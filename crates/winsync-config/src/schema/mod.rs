//! Configuration schema types for winsync.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults documented on each field.

mod coordinator;
mod scene;
mod store;
mod system;
mod window;

pub use coordinator::*;
pub use scene::*;
pub use store::*;
pub use system::*;
pub use window::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct SyncConfig {
    pub coordinator: CoordinatorConfig,
    pub store: StoreConfig,
    pub window: WindowConfig,
    pub scene: SceneConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================
