pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ConfigError, CoordinatorError, StoreError, SyncError};
pub use events::{CoordinatorEvent, EventBus};
pub use id::{new_correlation_id, new_id, WindowId};
pub use types::{Color, Metadata, Shape};

pub type Result<T> = std::result::Result<T, SyncError>;
