//! Top-level application state.
//!
//! Implements `winit::application::ApplicationHandler` to drive the main
//! event loop. Feeds window geometry to the coordinator and its roster to
//! the scene.

mod core;
mod event_handler;
mod init;
mod polling;
mod shutdown;
mod title;
mod types;

pub use self::core::SyncApp;
