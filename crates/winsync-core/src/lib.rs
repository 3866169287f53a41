//! Cross-window registry and synchronization engine.
//!
//! Every window owns one [`WindowRecord`] in a shared store. The
//! [`WindowCoordinator`] publishes that record, listens for sibling writes,
//! and keeps an ordered roster of all live windows. The roster is always
//! derived from the store through [`reconcile`], never edited in place.

pub mod clock;
pub mod coordinator;
pub mod geometry;
pub mod reconcile;
pub mod record;

pub use clock::{seconds_since_midnight, Clock, ManualClock, SystemClock};
pub use coordinator::WindowCoordinator;
pub use geometry::{GeometryProbe, ScriptedProbe, SharedProbe};
pub use reconcile::{reconcile, ReconcileContext, Reconciliation};
pub use record::WindowRecord;
