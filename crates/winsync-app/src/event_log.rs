//! Log lines for coordinator lifecycle events, shared by both drivers.

use tracing::{debug, info};

use winsync_common::CoordinatorEvent;

pub fn log_event(event: &CoordinatorEvent) {
    match event {
        CoordinatorEvent::RosterChanged { count, .. } => {
            info!(windows = count, "roster changed");
        }
        CoordinatorEvent::Pruned(id) => {
            info!(window_id = %id, "sibling window timed out");
        }
        event => debug!(?event, "coordinator event"),
    }
}
