//! Validation for coordinator timing and store settings.

use crate::schema::SyncConfig;

use super::helpers::{validate_range, validate_range_u64};

/// Validate heartbeat, staleness, and polling constraints.
pub(crate) fn validate_coordinator(errors: &mut Vec<String>, config: &SyncConfig) {
    let c = &config.coordinator;
    validate_range_u64(
        errors,
        "coordinator.heartbeat_interval_ms",
        c.heartbeat_interval_ms,
        100,
        60_000,
    );
    validate_range(
        errors,
        "coordinator.stale_after_missed",
        c.stale_after_missed,
        0,
        100,
    );
    validate_range_u64(
        errors,
        "coordinator.poll_interval_ms",
        c.poll_interval_ms,
        16,
        10_000,
    );
    validate_range(errors, "coordinator.id_retry_limit", c.id_retry_limit, 1, 64);

    // A window whose heartbeat is pruned before it can fire would flap.
    if c.stale_after_missed == 1 {
        errors.push(
            "coordinator.stale_after_missed = 1 prunes live windows between heartbeats; use 0 or >= 2"
                .into(),
        );
    }
}

/// Validate store constraints.
pub(crate) fn validate_store(errors: &mut Vec<String>, config: &SyncConfig) {
    let key = &config.store.key;
    if key.is_empty() {
        errors.push("store.key must not be empty".into());
    } else if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        errors.push(format!(
            "store.key = {key:?} may only contain [A-Za-z0-9_-]"
        ));
    }
}
