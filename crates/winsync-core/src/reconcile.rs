//! Pure roster reconciliation.
//!
//! Both triggers (store notification and fallback poll) end up here. The
//! function never touches the store or any timer, so every decision about
//! what changed is testable from plain values.

use std::collections::HashSet;
use std::time::Duration;

use tracing::warn;
use winsync_common::{Shape, WindowId};

use crate::record::{decode_list, WindowRecord};

/// What the local window knows about itself when reconciling.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    /// This window's id, once initialized.
    pub own_id: Option<&'a WindowId>,
    /// The shape this window last published.
    pub own_shape: Option<&'a Shape>,
    pub now_ms: u64,
    /// Age after which foreign records are dropped; `None` disables pruning.
    pub stale_after: Option<Duration>,
}

/// Result of reconciling the previous roster against the stored list.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub roster: Vec<WindowRecord>,
    /// Ids, order, shapes, or metadata differ from the previous roster.
    pub roster_changed: bool,
    /// Foreign records dropped because their owner stopped refreshing them.
    pub pruned: Vec<WindowId>,
    /// This window is initialized but absent from the stored list.
    pub own_missing: bool,
    /// The stored copy of this window's record has a shape other than the
    /// one it last published.
    pub own_shape_diverged: bool,
    /// The stored value could not be parsed and was treated as empty.
    pub malformed: bool,
}

/// Reconcile `previous` against the raw stored value.
pub fn reconcile(
    previous: &[WindowRecord],
    raw: Option<&str>,
    ctx: &ReconcileContext<'_>,
) -> Reconciliation {
    let (parsed, malformed) = parse_roster(raw);
    let (roster, pruned) = retain_live(dedupe(parsed), ctx.own_id, ctx.now_ms, ctx.stale_after);

    let own_record = ctx
        .own_id
        .and_then(|id| roster.iter().find(|r| &r.id == id));
    let own_missing = ctx.own_id.is_some() && own_record.is_none();
    let own_shape_diverged = match (own_record, ctx.own_shape) {
        (Some(record), Some(published)) => record.shape != *published,
        _ => false,
    };

    Reconciliation {
        roster_changed: roster_differs(previous, &roster, None),
        roster,
        pruned,
        own_missing,
        own_shape_diverged,
        malformed,
    }
}

/// Decode the stored list, substituting an empty list for bad content.
///
/// Returns the list and whether the content was malformed.
pub fn parse_roster(raw: Option<&str>) -> (Vec<WindowRecord>, bool) {
    match decode_list(raw) {
        Ok(list) => (list, false),
        Err(e) => {
            warn!("shared window list is malformed, treating as empty: {e}");
            (Vec::new(), true)
        }
    }
}

/// Drop repeated ids, keeping the first occurrence.
pub fn dedupe(records: Vec<WindowRecord>) -> Vec<WindowRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

/// Whether a foreign record is past its staleness window.
///
/// A record without a liveness stamp has never been refreshed and is stale
/// whenever pruning is enabled. Stamps from the future are treated as fresh.
pub fn is_stale(record: &WindowRecord, now_ms: u64, stale_after: Option<Duration>) -> bool {
    let Some(limit) = stale_after else {
        return false;
    };
    match record.seen_at {
        Some(seen) => u128::from(now_ms.saturating_sub(seen)) > limit.as_millis(),
        None => true,
    }
}

/// Split off stale foreign records. This window's own record is never
/// pruned: it is alive by definition.
pub fn retain_live(
    records: Vec<WindowRecord>,
    own_id: Option<&WindowId>,
    now_ms: u64,
    stale_after: Option<Duration>,
) -> (Vec<WindowRecord>, Vec<WindowId>) {
    let mut pruned = Vec::new();
    let live = records
        .into_iter()
        .filter(|r| {
            let keep = Some(&r.id) == own_id || !is_stale(r, now_ms, stale_after);
            if !keep {
                pruned.push(r.id.clone());
            }
            keep
        })
        .collect();
    (live, pruned)
}

/// Whether two rosters differ in id order or in any record's content.
///
/// With `ignore` set, that window's own shape and metadata are not
/// compared (its position in the order still is).
pub fn roster_differs(
    previous: &[WindowRecord],
    next: &[WindowRecord],
    ignore: Option<&WindowId>,
) -> bool {
    if previous.len() != next.len() {
        return true;
    }
    previous.iter().zip(next).any(|(a, b)| {
        if a.id != b.id {
            return true;
        }
        if Some(&a.id) == ignore {
            return false;
        }
        !a.same_content(b)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::encode_list;
    use winsync_common::Metadata;

    fn rec(id: &str, x: f64, seen_at: Option<u64>) -> WindowRecord {
        WindowRecord {
            id: WindowId::from(id),
            shape: Shape::new(x, 0.0, 800.0, 600.0),
            metadata: Metadata::new(),
            seen_at,
        }
    }

    fn ctx<'a>(own: Option<&'a WindowId>, shape: Option<&'a Shape>, now: u64) -> ReconcileContext<'a> {
        ReconcileContext {
            own_id: own,
            own_shape: shape,
            now_ms: now,
            stale_after: Some(Duration::from_millis(5_000)),
        }
    }

    #[test]
    fn identical_list_is_a_no_op() {
        let previous = vec![rec("a", 0.0, Some(100)), rec("b", 800.0, Some(100))];
        let raw = encode_list(&previous).unwrap();
        let out = reconcile(&previous, Some(&raw), &ctx(None, None, 200));
        assert!(!out.roster_changed);
        assert_eq!(out.roster, previous);
        assert!(out.pruned.is_empty());
    }

    #[test]
    fn heartbeat_only_is_not_a_change() {
        let previous = vec![rec("a", 0.0, Some(100))];
        let raw = encode_list(&[rec("a", 0.0, Some(1_100))]).unwrap();
        let out = reconcile(&previous, Some(&raw), &ctx(None, None, 1_200));
        assert!(!out.roster_changed);
        assert_eq!(out.roster[0].seen_at, Some(1_100));
    }

    #[test]
    fn new_window_and_moves_are_changes() {
        let previous = vec![rec("a", 0.0, Some(100))];

        let joined = encode_list(&[rec("a", 0.0, Some(100)), rec("b", 800.0, Some(100))]).unwrap();
        assert!(reconcile(&previous, Some(&joined), &ctx(None, None, 200)).roster_changed);

        let moved = encode_list(&[rec("a", 100.0, Some(100))]).unwrap();
        assert!(reconcile(&previous, Some(&moved), &ctx(None, None, 200)).roster_changed);
    }

    #[test]
    fn reorder_is_a_change() {
        let previous = vec![rec("a", 0.0, Some(1)), rec("b", 0.0, Some(1))];
        let raw = encode_list(&[rec("b", 0.0, Some(1)), rec("a", 0.0, Some(1))]).unwrap();
        assert!(reconcile(&previous, Some(&raw), &ctx(None, None, 2)).roster_changed);
    }

    #[test]
    fn malformed_content_becomes_empty() {
        let previous = vec![rec("a", 0.0, Some(1))];
        let out = reconcile(&previous, Some("<<garbage>>"), &ctx(None, None, 2));
        assert!(out.malformed);
        assert!(out.roster.is_empty());
        assert!(out.roster_changed);
    }

    #[test]
    fn missing_key_on_empty_roster_is_a_no_op() {
        let out = reconcile(&[], None, &ctx(None, None, 0));
        assert!(!out.roster_changed);
        assert!(!out.malformed);
    }

    #[test]
    fn stale_foreign_records_are_pruned() {
        let previous = vec![rec("a", 0.0, Some(10_000)), rec("c", 0.0, Some(1_000))];
        let raw = encode_list(&previous).unwrap();
        let own = WindowId::from("a");
        let out = reconcile(&previous, Some(&raw), &ctx(Some(&own), None, 10_000));
        assert_eq!(out.pruned, vec![WindowId::from("c")]);
        assert_eq!(out.roster.len(), 1);
        assert!(out.roster_changed);
    }

    #[test]
    fn own_record_is_never_pruned() {
        let own = WindowId::from("a");
        let list = vec![rec("a", 0.0, Some(0))];
        let raw = encode_list(&list).unwrap();
        let out = reconcile(&list, Some(&raw), &ctx(Some(&own), None, 1_000_000));
        assert!(out.pruned.is_empty());
        assert_eq!(out.roster.len(), 1);
    }

    #[test]
    fn records_without_stamp_are_stale_only_when_pruning() {
        let r = rec("x", 0.0, None);
        assert!(is_stale(&r, 0, Some(Duration::from_secs(5))));
        assert!(!is_stale(&r, 0, None));
    }

    #[test]
    fn future_stamps_are_fresh() {
        let r = rec("x", 0.0, Some(50_000));
        assert!(!is_stale(&r, 1_000, Some(Duration::from_millis(10))));
    }

    #[test]
    fn staleness_boundary_is_exclusive() {
        let r = rec("x", 0.0, Some(1_000));
        let limit = Some(Duration::from_millis(5_000));
        assert!(!is_stale(&r, 6_000, limit));
        assert!(is_stale(&r, 6_001, limit));
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let raw = encode_list(&[rec("a", 1.0, Some(1)), rec("a", 2.0, Some(1))]).unwrap();
        let out = reconcile(&[], Some(&raw), &ctx(None, None, 1));
        assert_eq!(out.roster.len(), 1);
        assert_eq!(out.roster[0].shape.x, 1.0);
    }

    #[test]
    fn detects_own_missing_and_diverged() {
        let own = WindowId::from("a");
        let published = Shape::new(0.0, 0.0, 800.0, 600.0);

        let without_self = encode_list(&[rec("b", 0.0, Some(1))]).unwrap();
        let out = reconcile(&[], Some(&without_self), &ctx(Some(&own), Some(&published), 1));
        assert!(out.own_missing);
        assert!(!out.own_shape_diverged);

        let rewritten = encode_list(&[rec("a", 55.0, Some(1))]).unwrap();
        let out = reconcile(&[], Some(&rewritten), &ctx(Some(&own), Some(&published), 1));
        assert!(!out.own_missing);
        assert!(out.own_shape_diverged);
    }

    #[test]
    fn roster_differs_can_ignore_one_window() {
        let a = vec![rec("a", 0.0, None), rec("b", 0.0, None)];
        let moved_self = vec![rec("a", 99.0, None), rec("b", 0.0, None)];
        let own = WindowId::from("a");
        assert!(roster_differs(&a, &moved_self, None));
        assert!(!roster_differs(&a, &moved_self, Some(&own)));

        let moved_other = vec![rec("a", 0.0, None), rec("b", 99.0, None)];
        assert!(roster_differs(&a, &moved_other, Some(&own)));
    }
}
