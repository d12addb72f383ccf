//! The ordered set of tracked changes for one document.
//!
//! The list keeps its entries sorted by range start and maximally
//! consolidated: after every successful mutation no two entries can merge and
//! no two entries share a character. Ranges are assumed to be in the current
//! document coordinates; shifting them on unrelated edits happens elsewhere.

use crate::{error::Result, Error, Offset, Range, RawTrackedChange, TrackedChange};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Sorted, consolidated tracked changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RawTrackedChange>", into = "Vec<RawTrackedChange>")]
pub struct TrackedChangeList {
    changes: Vec<TrackedChange>,
}

impl TrackedChangeList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Load a list from raw records, consolidating as it goes.
    pub fn from_raw(raw: Vec<RawTrackedChange>) -> Result<Self> {
        let mut list = Self::new();
        for change in raw {
            list.add(TrackedChange::from_raw(change)?)?;
        }
        Ok(list)
    }

    pub fn to_raw(&self) -> Vec<RawTrackedChange> {
        self.changes.iter().map(TrackedChange::to_raw).collect()
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::malformed)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::malformed)
    }

    /// Add a tracked change and fold it into any neighbours it can merge with.
    ///
    /// If the consolidated result would leave changes of different
    /// attribution overlapping, the change is rejected and the list is left
    /// as it was.
    pub fn add(&mut self, change: TrackedChange) -> Result<()> {
        let incoming = *change.range();
        let attribution = change.tracking().clone();
        let mut changes = self.changes.clone();
        let index =
            changes.partition_point(|existing| existing.range().start() <= incoming.start());
        trace!(index, range = %incoming, "inserting tracked change");
        changes.insert(index, change);
        consolidate(&mut changes)?;

        if let Some((a, b)) = find_overlap(&changes) {
            // After consolidation exactly one entry carries the incoming
            // attribution and covers the incoming range.
            let holds_incoming = |entry: &TrackedChange| {
                entry.tracking().same_attribution(&attribution)
                    && entry.range().contains(&incoming)
            };
            let existing = if holds_incoming(a) { b } else { a };
            debug!(
                existing = %existing.range(),
                %incoming,
                "rejecting overlapping tracked change"
            );
            return Err(Error::OverlappingChanges {
                existing: *existing.range(),
                incoming,
            });
        }

        self.changes = changes;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedChange> {
        self.changes.iter()
    }

    pub fn as_slice(&self) -> &[TrackedChange] {
        &self.changes
    }

    /// Changes whose range holds a cursor placed at `pos`, edges included.
    pub fn at(&self, pos: Offset) -> impl Iterator<Item = &TrackedChange> {
        self.changes
            .iter()
            .filter(move |change| change.range().contains_cursor(pos))
    }

    /// Changes lying entirely within `range`.
    pub fn in_range<'a>(&'a self, range: &'a Range) -> impl Iterator<Item = &'a TrackedChange> {
        self.changes
            .iter()
            .filter(move |change| range.contains(change.range()))
    }

    /// Remove and return every change lying entirely within `range`.
    ///
    /// Used when a span is accepted or rejected.
    pub fn remove_in_range(&mut self, range: &Range) -> Vec<TrackedChange> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.changes)
            .into_iter()
            .partition(|change| range.contains(change.range()));
        self.changes = kept;
        if !removed.is_empty() {
            debug!(%range, count = removed.len(), "removed tracked changes");
        }
        removed
    }
}

/// Merge every pair that can merge until none are left. `changes` must be
/// sorted by start.
fn consolidate(changes: &mut Vec<TrackedChange>) -> Result<()> {
    let mut i = 0;
    while i < changes.len() {
        let mut j = i + 1;
        // Sorted by start, so nothing past the first entry starting beyond
        // our end can touch us.
        while j < changes.len() && changes[j].range().start() <= changes[i].range().end() {
            if changes[i].can_merge(&changes[j]) {
                let other = changes.remove(j);
                debug!(
                    into = %changes[i].range(),
                    from = %other.range(),
                    user = changes[i].tracking().user_id(),
                    "consolidating tracked changes"
                );
                changes[i].merge(other)?;
                // The range grew; rescan the candidates after it.
                j = i + 1;
            } else {
                j += 1;
            }
        }
        i += 1;
    }
    Ok(())
}

/// First pair of entries that overlap. `changes` must be sorted by start.
fn find_overlap(changes: &[TrackedChange]) -> Option<(&TrackedChange, &TrackedChange)> {
    changes.iter().enumerate().find_map(|(i, a)| {
        changes[i + 1..]
            .iter()
            .take_while(|b| b.range().start() <= a.range().end())
            .find(|b| a.range().overlaps(b.range()))
            .map(|b| (a, b))
    })
}

impl TryFrom<Vec<RawTrackedChange>> for TrackedChangeList {
    type Error = Error;

    fn try_from(raw: Vec<RawTrackedChange>) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl From<TrackedChangeList> for Vec<RawTrackedChange> {
    fn from(list: TrackedChangeList) -> Self {
        list.to_raw()
    }
}

impl<'a> IntoIterator for &'a TrackedChangeList {
    type Item = &'a TrackedChange;
    type IntoIter = std::slice::Iter<'a, TrackedChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChangeKind, Timestamp, TrackingProps};
    use serde_json::json;

    fn change(kind: ChangeKind, user: &str, pos: usize, length: usize, ts: i64) -> TrackedChange {
        TrackedChange::new(
            Range::new(pos, length),
            TrackingProps::new(kind, user, Timestamp::from_millis(ts).unwrap()).unwrap(),
        )
    }

    fn insertion(user: &str, pos: usize, length: usize, ts: i64) -> TrackedChange {
        change(ChangeKind::Insertion, user, pos, length, ts)
    }

    fn ranges(list: &TrackedChangeList) -> Vec<Range> {
        list.iter().map(|c| *c.range()).collect()
    }

    #[test]
    fn add_keeps_sorted() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 20, 2, 1)).unwrap();
        list.add(insertion("u1", 0, 2, 1)).unwrap();
        list.add(insertion("u1", 10, 2, 1)).unwrap();
        assert_eq!(
            ranges(&list),
            vec![Range::new(0, 2), Range::new(10, 2), Range::new(20, 2)]
        );
    }

    #[test]
    fn add_consolidates_adjacent() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("U1", 10, 5, 100)).unwrap();
        list.add(insertion("U1", 15, 5, 200)).unwrap();

        assert_eq!(list.len(), 1);
        let merged = &list.as_slice()[0];
        assert_eq!(*merged.range(), Range::new(10, 10));
        assert_eq!(merged.tracking().kind(), ChangeKind::Insertion);
        assert_eq!(merged.tracking().user_id(), "U1");
        assert_eq!(merged.tracking().ts(), Timestamp::from_millis(200).unwrap());
    }

    #[test]
    fn add_bridges_two_neighbours() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 0, 5, 100)).unwrap();
        list.add(insertion("u1", 8, 2, 300)).unwrap();
        list.add(insertion("u1", 5, 3, 200)).unwrap();
        assert_eq!(ranges(&list), vec![Range::new(0, 10)]);
        assert_eq!(
            list.as_slice()[0].tracking().ts(),
            Timestamp::from_millis(300).unwrap()
        );
    }

    #[test]
    fn different_users_stay_separate() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 0, 5, 100)).unwrap();
        list.add(insertion("u2", 5, 5, 100)).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn merge_across_foreign_insertion_point() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 0, 10, 100)).unwrap();
        list.add(insertion("u1", 14, 2, 100)).unwrap();
        list.add(insertion("u2", 12, 0, 100)).unwrap();
        list.add(insertion("u1", 10, 2, 200)).unwrap();
        assert_eq!(
            ranges(&list),
            vec![Range::new(0, 12), Range::new(12, 0), Range::new(14, 2)]
        );
    }

    #[test]
    fn merge_swallowing_foreign_point_rejected() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 0, 10, 100)).unwrap();
        list.add(insertion("u2", 10, 0, 100)).unwrap();
        let before = list.clone();

        let err = list.add(insertion("u1", 10, 2, 200)).unwrap_err();
        assert_eq!(
            err,
            Error::OverlappingChanges {
                existing: Range::new(10, 0),
                incoming: Range::new(10, 2),
            }
        );
        assert_eq!(list, before);
    }

    #[test]
    fn foreign_point_inside_rejected() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 0, 10, 100)).unwrap();
        assert!(list.add(insertion("u2", 5, 0, 100)).is_err());
        assert!(list.add(insertion("u2", 0, 0, 100)).is_ok());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn overlapping_incompatible_rejected() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 0, 5, 100)).unwrap();
        let before = list.clone();

        let err = list.add(insertion("u2", 3, 4, 200)).unwrap_err();
        assert_eq!(
            err,
            Error::OverlappingChanges {
                existing: Range::new(0, 5),
                incoming: Range::new(3, 4),
            }
        );
        assert_eq!(list, before);

        let err = list
            .add(change(ChangeKind::Deletion, "u1", 2, 1, 200))
            .unwrap_err();
        assert_eq!(
            err,
            Error::OverlappingChanges {
                existing: Range::new(0, 5),
                incoming: Range::new(2, 1),
            }
        );
    }

    #[test]
    fn change_strictly_inside_reports_enclosing_range() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 0, 10, 100)).unwrap();

        let err = list.add(insertion("u2", 3, 2, 200)).unwrap_err();
        assert_eq!(
            err,
            Error::OverlappingChanges {
                existing: Range::new(0, 10),
                incoming: Range::new(3, 2),
            }
        );
        assert_eq!(ranges(&list), vec![Range::new(0, 10)]);
    }

    #[test]
    fn change_enclosing_foreign_reports_enclosed_range() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 3, 2, 100)).unwrap();

        let err = list.add(insertion("u2", 0, 10, 200)).unwrap_err();
        assert_eq!(
            err,
            Error::OverlappingChanges {
                existing: Range::new(3, 2),
                incoming: Range::new(0, 10),
            }
        );
    }

    #[test]
    fn overlapping_compatible_merges() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 0, 5, 100)).unwrap();
        list.add(insertion("u1", 3, 5, 50)).unwrap();
        assert_eq!(ranges(&list), vec![Range::new(0, 8)]);
        assert_eq!(
            list.as_slice()[0].tracking().ts(),
            Timestamp::from_millis(100).unwrap()
        );
    }

    #[test]
    fn at_and_in_range() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 0, 5, 1)).unwrap();
        list.add(insertion("u2", 5, 5, 1)).unwrap();
        list.add(insertion("u1", 20, 5, 1)).unwrap();

        assert_eq!(list.at(5).count(), 2);
        assert_eq!(list.at(15).count(), 0);

        let window = Range::new(0, 10);
        let inside: Vec<_> = list.in_range(&window).map(|c| *c.range()).collect();
        assert_eq!(inside, vec![Range::new(0, 5), Range::new(5, 5)]);
    }

    #[test]
    fn remove_in_range() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 0, 5, 1)).unwrap();
        list.add(insertion("u2", 5, 5, 1)).unwrap();
        list.add(insertion("u1", 20, 5, 1)).unwrap();

        let removed = list.remove_in_range(&Range::new(4, 8));
        assert_eq!(removed.len(), 1);
        assert_eq!(*removed[0].range(), Range::new(5, 5));
        assert_eq!(ranges(&list), vec![Range::new(0, 5), Range::new(20, 5)]);

        assert!(list.remove_in_range(&Range::new(100, 1)).is_empty());
    }

    #[test]
    fn from_raw_consolidates() {
        let raw = json!([
            {"range": {"pos": 15, "length": 5}, "tracking": {"type": "insertion", "userId": "U1", "ts": 200}},
            {"range": {"pos": 10, "length": 5}, "tracking": {"type": "insertion", "userId": "U1", "ts": 100}}
        ]);
        let list: TrackedChangeList = serde_json::from_value(raw).unwrap();
        assert_eq!(
            serde_json::to_value(&list).unwrap(),
            json!([
                {"range": {"pos": 10, "length": 10}, "tracking": {"type": "insertion", "userId": "U1", "ts": 200}}
            ])
        );
    }

    #[test]
    fn json_roundtrip() {
        let mut list = TrackedChangeList::new();
        list.add(insertion("u1", 0, 5, 1)).unwrap();
        list.add(change(ChangeKind::Deletion, "u2", 9, 2, 7)).unwrap();
        let json = list.to_json().unwrap();
        assert_eq!(TrackedChangeList::from_json(&json).unwrap(), list);
    }

    #[test]
    fn from_json_rejects_overlap() {
        let json = r#"[
            {"range": {"pos": 0, "length": 5}, "tracking": {"type": "insertion", "userId": "a", "ts": 1}},
            {"range": {"pos": 2, "length": 5}, "tracking": {"type": "insertion", "userId": "b", "ts": 1}}
        ]"#;
        let err = TrackedChangeList::from_json(json).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_change() -> impl Strategy<Value = TrackedChange> {
            (
                prop_oneof![Just(ChangeKind::Insertion), Just(ChangeKind::Deletion)],
                prop_oneof![Just("u1"), Just("u2"), Just("u3")],
                0usize..60,
                0usize..8,
                0i64..1000,
            )
                .prop_map(|(kind, user, pos, length, ts)| change(kind, user, pos, length, ts))
        }

        proptest! {
            #[test]
            fn prop_list_invariants(changes in proptest::collection::vec(arb_change(), 0..30)) {
                let mut list = TrackedChangeList::new();
                for change in changes {
                    // Rejected adds must leave the list intact, so ignore them.
                    let _ = list.add(change);
                }

                let entries = list.as_slice();
                for (i, a) in entries.iter().enumerate() {
                    if i + 1 < entries.len() {
                        prop_assert!(a.range().start() <= entries[i + 1].range().start());
                    }
                    for b in &entries[i + 1..] {
                        prop_assert!(!a.can_merge(b), "{:?} and {:?} left unmerged", a, b);
                        prop_assert!(!a.range().overlaps(b.range()));
                    }
                }
            }

            #[test]
            fn prop_add_order_independent_for_one_author(
                spans in proptest::collection::vec((0usize..60, 1usize..8, 0i64..1000), 1..20)
            ) {
                let forward: Vec<_> = spans
                    .iter()
                    .map(|&(pos, length, ts)| insertion("u1", pos, length, ts))
                    .collect();

                let mut a = TrackedChangeList::new();
                for change in forward.iter().cloned() {
                    a.add(change).unwrap();
                }
                let mut b = TrackedChangeList::new();
                for change in forward.into_iter().rev() {
                    b.add(change).unwrap();
                }
                prop_assert_eq!(ranges(&a), ranges(&b));
                let ts_a: Vec<_> = a.iter().map(|c| c.tracking().ts()).collect();
                let ts_b: Vec<_> = b.iter().map(|c| c.tracking().ts()).collect();
                prop_assert_eq!(ts_a, ts_b);
            }
        }
    }
}
