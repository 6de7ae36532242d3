//! Property tests for the reconciler.
//!
//! 1. Replaying emitted operations on the old sequence yields the new one.
//! 2. The mirror equals the new sequence afterwards.
//! 3. A sequence diffed against itself emits nothing.
//! 4. Every `Remove` precedes every other operation.
//! 5. Id lookup finds every present id from every start position.
//! 6. Direct notifications keep the mirror equal to the presented list.
//! 7. The per-item calculator obeys the same replay rule.

use proptest::prelude::*;
use seq_reconciler::{
    Differ, Item, ListChange, Mirror, Operation, ReconcilerConfig, locate, op_calculator,
    reconcile,
};
use std::collections::HashSet;

// ═══════════════════════════════════════════════════════════════════════════
// Strategy helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Sequences with unique ids drawn from a small pool so old and new overlap.
fn sequence_strategy() -> impl Strategy<Value = Vec<Item>> {
    prop::collection::vec((0u64..30, 0u32..3), 0..25).prop_map(|pairs| {
        let mut seen = HashSet::new();
        pairs
            .into_iter()
            .filter(|(id, _)| seen.insert(*id))
            .map(Item::from)
            .collect()
    })
}

fn diff(old: &[Item], new: &[Item]) -> (Vec<Operation>, Mirror) {
    let config = ReconcilerConfig::default();
    let mut mirror = Mirror::from_source(old, config.growth);
    let mut ops: Vec<Operation> = Vec::new();
    reconcile(&mut mirror, new, &mut ops, &config).unwrap();
    (ops, mirror)
}

fn replay(old: &[Item], new: &[Item], ops: &[Operation]) -> Vec<Item> {
    let mut replica = old.to_vec();
    for op in ops {
        op.apply_to(&mut replica, |i| new[i]);
    }
    replica
}

#[derive(Debug, Clone)]
enum Edit {
    Insert(usize, u64, u32),
    Remove(usize, usize),
    Change(usize, u32),
    Move(usize, usize),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0usize..40, 100u64..200, any::<u32>()).prop_map(|(p, id, h)| Edit::Insert(p, id, h)),
        (0usize..40, 1usize..4).prop_map(|(p, n)| Edit::Remove(p, n)),
        (0usize..40, any::<u32>()).prop_map(|(p, h)| Edit::Change(p, h)),
        (0usize..40, 0usize..40).prop_map(|(a, b)| Edit::Move(a, b)),
    ]
}

/// Applies `edit` to `list` (clamped to valid positions) and returns the
/// matching notification, or `None` if it does not apply.
fn apply_edit(list: &mut Vec<Item>, edit: &Edit) -> Option<ListChange> {
    match *edit {
        Edit::Insert(p, id, h) => {
            if list.iter().any(|item| item.id == id) {
                return None;
            }
            let p = p % (list.len() + 1);
            list.insert(p, Item::new(id, h));
            Some(ListChange::RangeInserted { position_start: p, count: 1 })
        }
        Edit::Remove(p, n) => {
            if list.is_empty() {
                return None;
            }
            let p = p % list.len();
            let n = n.min(list.len() - p);
            list.drain(p..p + n);
            Some(ListChange::RangeRemoved { position_start: p, count: n })
        }
        Edit::Change(p, h) => {
            if list.is_empty() {
                return None;
            }
            let p = p % list.len();
            list[p].content_hash = h;
            Some(ListChange::RangeChanged { position_start: p, count: 1 })
        }
        Edit::Move(a, b) => {
            if list.is_empty() {
                return None;
            }
            let from = a % list.len();
            let to = b % list.len();
            let item = list.remove(from);
            list.insert(to, item);
            Some(ListChange::RangeMoved { from, to, count: 1 })
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 1–4. Reconciler
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn replay_reproduces_new_sequence(
        old in sequence_strategy(),
        new in sequence_strategy(),
    ) {
        let (ops, mirror) = diff(&old, &new);
        prop_assert_eq!(replay(&old, &new, &ops), new.clone());
        prop_assert_eq!(mirror.to_vec(), new);
    }

    #[test]
    fn self_diff_is_empty(seq in sequence_strategy()) {
        let (ops, mirror) = diff(&seq, &seq);
        prop_assert!(ops.is_empty(), "expected no ops, got {:?}", ops);
        prop_assert_eq!(mirror.to_vec(), seq);
    }

    #[test]
    fn removals_come_first(
        old in sequence_strategy(),
        new in sequence_strategy(),
    ) {
        let (ops, _) = diff(&old, &new);
        let first_other = ops
            .iter()
            .position(|op| !matches!(op, Operation::Remove { .. }))
            .unwrap_or(ops.len());
        prop_assert!(
            ops[first_other..].iter().all(|op| !matches!(op, Operation::Remove { .. })),
            "remove after other ops: {:?}",
            ops
        );
    }

    #[test]
    fn ranges_are_never_empty(
        old in sequence_strategy(),
        new in sequence_strategy(),
    ) {
        let (ops, _) = diff(&old, &new);
        prop_assert!(ops.iter().all(|op| op.item_count() > 0));
        for op in &ops {
            if let Operation::Move { from, to } = *op {
                prop_assert_ne!(from, to);
            }
        }
    }

    #[test]
    fn chained_diffs_stay_consistent(
        a in sequence_strategy(),
        b in sequence_strategy(),
        c in sequence_strategy(),
    ) {
        let mut differ = Differ::with_current(ReconcilerConfig::default(), &a);
        let mut shown = a.clone();
        for next in [&b, &c] {
            let mut ops: Vec<Operation> = Vec::new();
            differ.diff(next, &mut ops).unwrap();
            for op in &ops {
                op.apply_to(&mut shown, |i| next[i]);
            }
            prop_assert_eq!(&shown, next);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 5. Locator
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn locate_finds_every_id_from_anywhere(
        seq in sequence_strategy(),
        start in 0usize..40,
    ) {
        let ids: Vec<u64> = seq.iter().map(|item| item.id).collect();
        for (k, &id) in ids.iter().enumerate() {
            prop_assert_eq!(locate(&ids, id, start), Some(k));
        }
        prop_assert_eq!(locate(&ids, 1_000, start), None);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 6. Direct notifications
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn notifications_track_presented_list(
        initial in sequence_strategy(),
        edits in prop::collection::vec(edit_strategy(), 0..30),
        next in sequence_strategy(),
    ) {
        let mut list = initial.clone();
        let mut differ = Differ::with_current(ReconcilerConfig::default(), &list);
        for edit in &edits {
            if let Some(change) = apply_edit(&mut list, edit) {
                differ.notify(change, &list);
            }
            prop_assert_eq!(differ.mirror().to_vec(), list.clone());
        }

        let mut ops: Vec<Operation> = Vec::new();
        differ.diff(&next, &mut ops).unwrap();
        prop_assert_eq!(replay(&list, &next, &ops), next);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 7. Per-item calculator
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn per_item_ops_replay(
        old in sequence_strategy(),
        new in sequence_strategy(),
    ) {
        let ids = |s: &[Item]| s.iter().map(|item| item.id).collect::<Vec<_>>();
        let hashes = |s: &[Item]| s.iter().map(|item| item.content_hash).collect::<Vec<_>>();
        let ops = op_calculator::calculate(&ids(&old), &hashes(&old), &ids(&new), &hashes(&new))
            .unwrap();
        prop_assert!(ops.iter().all(|op| op.item_count() == 1));
        prop_assert_eq!(replay(&old, &new, &ops), new);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Fixed scenarios
// ═══════════════════════════════════════════════════════════════════════════

fn chars(s: &str) -> Vec<Item> {
    s.chars().map(|c| Item::new(c as u64, c as u32)).collect()
}

#[test]
fn letters_scenario_round_trips() {
    let old = chars("ebfacd");
    let new = chars("fghe");
    let (ops, mirror) = diff(&old, &new);
    assert_eq!(replay(&old, &new, &ops), new);
    assert_eq!(mirror.to_vec(), new);
    let removes = ops
        .iter()
        .take_while(|op| matches!(op, Operation::Remove { .. }))
        .map(Operation::item_count)
        .sum::<usize>();
    assert_eq!(removes, 4);
}

#[test]
fn move_only_scenario() {
    let old = vec![Item::new(1, 0), Item::new(2, 0), Item::new(3, 0)];
    let new = vec![Item::new(2, 0), Item::new(1, 0), Item::new(3, 0)];
    let (ops, _) = diff(&old, &new);
    assert_eq!(ops, vec![Operation::Move { from: 1, to: 0 }]);
}
