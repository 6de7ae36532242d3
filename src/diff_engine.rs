//! Core two-pass reconciler.
//!
//! Turns the mirror (old sequence) into the new sequence in place and emits
//! the operations that take a presented list along the same path:
//!
//! 1. Materialize the new sequence once, rejecting duplicate ids on either
//!    side.
//! 2. Left to right over the mirror, drop every id the new sequence lacks,
//!    coalescing contiguous drops into one `Remove`.
//! 3. Left to right over the new sequence, insert unknown ids (coalesced into
//!    `Insert` runs), move known ids into place one `Move` at a time, and
//!    refresh content hashes (coalesced into `Change` runs).
//!
//! Every operation's positions refer to the list as left by the operations
//! before it, so a consumer can apply them one by one.
use crate::config::ReconcilerConfig;
use crate::errors::{ReconcileError, Result};
use crate::mirror::Mirror;
use crate::sink::OperationSink;
use crate::types::{ItemId, Operation, SequenceSource};
use log::{debug, trace};
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// What one reconciliation emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Items removed, summed over all `Remove` ranges.
    pub removed: usize,
    pub inserted: usize,
    pub moved: usize,
    pub changed: usize,
    /// Number of operations handed to the sink.
    pub operations: usize,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        self.operations == 0
    }
}

/// Open run of same-kind positions that has not been emitted yet.
#[derive(Debug, Clone, Copy)]
struct PendingRange {
    start: usize,
    count: usize,
}

impl PendingRange {
    fn extend(range: &mut Option<PendingRange>, position: usize) {
        match range {
            Some(r) => {
                debug_assert_eq!(r.start + r.count, position, "pending range must stay contiguous");
                r.count += 1;
            }
            None => {
                *range = Some(PendingRange {
                    start: position,
                    count: 1,
                })
            }
        }
    }
}

pub struct DiffEngine<'a, K: OperationSink + ?Sized> {
    mirror: &'a mut Mirror,
    sink: &'a mut K,
    config: &'a ReconcilerConfig,
    summary: DiffSummary,
}

impl<'a, K: OperationSink + ?Sized> DiffEngine<'a, K> {
    pub fn new(mirror: &'a mut Mirror, sink: &'a mut K, config: &'a ReconcilerConfig) -> Self {
        DiffEngine {
            mirror,
            sink,
            config,
            summary: DiffSummary::default(),
        }
    }

    /// Reconciles the mirror against `new`.
    ///
    /// On error nothing has been emitted and the mirror is untouched.
    pub fn reconcile<S: SequenceSource + ?Sized>(mut self, new: &S) -> Result<DiffSummary> {
        let target = self.materialize(new)?;
        debug!(
            "DiffEngine: reconciling {} presented item(s) against {} new item(s)",
            self.mirror.len(),
            target.len()
        );

        self.mirror.ensure_capacity(target.len());
        self.remove_missing(&target);
        self.place_new(&target);

        debug_assert_eq!(self.mirror.ids(), target.ids());
        debug!(
            "DiffEngine: {} operation(s): {} removed, {} inserted, {} moved, {} changed",
            self.summary.operations,
            self.summary.removed,
            self.summary.inserted,
            self.summary.moved,
            self.summary.changed
        );
        Ok(self.summary)
    }

    fn materialize<S: SequenceSource + ?Sized>(&self, new: &S) -> Result<Mirror> {
        let target = Mirror::from_source(new, self.mirror.growth());
        if self.config.check_unique_ids {
            // Duplicates can reach the mirror through its constructors or
            // direct notifications, so both sides are checked.
            check_unique_ids(self.mirror.ids())?;
            check_unique_ids(target.ids())?;
        }
        Ok(target)
    }

    /// Pass 1: afterwards the mirror holds only surviving items, in old order.
    ///
    /// A pending run stays in the mirror until it is flushed so each run
    /// costs a single shift. `cursor - pending` is the position the item
    /// under the cursor will have once the run is gone.
    fn remove_missing(&mut self, target: &Mirror) {
        let mut pending: Option<PendingRange> = None;
        let mut cursor = 0;
        while cursor < self.mirror.len() {
            let position = cursor - pending.map_or(0, |r| r.count);
            if target.locate(self.mirror.id(cursor), position).is_none() {
                // Every dropped item of a run collapses onto the run's start.
                match pending.as_mut() {
                    Some(run) => run.count += 1,
                    None => {
                        pending = Some(PendingRange {
                            start: position,
                            count: 1,
                        })
                    }
                }
            } else if let Some(run) = pending.take() {
                self.flush_remove(run);
                cursor = run.start;
            }
            cursor += 1;
        }
        if let Some(run) = pending.take() {
            self.flush_remove(run);
        }
    }

    /// Pass 2: inserts, moves and content changes in new-position order.
    fn place_new(&mut self, target: &Mirror) {
        let mut insert: Option<PendingRange> = None;
        let mut change: Option<PendingRange> = None;

        for i in 0..target.len() {
            let wanted = target.get(i);
            match self.mirror.locate(wanted.id, i) {
                None => {
                    self.flush_change(&mut change);
                    self.mirror.insert(i, wanted.id, wanted.content_hash);
                    PendingRange::extend(&mut insert, i);
                }
                Some(old) => {
                    self.flush_insert(&mut insert);
                    if old != i {
                        self.flush_change(&mut change);
                        self.mirror.relocate(old, i);
                        self.summary.moved += 1;
                        self.emit(Operation::Move { from: old, to: i });
                    }
                    // Compared at the item's new position, after the move.
                    if self.mirror.content_hash(i) != wanted.content_hash {
                        self.mirror.set_content_hash(i, wanted.content_hash);
                        PendingRange::extend(&mut change, i);
                    } else {
                        self.flush_change(&mut change);
                    }
                }
            }
        }

        self.flush_change(&mut change);
        self.flush_insert(&mut insert);
    }

    fn flush_remove(&mut self, run: PendingRange) {
        self.mirror.remove_range(run.start, run.start + run.count);
        self.summary.removed += run.count;
        self.emit(Operation::Remove {
            position_start: run.start,
            count: run.count,
        });
    }

    fn flush_insert(&mut self, pending: &mut Option<PendingRange>) {
        if let Some(run) = pending.take() {
            self.summary.inserted += run.count;
            self.emit(Operation::Insert {
                position_start: run.start,
                count: run.count,
            });
        }
    }

    fn flush_change(&mut self, pending: &mut Option<PendingRange>) {
        if let Some(run) = pending.take() {
            self.summary.changed += run.count;
            self.emit(Operation::Change {
                position_start: run.start,
                count: run.count,
            });
        }
    }

    fn emit(&mut self, op: Operation) {
        trace!("DiffEngine: emit {}", op);
        self.summary.operations += 1;
        self.sink.emit(op);
    }
}

/// Reconciles `mirror` against `new`, emitting into `sink`.
pub fn reconcile<S, K>(
    mirror: &mut Mirror,
    new: &S,
    sink: &mut K,
    config: &ReconcilerConfig,
) -> Result<DiffSummary>
where
    S: SequenceSource + ?Sized,
    K: OperationSink + ?Sized,
{
    DiffEngine::new(mirror, sink, config).reconcile(new)
}

fn check_unique_ids(ids: &[ItemId]) -> Result<()> {
    let mut seen: HashMap<ItemId, usize> = HashMap::with_capacity(ids.len());
    for (position, &id) in ids.iter().enumerate() {
        match seen.entry(id) {
            Entry::Occupied(first) => {
                return Err(ReconcileError::DuplicateId {
                    id,
                    first: *first.get(),
                    second: position,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(position);
            }
        }
    }
    Ok(())
}
