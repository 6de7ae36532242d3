//! Keeps a [`Mirror`] in step with direct structural notifications.
//!
//! Consumers that already know what changed notify the presented list
//! directly instead of asking for a diff. Replaying those notifications here
//! keeps the mirror a faithful snapshot for the next diff.

use crate::mirror::Mirror;
use crate::types::SequenceSource;
use log::trace;
use serde::{Deserialize, Serialize};

/// A structural notification issued directly against the presented sequence.
///
/// Positions follow the same sequential semantics as [`crate::Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ListChange {
    Reset,
    RangeChanged { position_start: usize, count: usize },
    RangeInserted { position_start: usize, count: usize },
    RangeRemoved { position_start: usize, count: usize },
    RangeMoved { from: usize, to: usize, count: usize },
}

/// Replays `change` onto `mirror`, reading fresh values from `current`.
///
/// `current` must already describe the sequence after the change.
pub fn apply_change<S: SequenceSource + ?Sized>(mirror: &mut Mirror, change: ListChange, current: &S) {
    trace!("MirrorUpdater: {:?} (mirror len {})", change, mirror.len());
    match change {
        ListChange::Reset => rebuild(mirror, current),
        ListChange::RangeChanged { position_start, count } => {
            for i in position_start..position_start + count {
                mirror.set_content_hash(i, current.content_hash_at(i));
            }
        }
        ListChange::RangeInserted { position_start, count } => {
            mirror.ensure_capacity(mirror.len() + count);
            for i in position_start..position_start + count {
                mirror.insert(i, current.id_at(i), current.content_hash_at(i));
            }
        }
        ListChange::RangeRemoved { position_start, count } => {
            mirror.remove_range(position_start, position_start + count);
        }
        ListChange::RangeMoved { mut from, mut to, count } => {
            // Moving forward, each relocation pulls the next item into `from`.
            let advance = from > to;
            for _ in 0..count {
                mirror.relocate(from, to);
                if advance {
                    from += 1;
                    to += 1;
                }
            }
        }
    }
}

/// Discards the mirror's contents and copies `current` into it.
pub fn rebuild<S: SequenceSource + ?Sized>(mirror: &mut Mirror, current: &S) {
    let count = current.count();
    mirror.clear();
    mirror.ensure_capacity(count);
    for i in 0..count {
        mirror.push(current.id_at(i), current.content_hash_at(i));
    }
}
