//! Item-by-item operations between two in-memory lists.
//!
//! Works on any comparable ids and change markers rather than a mirror, and
//! emits one operation per affected item (every range has `count == 1`).
//! Handy when the caller wants per-item notifications, or ids that are not
//! plain integers.
use crate::errors::{ReconcileError, Result};
use crate::locator::index_of;
use crate::types::Operation;

/// Operations that turn `from` into `to`, applied one after another.
///
/// Ids locate items, change ids detect in-place modification.
pub fn calculate<I, C>(
    from_ids: &[I],
    from_changes: &[C],
    to_ids: &[I],
    to_changes: &[C],
) -> Result<Vec<Operation>>
where
    I: PartialEq + Clone,
    C: PartialEq + Clone,
{
    check_lengths(from_ids.len(), from_changes.len())?;
    check_lengths(to_ids.len(), to_changes.len())?;

    let mut ops = Vec::new();
    let mut ids = from_ids.to_vec();
    let mut changes = from_changes.to_vec();

    // Removing up front keeps positions predictable in the second loop.
    let mut i = 0;
    while i < ids.len() {
        if index_of(to_ids, &ids[i], i).is_none() {
            ops.push(Operation::Remove { position_start: i, count: 1 });
            ids.remove(i);
            changes.remove(i);
        } else {
            i += 1;
        }
    }

    ids.reserve(to_ids.len().saturating_sub(ids.len()));
    changes.reserve(to_ids.len().saturating_sub(changes.len()));

    for (i, id) in to_ids.iter().enumerate() {
        match index_of(&ids, id, i) {
            Some(old) => {
                if old != i {
                    ops.push(Operation::Move { from: old, to: i });
                    let moved_id = ids.remove(old);
                    ids.insert(i, moved_id);
                    let moved_change = changes.remove(old);
                    changes.insert(i, moved_change);
                }
                if changes[i] != to_changes[i] {
                    ops.push(Operation::Change { position_start: i, count: 1 });
                    changes[i] = to_changes[i].clone();
                }
            }
            None => {
                ops.push(Operation::Insert { position_start: i, count: 1 });
                ids.insert(i, id.clone());
                changes.insert(i, to_changes[i].clone());
            }
        }
    }

    Ok(ops)
}

fn check_lengths(ids: usize, hashes: usize) -> Result<()> {
    if ids != hashes {
        return Err(ReconcileError::LengthMismatch { ids, hashes });
    }
    Ok(())
}
