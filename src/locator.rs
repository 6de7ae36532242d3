//! Position lookups biased towards an expected index.
//!
//! After small edits an item usually sits at or near its previous position,
//! so [`locate`] probes outward from the expected index before degrading to a
//! plain scan of whatever side is left. Worst case stays O(n) per lookup.

use crate::types::ItemId;

/// Finds `id` in `ids`, probing `start, start+1, start-1, start+2, ...`.
///
/// Once one side runs off the slice the remaining side is scanned linearly.
/// A `start` past the end is clamped to the last index.
pub fn locate(ids: &[ItemId], id: ItemId, start: usize) -> Option<usize> {
    let len = ids.len();
    if len == 0 {
        return None;
    }
    let start = start.min(len - 1);
    if ids[start] == id {
        return Some(start);
    }

    let mut step = 1;
    loop {
        let forward = start + step;
        let backward = start.checked_sub(step);
        match (forward < len, backward) {
            (true, Some(back)) => {
                if ids[forward] == id {
                    return Some(forward);
                }
                if ids[back] == id {
                    return Some(back);
                }
            }
            // Head was hit: only the tail remains.
            (true, None) => {
                return (forward..len).find(|&i| ids[i] == id);
            }
            // Tail was hit: only the head remains.
            (false, Some(back)) => {
                return (0..=back).rev().find(|&i| ids[i] == id);
            }
            (false, None) => return None,
        }
        step += 1;
    }
}

/// Forward scan from `start`, then backward from `start - 1`.
pub fn index_of<T: PartialEq>(items: &[T], needle: &T, start: usize) -> Option<usize> {
    let start = start.min(items.len());
    items[start..]
        .iter()
        .position(|item| item == needle)
        .map(|offset| start + offset)
        .or_else(|| items[..start].iter().rposition(|item| item == needle))
}
