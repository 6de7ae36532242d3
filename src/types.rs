//! Items, operations and the sequence descriptor the engine reads from
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of a logical row across sequence snapshots.
pub type ItemId = u64;

/// Content fingerprint used to detect in-place modification.
pub type ContentHash = u32;

/// One `(id, content hash)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub content_hash: ContentHash,
}

impl Item {
    pub fn new(id: ItemId, content_hash: ContentHash) -> Self {
        Item { id, content_hash }
    }
}

impl From<(ItemId, ContentHash)> for Item {
    fn from((id, content_hash): (ItemId, ContentHash)) -> Self {
        Item { id, content_hash }
    }
}

/// Structural operation emitted by the reconciler.
///
/// Positions are interpreted against the sequence as already modified by
/// every operation emitted before this one in the same batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Change { position_start: usize, count: usize },
    Insert { position_start: usize, count: usize },
    Remove { position_start: usize, count: usize },
    Move { from: usize, to: usize },
}

impl Operation {
    /// Number of positions touched.
    pub fn item_count(&self) -> usize {
        match *self {
            Operation::Change { count, .. }
            | Operation::Insert { count, .. }
            | Operation::Remove { count, .. } => count,
            Operation::Move { .. } => 1,
        }
    }

    /// Applies this operation to a plain replica.
    ///
    /// `fill` yields the value for a position that was inserted or changed,
    /// indexed by its position after the operation.
    pub fn apply_to<T>(&self, list: &mut Vec<T>, mut fill: impl FnMut(usize) -> T) {
        match *self {
            Operation::Change { position_start, count } => {
                for i in position_start..position_start + count {
                    list[i] = fill(i);
                }
            }
            Operation::Insert { position_start, count } => {
                for i in position_start..position_start + count {
                    list.insert(i, fill(i));
                }
            }
            Operation::Remove { position_start, count } => {
                list.drain(position_start..position_start + count);
            }
            Operation::Move { from, to } => {
                let moved = list.remove(from);
                list.insert(to, moved);
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Operation::Change { position_start, count } => {
                write!(f, "CHANGE({}, {})", position_start, count)
            }
            Operation::Insert { position_start, count } => {
                write!(f, "INSERT({}, {})", position_start, count)
            }
            Operation::Remove { position_start, count } => {
                write!(f, "REMOVE({}, {})", position_start, count)
            }
            Operation::Move { from, to } => write!(f, "MOVE({} -> {})", from, to),
        }
    }
}

/// Read-only view of a sequence snapshot.
///
/// Ids are expected to be unique within one snapshot and stable across calls.
pub trait SequenceSource {
    fn count(&self) -> usize;
    fn id_at(&self, position: usize) -> ItemId;
    fn content_hash_at(&self, position: usize) -> ContentHash;

    fn item_at(&self, position: usize) -> Item {
        Item::new(self.id_at(position), self.content_hash_at(position))
    }
}

impl SequenceSource for [Item] {
    fn count(&self) -> usize {
        self.len()
    }
    fn id_at(&self, position: usize) -> ItemId {
        self[position].id
    }
    fn content_hash_at(&self, position: usize) -> ContentHash {
        self[position].content_hash
    }
}

impl SequenceSource for Vec<Item> {
    fn count(&self) -> usize {
        self.len()
    }
    fn id_at(&self, position: usize) -> ItemId {
        self[position].id
    }
    fn content_hash_at(&self, position: usize) -> ContentHash {
        self[position].content_hash
    }
}

impl SequenceSource for [(ItemId, ContentHash)] {
    fn count(&self) -> usize {
        self.len()
    }
    fn id_at(&self, position: usize) -> ItemId {
        self[position].0
    }
    fn content_hash_at(&self, position: usize) -> ContentHash {
        self[position].1
    }
}

impl SequenceSource for Vec<(ItemId, ContentHash)> {
    fn count(&self) -> usize {
        self.len()
    }
    fn id_at(&self, position: usize) -> ItemId {
        self[position].0
    }
    fn content_hash_at(&self, position: usize) -> ContentHash {
        self[position].1
    }
}

impl<S: SequenceSource + ?Sized> SequenceSource for &S {
    fn count(&self) -> usize {
        (**self).count()
    }
    fn id_at(&self, position: usize) -> ItemId {
        (**self).id_at(position)
    }
    fn content_hash_at(&self, position: usize) -> ContentHash {
        (**self).content_hash_at(position)
    }
}

impl<S: SequenceSource + ?Sized> SequenceSource for Box<S> {
    fn count(&self) -> usize {
        (**self).count()
    }
    fn id_at(&self, position: usize) -> ItemId {
        (**self).id_at(position)
    }
    fn content_hash_at(&self, position: usize) -> ContentHash {
        (**self).content_hash_at(position)
    }
}

impl<S: SequenceSource + ?Sized> SequenceSource for Arc<S> {
    fn count(&self) -> usize {
        (**self).count()
    }
    fn id_at(&self, position: usize) -> ItemId {
        (**self).id_at(position)
    }
    fn content_hash_at(&self, position: usize) -> ContentHash {
        (**self).content_hash_at(position)
    }
}

/// Identifies one asynchronous diff request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "diff#{}", self.0)
    }
}

/// Global request id generator (lock-free, atomic)
static REQUEST_COUNTER: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));

pub fn next_request_id() -> RequestId {
    RequestId(REQUEST_COUNTER.fetch_add(1, Ordering::SeqCst))
}
