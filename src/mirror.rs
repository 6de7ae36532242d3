//! The engine's record of the presented sequence.
//!
//! Ids and content hashes live in two parallel arrays so lookups only walk
//! the id array. Capacity grows according to a [`GrowthPolicy`] instead of
//! `Vec`'s own doubling, which keeps reallocation points predictable.
//!
//! Indices must always be in bounds; an out-of-bounds index is a caller bug
//! and panics.

use crate::config::GrowthPolicy;
use crate::locator;
use crate::types::{ContentHash, Item, ItemId, SequenceSource};

#[derive(Debug, Clone, Default)]
pub struct Mirror {
    ids: Vec<ItemId>,
    content_hashes: Vec<ContentHash>,
    growth: GrowthPolicy,
}

impl Mirror {
    pub fn new(growth: GrowthPolicy) -> Self {
        Self::with_capacity(0, growth)
    }

    pub fn with_capacity(capacity: usize, growth: GrowthPolicy) -> Self {
        Mirror {
            ids: Vec::with_capacity(capacity),
            content_hashes: Vec::with_capacity(capacity),
            growth,
        }
    }

    /// Copies every `(id, hash)` pair out of `source`.
    pub fn from_source<S: SequenceSource + ?Sized>(source: &S, growth: GrowthPolicy) -> Self {
        let count = source.count();
        let mut mirror = Self::with_capacity(count, growth);
        for i in 0..count {
            mirror.push(source.id_at(i), source.content_hash_at(i));
        }
        mirror
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ids.capacity().min(self.content_hashes.capacity())
    }

    pub fn growth(&self) -> GrowthPolicy {
        self.growth
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn id(&self, index: usize) -> ItemId {
        self.check_index(index);
        self.ids[index]
    }

    pub fn content_hash(&self, index: usize) -> ContentHash {
        self.check_index(index);
        self.content_hashes[index]
    }

    pub fn get(&self, index: usize) -> Item {
        Item::new(self.id(index), self.content_hash(index))
    }

    pub fn set(&mut self, index: usize, id: ItemId, content_hash: ContentHash) {
        self.check_index(index);
        self.ids[index] = id;
        self.content_hashes[index] = content_hash;
    }

    pub fn set_content_hash(&mut self, index: usize, content_hash: ContentHash) {
        self.check_index(index);
        self.content_hashes[index] = content_hash;
    }

    pub fn push(&mut self, id: ItemId, content_hash: ContentHash) {
        self.grow_if_full();
        self.ids.push(id);
        self.content_hashes.push(content_hash);
    }

    /// Inserts at `index`, shifting everything after it right by one.
    pub fn insert(&mut self, index: usize, id: ItemId, content_hash: ContentHash) {
        assert!(
            index <= self.len(),
            "mirror insert index {} out of bounds (len {})",
            index,
            self.len()
        );
        self.grow_if_full();
        self.ids.insert(index, id);
        self.content_hashes.insert(index, content_hash);
    }

    pub fn remove(&mut self, index: usize) -> Item {
        self.check_index(index);
        Item::new(self.ids.remove(index), self.content_hashes.remove(index))
    }

    /// Removes `[from, to)` in a single shift.
    pub fn remove_range(&mut self, from: usize, to: usize) {
        assert!(
            from <= to && to <= self.len(),
            "mirror remove range {}..{} out of bounds (len {})",
            from,
            to,
            self.len()
        );
        self.ids.drain(from..to);
        self.content_hashes.drain(from..to);
    }

    /// Moves the item at `from` so it ends up at `to`.
    pub fn relocate(&mut self, from: usize, to: usize) {
        let item = self.remove(from);
        self.insert(to, item.id, item.content_hash);
    }

    pub fn ensure_capacity(&mut self, minimum: usize) {
        let len = self.len();
        if minimum > self.ids.capacity() {
            self.ids.reserve_exact(minimum - len);
        }
        if minimum > self.content_hashes.capacity() {
            self.content_hashes.reserve_exact(minimum - len);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.content_hashes.clear();
    }

    /// Locality-biased lookup, see [`locator::locate`].
    pub fn locate(&self, id: ItemId, start: usize) -> Option<usize> {
        locator::locate(&self.ids, id, start)
    }

    pub fn iter(&self) -> impl Iterator<Item = Item> + '_ {
        self.ids
            .iter()
            .zip(&self.content_hashes)
            .map(|(&id, &content_hash)| Item::new(id, content_hash))
    }

    pub fn to_vec(&self) -> Vec<Item> {
        self.iter().collect()
    }

    fn grow_if_full(&mut self) {
        let len = self.len();
        if len == self.capacity() {
            self.ensure_capacity(self.growth.next_capacity(len));
        }
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.len(),
            "mirror index {} out of bounds (len {})",
            index,
            self.len()
        );
    }
}

impl SequenceSource for Mirror {
    fn count(&self) -> usize {
        self.len()
    }

    fn id_at(&self, position: usize) -> ItemId {
        self.id(position)
    }

    fn content_hash_at(&self, position: usize) -> ContentHash {
        self.content_hash(position)
    }
}

impl PartialEq for Mirror {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids && self.content_hashes == other.content_hashes
    }
}

impl Eq for Mirror {}
