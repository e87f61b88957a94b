//! Sorted table-id index backing paginated listing.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tetrahall_protocol::TableId;

/// A thread-safe ascending sequence of table ids.
///
/// The registry keeps this in lockstep with its id map: every live id
/// appears here exactly once, and [`get_all`](Self::get_all) always
/// yields ascending order after any mutating call returns. Positional
/// reads back the pagination window.
///
/// Table counts are small (tens), so a single sorted `Vec` behind a
/// `RwLock` is the whole structure; every mutation leaves it sorted.
///
/// This lock is independent of the registry and table locks and is
/// never held while acquiring either.
#[derive(Debug, Default)]
pub struct SortedIds {
    ids: RwLock<Vec<TableId>>,
}

impl SortedIds {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<TableId>> {
        self.ids.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<TableId>> {
        self.ids.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts an id, keeping the sequence sorted.
    pub fn add(&self, id: TableId) {
        let mut ids = self.write();
        ids.push(id);
        ids.sort_unstable();
    }

    /// Removes the first occurrence of `id`. No-op when absent;
    /// removal preserves the sorted order.
    pub fn delete(&self, id: TableId) {
        let mut ids = self.write();
        if let Some(pos) = ids.iter().position(|&x| x == id) {
            ids.remove(pos);
        }
    }

    /// Positional read into the sorted sequence. `None` out of range.
    pub fn get(&self, index: usize) -> Option<TableId> {
        self.read().get(index).copied()
    }

    /// Positional write, followed by a re-sort so the ascending
    /// invariant holds. No-op out of range.
    pub fn set(&self, index: usize, id: TableId) {
        let mut ids = self.write();
        if let Some(slot) = ids.get_mut(index) {
            *slot = id;
            ids.sort_unstable();
        }
    }

    /// The current sorted sequence, as a flattened copy.
    pub fn get_all(&self) -> Vec<TableId> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<TableId> {
        raw.iter().copied().map(TableId).collect()
    }

    #[test]
    fn test_add_keeps_ascending_order() {
        let index = SortedIds::new();
        for raw in [5, 1, 9, 3] {
            index.add(TableId(raw));
        }
        assert_eq!(index.get_all(), ids(&[1, 3, 5, 9]));
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let index = SortedIds::new();
        index.add(TableId(2));
        index.delete(TableId(7));
        assert_eq!(index.get_all(), ids(&[2]));
    }

    #[test]
    fn test_delete_removes_and_stays_sorted() {
        let index = SortedIds::new();
        for raw in [4, 2, 8] {
            index.add(TableId(raw));
        }
        index.delete(TableId(4));
        assert_eq!(index.get_all(), ids(&[2, 8]));
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let index = SortedIds::new();
        index.add(TableId(1));
        assert_eq!(index.get(0), Some(TableId(1)));
        assert_eq!(index.get(1), None);
    }

    #[test]
    fn test_set_resorts_and_ignores_out_of_range() {
        let index = SortedIds::new();
        for raw in [1, 5, 9] {
            index.add(TableId(raw));
        }
        index.set(0, TableId(7));
        assert_eq!(index.get_all(), ids(&[5, 7, 9]));
        index.set(10, TableId(3));
        assert_eq!(index.get_all(), ids(&[5, 7, 9]));
    }
}
