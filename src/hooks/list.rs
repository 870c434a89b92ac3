//! Ordered, duplicate-free hook list for one direction.

use crate::error::HookError;
use crate::hooks::entry::{HookContext, HookEntry, HookId};
use std::fmt;

/// Smallest capacity a list grows to.
const MIN_GROWTH: usize = 4;

/// Hook entries for one direction, kept in registration order.
///
/// Holds at most one entry per [`HookId`]. Lookups and removals are O(n)
/// and keep the order of the remaining entries. Pushing never allocates:
/// growth goes through [`allocate_storage`](Self::allocate_storage) and
/// [`adopt_storage`](Self::adopt_storage) so the allocation can happen
/// outside the lock. The list itself does no locking: the registry guards
/// it.
pub struct HookList<D, B> {
    entries: Vec<HookEntry<D, B>>,
}

impl<D, B> HookList<D, B> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates an empty list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Position of the entry registered under `id`, if any.
    pub fn find(&self, id: HookId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == id)
    }

    pub fn contains(&self, id: HookId) -> bool {
        self.find(id).is_some()
    }

    /// True when the next push would need a bigger allocation.
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Capacity to allocate before the next push into a full list.
    pub fn grown_capacity(&self) -> usize {
        self.entries.capacity().saturating_mul(2).max(MIN_GROWTH)
    }

    /// Allocates empty storage for `capacity` entries.
    ///
    /// Meant to run without the registry lock held; the result is handed
    /// to [`adopt_storage`](Self::adopt_storage) once the lock is taken.
    pub fn allocate_storage(capacity: usize) -> Result<Vec<HookEntry<D, B>>, HookError> {
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| HookError::OutOfMemory)?;
        Ok(storage)
    }

    /// Moves the entries into `storage` if it has room for one more.
    ///
    /// Returns the storage that is no longer in use: the old backing
    /// buffer on success, `storage` itself when it is too small. Neither
    /// path allocates, so the caller can release the returned buffer after
    /// dropping the lock.
    pub fn adopt_storage(&mut self, mut storage: Vec<HookEntry<D, B>>) -> Vec<HookEntry<D, B>> {
        if !storage.is_empty() || storage.capacity() <= self.entries.len() {
            return storage;
        }
        storage.append(&mut self.entries);
        std::mem::replace(&mut self.entries, storage)
    }

    /// Appends `entry` at the tail without allocating.
    ///
    /// Fails with `AlreadyExists` if an entry with the same identity is
    /// present (the entry is dropped), or hands `entry` back through
    /// [`PushError::Full`] when the list has no spare capacity. On failure
    /// the list is untouched.
    pub fn push_within_capacity(&mut self, entry: HookEntry<D, B>) -> Result<(), PushError<D, B>> {
        if self.contains(entry.id()) {
            return Err(PushError::AlreadyExists);
        }
        if self.is_full() {
            return Err(PushError::Full(entry));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Unlinks and returns the entry registered under `id`.
    pub fn remove(&mut self, id: HookId) -> Option<HookEntry<D, B>> {
        let index = self.find(id)?;
        Some(self.entries.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HookEntry<D, B>> {
        self.entries.iter()
    }

    /// Appends `(identity, context)` for every entry to `out`.
    ///
    /// Does not allocate as long as `out` has room for [`len`](Self::len)
    /// more elements.
    pub fn snapshot_into(&self, out: &mut Vec<(HookId, HookContext)>) {
        out.extend(self.entries.iter().map(|entry| (entry.id(), entry.context())));
    }

    /// Detaches every entry along with the backing storage.
    pub fn take(&mut self) -> Vec<HookEntry<D, B>> {
        std::mem::take(&mut self.entries)
    }
}

/// Why [`HookList::push_within_capacity`] refused an entry.
pub enum PushError<D, B> {
    AlreadyExists,
    /// No spare capacity; the entry is returned unchanged.
    Full(HookEntry<D, B>),
}

impl<D, B> fmt::Debug for HookList<D, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

impl<D, B> Default for HookList<D, B> {
    fn default() -> Self {
        Self::new()
    }
}
