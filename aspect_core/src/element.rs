// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element and group identity, plus the slot table that backs side tables.
//!
//! Per-element state never lives on the host's elements. It lives in an
//! [`ElementTable`] owned by the core, addressed by [`ElementId`] handles.
//! Handles carry a generation counter so a handle kept past
//! [`ElementTable::remove`] is rejected even after its slot is reused.

use alloc::vec::Vec;
use core::fmt;

/// A handle to a mounted element.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId {
    idx: u32,
    generation: u32,
}

impl ElementId {
    /// Returns the raw slot index. Backends use it to index their own
    /// element arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({}@gen{})", self.idx, self.generation)
    }
}

/// Identifies a set of containers that are sized uniformly.
///
/// The value is opaque; the rendering layer typically uses the id of the
/// gallery or grid instance the containers belong to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u64);

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

/// Slot storage keyed by [`ElementId`], with slot reuse via a free list.
#[derive(Clone, Debug)]
pub struct ElementTable<T> {
    slots: Vec<Option<T>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
}

impl<T> Default for ElementTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ElementTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Stores `value` and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` slots would be live at once.
    pub fn insert(&mut self, value: T) -> ElementId {
        if let Some(idx) = self.free_list.pop() {
            let slot = idx as usize;
            self.slots[slot] = Some(value);
            ElementId {
                idx,
                generation: self.generation[slot],
            }
        } else {
            let idx = u32::try_from(self.slots.len()).expect("element table is full");
            self.slots.push(Some(value));
            self.generation.push(0);
            ElementId { idx, generation: 0 }
        }
    }

    /// Removes and returns the value for `id`. Stale handles return `None`.
    pub fn remove(&mut self, id: ElementId) -> Option<T> {
        if !self.is_alive(id) {
            return None;
        }
        let slot = id.idx as usize;
        let value = self.slots[slot].take();
        // Bump generation so old handles immediately fail validation.
        self.generation[slot] = self.generation[slot].wrapping_add(1);
        self.free_list.push(id.idx);
        value
    }

    /// Returns whether `id` refers to a live entry.
    #[must_use]
    pub fn is_alive(&self, id: ElementId) -> bool {
        let slot = id.idx as usize;
        self.generation.get(slot) == Some(&id.generation)
            && self.slots.get(slot).is_some_and(Option::is_some)
    }

    /// Borrows the value for `id`.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&T> {
        if self.generation.get(id.idx as usize) != Some(&id.generation) {
            return None;
        }
        self.slots.get(id.idx as usize)?.as_ref()
    }

    /// Mutably borrows the value for `id`.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut T> {
        if self.generation.get(id.idx as usize) != Some(&id.generation) {
            return None;
        }
        self.slots.get_mut(id.idx as usize)?.as_mut()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Returns `true` if no entries are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(slot, value)| {
            let value = value.as_ref()?;
            let idx = u32::try_from(slot).ok()?;
            Some((
                ElementId {
                    idx,
                    generation: self.generation[slot],
                },
                value,
            ))
        })
    }

    /// Removes every entry. Outstanding handles become stale.
    pub fn clear(&mut self) {
        let ids: Vec<ElementId> = self.iter().map(|(id, _)| id).collect();
        for id in ids {
            self.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut table = ElementTable::new();
        let a = table.insert("a");
        let b = table.insert("b");
        assert_eq!(table.get(a), Some(&"a"));
        assert_eq!(table.len(), 2);

        assert_eq!(table.remove(a), Some("a"));
        assert!(!table.is_alive(a));
        assert_eq!(table.get(a), None);
        assert_eq!(table.remove(a), None, "double remove is a no-op");
        assert!(table.is_alive(b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn reused_slot_rejects_stale_handle() {
        let mut table = ElementTable::new();
        let old = table.insert(1);
        table.remove(old);
        let new = table.insert(2);
        assert_eq!(old.index(), new.index(), "slot is recycled");
        assert_ne!(old.generation(), new.generation());
        assert_eq!(table.get(old), None);
        assert_eq!(table.get(new), Some(&2));
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut table = ElementTable::new();
        let ids = [table.insert(1), table.insert(2), table.insert(3)];
        table.clear();
        assert!(table.is_empty());
        assert!(ids.iter().all(|id| !table.is_alive(*id)));
    }

    #[test]
    fn iter_skips_free_slots() {
        let mut table = ElementTable::new();
        let a = table.insert('a');
        let b = table.insert('b');
        table.remove(a);
        let live: alloc::vec::Vec<_> = table.iter().collect();
        assert_eq!(live, [(b, &'b')]);
    }
}
