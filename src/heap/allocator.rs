// uDashBoard: featherweight dashboard application.
//
// Copyright (C) 2019  Brandon Lewis
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

//! A single size class's allocator: one fixed-capacity block, a bump
//! pointer, and a FIFO free list.

use std::collections::VecDeque;
use std::marker::PhantomData;

/// Number of cells per block, matching the original's `cellSize * 256` block
/// size (in Rust each cell in a class shares one layout, so the class is
/// sized in cells rather than bytes).
pub const CELLS_PER_BLOCK: usize = 256;

/// A generational handle to a cell of type `T`. Copy, so it behaves like
/// the raw pointer it stands in for; the generation guards against stale
/// handles observing a slot recycled for a new cell.
pub struct GcRef<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> GcRef<T> {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        GcRef { index, generation, _marker: PhantomData }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Clone for GcRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for GcRef<T> {}
impl<T> PartialEq for GcRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}
impl<T> Eq for GcRef<T> {}
impl<T> std::hash::Hash for GcRef<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}
impl<T> std::fmt::Debug for GcRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GcRef({}, gen {})", self.index, self.generation)
    }
}

struct Slot<T> {
    value: Option<T>,
    generation: u32,
    marked: bool,
}

pub struct Allocator<T> {
    slots: Vec<Slot<T>>,
    free_list: VecDeque<u32>,
}

impl<T> Allocator<T> {
    pub fn new() -> Self {
        Allocator { slots: Vec::new(), free_list: VecDeque::new() }
    }

    /// Block capacity reached and no free cells to recycle: the caller
    /// (`Heap`) must run a collection and retry before giving up.
    pub fn is_exhausted(&self) -> bool {
        self.free_list.is_empty() && self.slots.len() >= CELLS_PER_BLOCK
    }

    /// Reuse from the free list (FIFO) first, otherwise bump. Returns
    /// `None` only when the block is exhausted; the caller is responsible
    /// for having already attempted a collection.
    pub fn allocate(&mut self, value: T) -> Option<GcRef<T>> {
        if let Some(index) = self.free_list.pop_front() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            slot.generation = slot.generation.wrapping_add(1);
            slot.marked = false;
            return Some(GcRef::new(index, slot.generation));
        }
        if self.slots.len() >= CELLS_PER_BLOCK {
            return None;
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { value: Some(value), generation: 0, marked: false });
        Some(GcRef::new(index, 0))
    }

    pub fn get(&self, r: GcRef<T>) -> &T {
        let slot = &self.slots[r.index() as usize];
        debug_assert_eq!(slot.generation, r.generation(), "stale GcRef used after slot recycled");
        slot.value.as_ref().expect("GcRef pointed at a freed cell")
    }

    pub fn get_mut(&mut self, r: GcRef<T>) -> &mut T {
        let slot = &mut self.slots[r.index() as usize];
        debug_assert_eq!(slot.generation, r.generation(), "stale GcRef used after slot recycled");
        slot.value.as_mut().expect("GcRef pointed at a freed cell")
    }

    /// Returns `true` if the cell was already marked (matching
    /// `Heap::isMarked`/`setMarked`'s combined check-and-set in the
    /// original `Heap.cpp`, used by the mark-phase worklist to avoid
    /// re-queuing an already-visited cell).
    pub fn set_marked(&mut self, r: GcRef<T>) -> bool {
        let slot = &mut self.slots[r.index() as usize];
        let was_marked = slot.marked;
        slot.marked = true;
        was_marked
    }

    /// Unmarked cells are dropped and returned to the free list; marked
    /// cells have their mark bit cleared for the next cycle.
    pub fn sweep(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.is_none() {
                continue;
            }
            if slot.marked {
                slot.marked = false;
            } else {
                slot.value = None;
                self.free_list.push_back(index as u32);
            }
        }
    }

    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_freed_slots_fifo() {
        let mut a: Allocator<u32> = Allocator::new();
        let r1 = a.allocate(1).unwrap();
        let _r2 = a.allocate(2).unwrap();
        a.set_marked(_r2);
        a.sweep(); // r1 unmarked -> freed; r2 marked -> survives
        assert_eq!(a.live_count(), 1);
        let r3 = a.allocate(3).unwrap();
        assert_eq!(r3.index(), r1.index());
        assert_ne!(r3.generation(), r1.generation());
    }

    #[test]
    fn exhaustion_reported_precisely() {
        let mut a: Allocator<u32> = Allocator::new();
        for i in 0..CELLS_PER_BLOCK {
            a.allocate(i as u32).unwrap();
        }
        assert!(a.is_exhausted());
        assert!(a.allocate(999).is_none());
    }
}
