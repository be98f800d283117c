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

//! Size-classed allocators plus stop-the-world mark-sweep.
//!
//! Each distinct cell kind gets its own [`Allocator<T>`], mirroring "for
//! each distinct cell size observed, there is exactly one Allocator"
//! (`examples/original_source/src/runtime/Allocator.h`): in this crate every
//! kind has a fixed Rust layout, so "size class" and "kind" coincide. A cell
//! pointer is a [`GcRef<T>`], a generational arena handle rather than a raw
//! address, since safe Rust has no way to validate an arbitrary bit pattern
//! as a live reference the way the original's conservative stack scanner
//! validates pointers against allocator block bounds.

mod allocator;
mod cellref;
mod root;

pub use allocator::{Allocator, GcRef};
pub use cellref::{CellKind, CellRef};
pub use root::RootGuard;

use crate::bytecode::BytecodeBlock;
use crate::cells::{GcArray, GcEnvironment, GcFunction, GcObject, GcString, GcTuple};
use crate::error::ResourceError;
use crate::hole::HoleData;
use crate::types::TypeData;
use crate::value::Value;

/// Anything storable in the heap must be able to enumerate the `Value`s (and
/// therefore the child cells) it directly holds, so the mark phase can
/// propagate through the object graph.
pub trait Trace {
    fn trace(&self, visitor: &mut dyn FnMut(Value));
}

/// The heap. Single-threaded, owned by the `Vm` singleton: `!Send` by
/// construction, since every `Allocator` holds plain `Vec`s with no
/// synchronization.
pub struct Heap {
    strings: Allocator<GcString>,
    arrays: Allocator<GcArray>,
    tuples: Allocator<GcTuple>,
    objects: Allocator<GcObject>,
    functions: Allocator<GcFunction>,
    environments: Allocator<GcEnvironment>,
    types: Allocator<TypeData>,
    holes: Allocator<HoleData>,
    blocks: Allocator<BytecodeBlock>,

    /// Explicitly registered roots, outside anything reachable from a
    /// scanned value stack.
    roots: Vec<CellRef>,
    /// Root guards contribute here via `RootGuard`; kept separate from
    /// `roots` only for clearer bookkeeping of guard lifetimes.
    guard_roots: Vec<CellRef>,
    collect_disabled: bool,
}

impl Heap {
    pub fn new(no_gc: bool) -> Self {
        Heap {
            strings: Allocator::new(),
            arrays: Allocator::new(),
            tuples: Allocator::new(),
            objects: Allocator::new(),
            functions: Allocator::new(),
            environments: Allocator::new(),
            types: Allocator::new(),
            holes: Allocator::new(),
            blocks: Allocator::new(),
            roots: Vec::new(),
            guard_roots: Vec::new(),
            collect_disabled: no_gc,
        }
    }

    pub fn add_root(&mut self, cell: CellRef) {
        self.roots.push(cell);
    }

    pub fn remove_root(&mut self, cell: CellRef) {
        if let Some(pos) = self.roots.iter().position(|c| *c == cell) {
            self.roots.swap_remove(pos);
        }
    }

    fn add_guard_root(&mut self, cell: CellRef) {
        self.guard_roots.push(cell);
    }

    fn remove_guard_root(&mut self, cell: CellRef) {
        if let Some(pos) = self.guard_roots.iter().position(|c| *c == cell) {
            self.guard_roots.swap_remove(pos);
        }
    }

    /// Wrap `cell` in a [`RootGuard`] for the duration it must survive a
    /// collection without (yet) living on the value stack. Modeled on
    /// `examples/original_source/src/runtime/GC.h`'s `GC<T>`.
    pub fn root_guard(&mut self, cell: CellRef) -> RootGuard {
        self.add_guard_root(cell);
        RootGuard::new(cell)
    }

    pub(crate) fn release_guard(&mut self, cell: CellRef) {
        self.remove_guard_root(cell);
    }

    pub fn allocate_string(&mut self, value: GcString, stack: &[Value]) -> Result<GcRef<GcString>, ResourceError> {
        if self.strings.is_exhausted() {
            self.collect(stack);
        }
        self.strings.allocate(value).ok_or(ResourceError { kind: "String" })
    }

    pub fn allocate_array(&mut self, value: GcArray, stack: &[Value]) -> Result<GcRef<GcArray>, ResourceError> {
        if self.arrays.is_exhausted() {
            self.collect(stack);
        }
        self.arrays.allocate(value).ok_or(ResourceError { kind: "Array" })
    }

    pub fn allocate_tuple(&mut self, value: GcTuple, stack: &[Value]) -> Result<GcRef<GcTuple>, ResourceError> {
        if self.tuples.is_exhausted() {
            self.collect(stack);
        }
        self.tuples.allocate(value).ok_or(ResourceError { kind: "Tuple" })
    }

    pub fn allocate_object(&mut self, value: GcObject, stack: &[Value]) -> Result<GcRef<GcObject>, ResourceError> {
        if self.objects.is_exhausted() {
            self.collect(stack);
        }
        self.objects.allocate(value).ok_or(ResourceError { kind: "Object" })
    }

    pub fn allocate_function(&mut self, value: GcFunction, stack: &[Value]) -> Result<GcRef<GcFunction>, ResourceError> {
        if self.functions.is_exhausted() {
            self.collect(stack);
        }
        self.functions.allocate(value).ok_or(ResourceError { kind: "Function" })
    }

    pub fn allocate_environment(&mut self, value: GcEnvironment, stack: &[Value]) -> Result<GcRef<GcEnvironment>, ResourceError> {
        if self.environments.is_exhausted() {
            self.collect(stack);
        }
        self.environments.allocate(value).ok_or(ResourceError { kind: "Environment" })
    }

    pub fn allocate_type(&mut self, value: TypeData, stack: &[Value]) -> Result<GcRef<TypeData>, ResourceError> {
        if self.types.is_exhausted() {
            self.collect(stack);
        }
        self.types.allocate(value).ok_or(ResourceError { kind: "Type" })
    }

    pub fn allocate_hole(&mut self, value: HoleData, stack: &[Value]) -> Result<GcRef<HoleData>, ResourceError> {
        if self.holes.is_exhausted() {
            self.collect(stack);
        }
        self.holes.allocate(value).ok_or(ResourceError { kind: "Hole" })
    }

    pub fn allocate_block(&mut self, value: BytecodeBlock, stack: &[Value]) -> Result<GcRef<BytecodeBlock>, ResourceError> {
        if self.blocks.is_exhausted() {
            self.collect(stack);
        }
        self.blocks.allocate(value).ok_or(ResourceError { kind: "BytecodeBlock" })
    }

    pub fn get_string(&self, r: GcRef<GcString>) -> &GcString {
        self.strings.get(r)
    }
    pub fn get_array(&self, r: GcRef<GcArray>) -> &GcArray {
        self.arrays.get(r)
    }
    pub fn get_array_mut(&mut self, r: GcRef<GcArray>) -> &mut GcArray {
        self.arrays.get_mut(r)
    }
    pub fn get_tuple(&self, r: GcRef<GcTuple>) -> &GcTuple {
        self.tuples.get(r)
    }
    pub fn get_object(&self, r: GcRef<GcObject>) -> &GcObject {
        self.objects.get(r)
    }
    pub fn get_object_mut(&mut self, r: GcRef<GcObject>) -> &mut GcObject {
        self.objects.get_mut(r)
    }
    pub fn get_function(&self, r: GcRef<GcFunction>) -> &GcFunction {
        self.functions.get(r)
    }
    pub fn get_environment(&self, r: GcRef<GcEnvironment>) -> &GcEnvironment {
        self.environments.get(r)
    }
    pub fn get_environment_mut(&mut self, r: GcRef<GcEnvironment>) -> &mut GcEnvironment {
        self.environments.get_mut(r)
    }
    pub fn get_type(&self, r: GcRef<TypeData>) -> &TypeData {
        self.types.get(r)
    }
    pub fn get_hole(&self, r: GcRef<HoleData>) -> &HoleData {
        self.holes.get(r)
    }
    pub fn get_block(&self, r: GcRef<BytecodeBlock>) -> &BytecodeBlock {
        self.blocks.get(r)
    }

    /// Runs a full mark-sweep collection. `stack` is the interpreter's value
    /// stack, scanned precisely; explicit roots and root guards stand in for
    /// the conservative native-stack scan the original relies on.
    pub fn collect(&mut self, stack: &[Value]) {
        if self.collect_disabled {
            return;
        }

        let mut worklist: Vec<CellRef> = Vec::new();

        for v in stack {
            if let Some(cell) = v.as_any_cell_ref() {
                self.mark(cell, &mut worklist);
            }
        }
        for &cell in &self.roots {
            self.mark(cell, &mut worklist);
        }
        for &cell in &self.guard_roots {
            self.mark(cell, &mut worklist);
        }

        while let Some(cell) = worklist.pop() {
            self.visit_children(cell, &mut worklist);
        }

        self.strings.sweep();
        self.arrays.sweep();
        self.tuples.sweep();
        self.objects.sweep();
        self.functions.sweep();
        self.environments.sweep();
        self.types.sweep();
        self.holes.sweep();
        self.blocks.sweep();
    }

    fn mark(&mut self, cell: CellRef, worklist: &mut Vec<CellRef>) {
        let already_marked = match cell {
            CellRef::Str(r) => self.strings.set_marked(r),
            CellRef::Array(r) => self.arrays.set_marked(r),
            CellRef::Tuple(r) => self.tuples.set_marked(r),
            CellRef::Object(r) => self.objects.set_marked(r),
            CellRef::Function(r) => self.functions.set_marked(r),
            CellRef::Environment(r) => self.environments.set_marked(r),
            CellRef::Type(r) => self.types.set_marked(r),
            CellRef::Hole(r) => self.holes.set_marked(r),
            CellRef::Block(r) => self.blocks.set_marked(r),
        };
        if !already_marked {
            worklist.push(cell);
        }
    }

    fn visit_children(&mut self, cell: CellRef, worklist: &mut Vec<CellRef>) {
        let mut children: Vec<Value> = Vec::new();
        match cell {
            CellRef::Str(r) => self.strings.get(r).trace(&mut |v| children.push(v)),
            CellRef::Array(r) => self.arrays.get(r).trace(&mut |v| children.push(v)),
            CellRef::Tuple(r) => self.tuples.get(r).trace(&mut |v| children.push(v)),
            CellRef::Object(r) => self.objects.get(r).trace(&mut |v| children.push(v)),
            CellRef::Function(r) => self.functions.get(r).trace(&mut |v| children.push(v)),
            CellRef::Environment(r) => self.environments.get(r).trace(&mut |v| children.push(v)),
            CellRef::Type(r) => self.types.get(r).trace(&mut |v| children.push(v)),
            CellRef::Hole(r) => self.holes.get(r).trace(&mut |v| children.push(v)),
            CellRef::Block(r) => self.blocks.get(r).trace(&mut |v| children.push(v)),
        }
        for v in children {
            if let Some(child) = v.as_any_cell_ref() {
                self.mark(child, worklist);
            }
        }
    }

    pub fn is_collection_disabled(&self) -> bool {
        self.collect_disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::GcArray;

    #[test]
    fn allocate_and_read_back() {
        let mut heap = Heap::new(false);
        let r = heap.allocate_array(GcArray::new(vec![], None), &[]).unwrap();
        assert!(heap.get_array(r).items.is_empty());
    }

    #[test]
    fn unreachable_cells_are_freed_on_collect() {
        let mut heap = Heap::new(false);
        let r = heap.allocate_array(GcArray::new(vec![], None), &[]).unwrap();
        let cell = CellRef::Array(r);
        heap.add_root(cell);
        heap.collect(&[]);
        // still reachable: must not be recycled away from under us.
        assert!(heap.get_array(r).items.is_empty());
        heap.remove_root(cell);
        heap.collect(&[]);
        // Now unreachable; allocating again should be able to reuse the slot
        // (exercised indirectly, the allocator must not panic on reuse).
        let _r2 = heap.allocate_array(GcArray::new(vec![], None), &[]).unwrap();
    }
}
