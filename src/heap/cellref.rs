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

//! A kind-erased cell handle: the nine cell kinds, each wrapping its own
//! [`GcRef`]. This is what `Value`'s Cell/AbstractValue variants encode in
//! their low bits, and what the heap's root set and mark worklist are made
//! of.

use super::allocator::GcRef;
use crate::bytecode::BytecodeBlock;
use crate::cells::{GcArray, GcEnvironment, GcFunction, GcObject, GcString, GcTuple};
use crate::hole::HoleData;
use crate::types::TypeData;

/// The kind tag every cell carries. Values 1..=9 so a packed `(kind, index)`
/// payload is never all-zero,
/// keeping the *Crash* sentinel (all-zero bits) unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellKind {
    String = 1,
    Array = 2,
    Tuple = 3,
    Object = 4,
    Function = 5,
    Environment = 6,
    Type = 7,
    Hole = 8,
    Block = 9,
}

impl CellKind {
    pub fn from_tag(tag: u8) -> Option<CellKind> {
        Some(match tag {
            1 => CellKind::String,
            2 => CellKind::Array,
            3 => CellKind::Tuple,
            4 => CellKind::Object,
            5 => CellKind::Function,
            6 => CellKind::Environment,
            7 => CellKind::Type,
            8 => CellKind::Hole,
            9 => CellKind::Block,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            CellKind::String => "String",
            CellKind::Array => "Array",
            CellKind::Tuple => "Tuple",
            CellKind::Object => "Object",
            CellKind::Function => "Function",
            CellKind::Environment => "Environment",
            CellKind::Type => "Type",
            CellKind::Hole => "Hole",
            CellKind::Block => "BytecodeBlock",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellRef {
    Str(GcRef<GcString>),
    Array(GcRef<GcArray>),
    Tuple(GcRef<GcTuple>),
    Object(GcRef<GcObject>),
    Function(GcRef<GcFunction>),
    Environment(GcRef<GcEnvironment>),
    Type(GcRef<TypeData>),
    Hole(GcRef<HoleData>),
    Block(GcRef<BytecodeBlock>),
}

impl CellRef {
    pub fn kind(&self) -> CellKind {
        match self {
            CellRef::Str(_) => CellKind::String,
            CellRef::Array(_) => CellKind::Array,
            CellRef::Tuple(_) => CellKind::Tuple,
            CellRef::Object(_) => CellKind::Object,
            CellRef::Function(_) => CellKind::Function,
            CellRef::Environment(_) => CellKind::Environment,
            CellRef::Type(_) => CellKind::Type,
            CellRef::Hole(_) => CellKind::Hole,
            CellRef::Block(_) => CellKind::Block,
        }
    }

    pub fn index(&self) -> u32 {
        match self {
            CellRef::Str(r) => r.index(),
            CellRef::Array(r) => r.index(),
            CellRef::Tuple(r) => r.index(),
            CellRef::Object(r) => r.index(),
            CellRef::Function(r) => r.index(),
            CellRef::Environment(r) => r.index(),
            CellRef::Type(r) => r.index(),
            CellRef::Hole(r) => r.index(),
            CellRef::Block(r) => r.index(),
        }
    }

    pub fn generation(&self) -> u32 {
        match self {
            CellRef::Str(r) => r.generation(),
            CellRef::Array(r) => r.generation(),
            CellRef::Tuple(r) => r.generation(),
            CellRef::Object(r) => r.generation(),
            CellRef::Function(r) => r.generation(),
            CellRef::Environment(r) => r.generation(),
            CellRef::Type(r) => r.generation(),
            CellRef::Hole(r) => r.generation(),
            CellRef::Block(r) => r.generation(),
        }
    }

    /// Pack `(kind, index, generation)` into the payload `Value` shifts
    /// into its low bits for the Cell/AbstractValue encoding.
    pub fn to_payload(&self) -> u64 {
        (self.kind() as u64) | ((self.index() as u64) << 4) | ((self.generation() as u64) << 32)
    }

    pub fn from_payload(payload: u64) -> Option<CellRef> {
        let kind = CellKind::from_tag((payload & 0xF) as u8)?;
        let index = ((payload >> 4) & 0x0FFF_FFFF) as u32;
        let generation = (payload >> 32) as u32;
        Some(match kind {
            CellKind::String => CellRef::Str(GcRef::new(index, generation)),
            CellKind::Array => CellRef::Array(GcRef::new(index, generation)),
            CellKind::Tuple => CellRef::Tuple(GcRef::new(index, generation)),
            CellKind::Object => CellRef::Object(GcRef::new(index, generation)),
            CellKind::Function => CellRef::Function(GcRef::new(index, generation)),
            CellKind::Environment => CellRef::Environment(GcRef::new(index, generation)),
            CellKind::Type => CellRef::Type(GcRef::new(index, generation)),
            CellKind::Hole => CellRef::Hole(GcRef::new(index, generation)),
            CellKind::Block => CellRef::Block(GcRef::new(index, generation)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips() {
        let cell = CellRef::Array(GcRef::new(42, 7));
        let payload = cell.to_payload();
        assert_eq!(CellRef::from_payload(payload), Some(cell));
    }

    #[test]
    fn payload_is_never_zero() {
        let cell = CellRef::Str(GcRef::new(0, 0));
        assert_ne!(cell.to_payload(), 0);
    }
}
