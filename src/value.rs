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

//! The tagged 64-bit `Value` word.
//!
//! Real pointers can't be validated from an arbitrary bit pattern in safe
//! Rust, so the "Cell" and "AbstractValue" variants pack a
//! [`crate::heap::CellRef`] (a generational arena handle) instead of a raw
//! address into the low bits. Every other encoding rule, NaN-boxed numbers,
//! the Bool/Unit tags, the all-zero *Crash* sentinel, is exactly as
//! specified, so round-tripping a value through its bits and telling every
//! tag apart from every other hold bit-for-bit.

use crate::heap::CellRef;

const TAG_BOOL: u64 = 0b010;
const TAG_UNIT: u64 = 0b100;
const TAG_ABSTRACT: u64 = 0b001;
const TAG_NUMBER: u64 = 0xFFFF_0000_0000_0000;
const DOUBLE_ENCODE_OFFSET: u64 = 0x0001_0000_0000_0000;

/// A cell/abstract-value payload is packed into the bits above the low tag
/// bits; it is shifted left by this much so bits 0..=2 stay clear for plain
/// cells, leaving room for `TAG_ABSTRACT` to be ORed in without disturbing
/// `TAG_BOOL`/`TAG_UNIT`.
const PAYLOAD_SHIFT: u32 = 3;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value(u64);

impl Value {
    pub fn unit() -> Value {
        Value(TAG_UNIT)
    }

    pub fn crash() -> Value {
        Value(0)
    }

    pub fn bool(b: bool) -> Value {
        Value(TAG_BOOL | (b as u64))
    }

    pub fn number(d: f64) -> Value {
        Value(d.to_bits().wrapping_add(DOUBLE_ENCODE_OFFSET))
    }

    pub fn cell(cell: CellRef) -> Value {
        Value(cell.to_payload() << PAYLOAD_SHIFT)
    }

    pub fn abstract_value(type_cell: CellRef) -> Value {
        Value((type_cell.to_payload() << PAYLOAD_SHIFT) | TAG_ABSTRACT)
    }

    pub fn is_crash(&self) -> bool {
        self.0 == 0
    }

    pub fn is_number(&self) -> bool {
        self.0 & TAG_NUMBER != 0
    }

    pub fn is_unit(&self) -> bool {
        self.0 == TAG_UNIT
    }

    pub fn is_bool(&self) -> bool {
        self.0 == TAG_BOOL || self.0 == (TAG_BOOL | 1)
    }

    pub fn is_abstract_value(&self) -> bool {
        !self.is_number() && !self.is_unit() && !self.is_bool() && (self.0 & TAG_ABSTRACT != 0)
    }

    pub fn is_cell(&self) -> bool {
        !self.is_crash()
            && !self.is_number()
            && !self.is_unit()
            && !self.is_bool()
            && !self.is_abstract_value()
    }

    pub fn as_number(&self) -> Option<f64> {
        if self.is_number() {
            Some(f64::from_bits(self.0.wrapping_sub(DOUBLE_ENCODE_OFFSET)))
        } else {
            None
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        if self.is_bool() {
            Some(self.0 & 1 == 1)
        } else {
            None
        }
    }

    pub fn as_cell_ref(&self) -> Option<CellRef> {
        if self.is_cell() {
            CellRef::from_payload(self.0 >> PAYLOAD_SHIFT)
        } else {
            None
        }
    }

    /// Unlike `as_cell_ref`, also unpacks an `AbstractValue`'s underlying
    /// cell. Used by the GC, which must trace through both.
    pub fn as_any_cell_ref(&self) -> Option<CellRef> {
        if self.is_cell() {
            self.as_cell_ref()
        } else if self.is_abstract_value() {
            CellRef::from_payload(self.0 >> PAYLOAD_SHIFT)
        } else {
            None
        }
    }

    pub fn as_abstract_type(&self) -> Option<CellRef> {
        if self.is_abstract_value() {
            CellRef::from_payload(self.0 >> PAYLOAD_SHIFT)
        } else {
            None
        }
    }

    pub fn bits(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_crash() {
            write!(f, "Crash")
        } else if let Some(n) = self.as_number() {
            write!(f, "Number({})", n)
        } else if let Some(b) = self.as_bool() {
            write!(f, "Bool({})", b)
        } else if self.is_unit() {
            write!(f, "Unit")
        } else if let Some(c) = self.as_cell_ref() {
            write!(f, "Cell({:?})", c)
        } else if let Some(t) = self.as_abstract_type() {
            write!(f, "AbstractValue({:?})", t)
        } else {
            write!(f, "Value({:#x})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{CellKind, GcRef};

    fn sample_cell() -> CellRef {
        CellRef::from_payload((CellKind::Array as u64) | (5u64 << 4)).unwrap()
    }

    #[test]
    fn number_round_trip() {
        for d in [0.0, 1.0, -1.0, 3.14159, f64::MAX, f64::MIN_POSITIVE, -0.0] {
            assert_eq!(Value::number(d).as_number(), Some(d));
        }
    }

    #[test]
    fn bool_round_trip() {
        assert_eq!(Value::bool(true).as_bool(), Some(true));
        assert_eq!(Value::bool(false).as_bool(), Some(false));
    }

    #[test]
    fn crash_is_all_zero_and_unique() {
        assert_eq!(Value::crash().bits(), 0);
        assert!(Value::crash().is_crash());
        assert!(!Value::unit().is_crash());
        assert!(!Value::bool(false).is_crash());
        assert!(!Value::number(0.0).is_crash());
    }

    #[test]
    fn tags_are_disjoint() {
        let cell = Value::cell(sample_cell());
        let abstract_value = Value::abstract_value(sample_cell());
        let values = [
            Value::crash(),
            Value::unit(),
            Value::bool(true),
            Value::bool(false),
            Value::number(42.0),
            Value::number(-1.5),
            cell,
            abstract_value,
        ];
        for v in &values {
            let flags = [
                v.is_number(),
                v.is_bool(),
                v.is_cell(),
                v.is_unit(),
                v.is_abstract_value(),
            ];
            let set = flags.iter().filter(|b| **b).count();
            assert!(set <= 1, "{:?} set more than one tag: {:?}", v, flags);
        }
    }

    #[test]
    fn cell_payload_round_trips() {
        let cell = sample_cell();
        let v = Value::cell(cell);
        assert!(v.is_cell());
        assert_eq!(v.as_cell_ref(), Some(cell));
    }

    #[test]
    fn abstract_value_wraps_a_type_cell() {
        let type_cell = CellRef::from_payload((CellKind::Type as u64) | (3u64 << 4)).unwrap();
        let v = Value::abstract_value(type_cell);
        assert!(v.is_abstract_value());
        assert!(!v.is_cell());
        assert_eq!(v.as_abstract_type(), Some(type_cell));
    }
}
