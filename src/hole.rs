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

//! Symbolic pending computations used only during type checking.
//!
//! The original `Hole.{h,cpp}` declares more variants
//! (`HoleTuple`/`HoleObject`/`HoleArray`/`HoleLiteral`) than this crate
//! needs; only the four variants actually constructed by the generator's
//! lowering rules are kept here.

use crate::environment::{lookup, GcEnvironmentRef};
use crate::heap::{CellRef, Heap, Trace};
use crate::value::Value;

pub type HoleData = Hole;

#[derive(Debug, Clone)]
pub enum Hole {
    Variable(String),
    Call { callee: Value, args: Vec<Value> },
    Subscript { target: Value, index: Value },
    Member { object: Value, property: String },
}

impl Trace for Hole {
    fn trace(&self, visitor: &mut dyn FnMut(Value)) {
        match self {
            Hole::Variable(_) => {}
            Hole::Call { callee, args } => {
                visitor(*callee);
                for a in args {
                    visitor(*a);
                }
            }
            Hole::Subscript { target, index } => {
                visitor(*target);
                visitor(*index);
            }
            Hole::Member { object, .. } => visitor(*object),
        }
    }
}

/// Structural equality: two `Hole::Call`s are equal iff their callees and
/// all argument slots are equal, generalized to every variant.
pub fn holes_equal(heap: &Heap, a: &Hole, b: &Hole) -> bool {
    match (a, b) {
        (Hole::Variable(n1), Hole::Variable(n2)) => n1 == n2,
        (Hole::Call { callee: c1, args: a1 }, Hole::Call { callee: c2, args: a2 }) => {
            values_equal(heap, *c1, *c2) && a1.len() == a2.len() && a1.iter().zip(a2).all(|(x, y)| values_equal(heap, *x, *y))
        }
        (Hole::Subscript { target: t1, index: i1 }, Hole::Subscript { target: t2, index: i2 }) => {
            values_equal(heap, *t1, *t2) && values_equal(heap, *i1, *i2)
        }
        (Hole::Member { object: o1, property: p1 }, Hole::Member { object: o2, property: p2 }) => {
            p1 == p2 && values_equal(heap, *o1, *o2)
        }
        _ => false,
    }
}

/// Bitwise equality, extended structurally into holes and types. The
/// interpreter's own value-mode equality opcode only ever sees concrete
/// values and can use plain bit equality, but the type checker compares
/// holes that wrap other, possibly still-symbolic, values.
pub fn values_equal(heap: &Heap, a: Value, b: Value) -> bool {
    if a == b {
        return true;
    }
    match (a.as_cell_ref(), b.as_cell_ref()) {
        (Some(CellRef::Hole(ra)), Some(CellRef::Hole(rb))) => holes_equal(heap, heap.get_hole(ra), heap.get_hole(rb)),
        (Some(CellRef::Type(ra)), Some(CellRef::Type(rb))) => crate::types::equality::types_equal(heap, ra, rb),
        (Some(CellRef::Array(ra)), Some(CellRef::Array(rb))) => {
            let (xs, ys) = (&heap.get_array(ra).items, &heap.get_array(rb).items);
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(heap, *x, *y))
        }
        _ => false,
    }
}

/// Recursively checks whether `v` contains a hole anywhere in its structure.
pub fn has_hole(heap: &Heap, v: Value) -> bool {
    match v.as_cell_ref() {
        Some(CellRef::Hole(_)) => true,
        Some(CellRef::Array(r)) => heap.get_array(r).items.iter().any(|item| has_hole(heap, *item)),
        Some(CellRef::Tuple(r)) => heap.get_tuple(r).items.iter().any(|item| has_hole(heap, *item)),
        Some(CellRef::Object(r)) => heap.get_object(r).fields.iter().any(|(_, item)| has_hole(heap, *item)),
        _ => false,
    }
}

/// Partial evaluation of a hole-carrying value in `env`. Idempotent and
/// equality-preserving: a `Hole::Variable` resolves fully when its lookup
/// yields a non-abstract value; the other variants recursively partially
/// evaluate their subterms and otherwise remain symbolic.
pub fn partially_evaluate(heap: &mut Heap, v: Value, env: GcEnvironmentRef) -> Value {
    let hole = match v.as_any_cell_ref() {
        Some(CellRef::Hole(r)) => heap.get_hole(r).clone(),
        _ => return v,
    };
    match hole {
        Hole::Variable(name) => match lookup(heap, env, &name) {
            Some(resolved) if !resolved.is_abstract_value() => resolved,
            _ => v,
        },
        Hole::Call { callee, args } => {
            let new_callee = partially_evaluate(heap, callee, env);
            let new_args: Vec<Value> = args.iter().map(|a| partially_evaluate(heap, *a, env)).collect();
            if new_callee == callee && new_args == args {
                v
            } else {
                heap.allocate_hole(Hole::Call { callee: new_callee, args: new_args }, &[])
                    .map(|r| Value::cell(CellRef::Hole(r)))
                    .unwrap_or(v)
            }
        }
        Hole::Subscript { target, index } => {
            let new_target = partially_evaluate(heap, target, env);
            let new_index = partially_evaluate(heap, index, env);
            if new_target == target && new_index == index {
                v
            } else {
                heap.allocate_hole(Hole::Subscript { target: new_target, index: new_index }, &[])
                    .map(|r| Value::cell(CellRef::Hole(r)))
                    .unwrap_or(v)
            }
        }
        Hole::Member { object, property } => {
            let new_object = partially_evaluate(heap, object, env);
            if new_object == object {
                v
            } else {
                heap.allocate_hole(Hole::Member { object: new_object, property }, &[])
                    .map(|r| Value::cell(CellRef::Hole(r)))
                    .unwrap_or(v)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_variable_holes_are_equal() {
        let heap = Heap::new(false);
        assert!(holes_equal(&heap, &Hole::Variable("x".into()), &Hole::Variable("x".into())));
        assert!(!holes_equal(&heap, &Hole::Variable("x".into()), &Hole::Variable("y".into())));
    }

    #[test]
    fn has_hole_detects_nested_hole_in_array() {
        let mut heap = Heap::new(false);
        let hole_ref = heap.allocate_hole(Hole::Variable("x".into()), &[]).unwrap();
        let hole_value = Value::cell(CellRef::Hole(hole_ref));
        let array = crate::cells::GcArray::new(vec![Value::number(1.0), hole_value], None);
        let array_ref = heap.allocate_array(array, &[]).unwrap();
        assert!(has_hole(&heap, Value::cell(CellRef::Array(array_ref))));
    }
}
