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

//! Structural type equality, assuming substitutions have already been
//! applied to both sides.

use super::Type;
use crate::heap::{GcRef, Heap};

pub fn types_equal(heap: &Heap, a: GcRef<Type>, b: GcRef<Type>) -> bool {
    if a == b {
        return true;
    }
    match (heap.get_type(a), heap.get_type(b)) {
        (Type::Top, Type::Top) => true,
        (Type::Bottom, Type::Bottom) => true,
        (Type::TypeOfTypes, Type::TypeOfTypes) => true,
        // Nominal: equality is by identity of the interned instance, and
        // `a == b` (the GcRef comparison above) already covers that case;
        // two distinct cells with the same name are, by definition, not the
        // same interned instance.
        (Type::Name(_), Type::Name(_)) => false,
        (Type::Var(v1), Type::Var(v2)) => v1.uid == v2.uid,
        (Type::Array(i1), Type::Array(i2)) => types_equal(heap, *i1, *i2),
        (Type::Tuple(items1), Type::Tuple(items2)) => {
            items1.len() == items2.len()
                && items1.iter().zip(items2).all(|(x, y)| types_equal(heap, *x, *y))
        }
        (Type::Record(fields1), Type::Record(fields2)) => {
            fields1.len() == fields2.len()
                && fields1.iter().all(|(name, t1)| {
                    fields2
                        .iter()
                        .find(|(n2, _)| n2 == name)
                        .map_or(false, |(_, t2)| types_equal(heap, *t1, *t2))
                })
        }
        (
            Type::Function { params: p1, ret: r1, .. },
            Type::Function { params: p2, ret: r2, .. },
        ) => {
            p1.len() == p2.len()
                && p1.iter().zip(p2).all(|(x, y)| types_equal(heap, *x, *y))
                && types_equal(heap, *r1, *r2)
        }
        (Type::Union(a1, b1), Type::Union(a2, b2)) => {
            types_equal(heap, *a1, *a2) && types_equal(heap, *b1, *b2)
        }
        (Type::Binding(n1, t1), Type::Binding(n2, t2)) => n1 == n2 && types_equal(heap, *t1, *t2),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::Heap;

    #[test]
    fn array_equality_is_structural() {
        let mut heap = Heap::new(false);
        let num1 = heap.allocate_type(Type::Name("Number".into()), &[]).unwrap();
        let arr1 = heap.allocate_type(Type::Array(num1), &[]).unwrap();
        let arr2 = heap.allocate_type(Type::Array(num1), &[]).unwrap();
        assert!(types_equal(&heap, arr1, arr2));
    }

    #[test]
    fn distinct_name_cells_are_not_equal() {
        let mut heap = Heap::new(false);
        let n1 = heap.allocate_type(Type::Name("Number".into()), &[]).unwrap();
        let n2 = heap.allocate_type(Type::Name("Number".into()), &[]).unwrap();
        assert!(!types_equal(&heap, n1, n2));
    }

    #[test]
    fn union_is_not_commutative() {
        let mut heap = Heap::new(false);
        let a = heap.allocate_type(Type::Name("A".into()), &[]).unwrap();
        let b = heap.allocate_type(Type::Name("B".into()), &[]).unwrap();
        let ab = heap.allocate_type(Type::Union(a, b), &[]).unwrap();
        let ba = heap.allocate_type(Type::Union(b, a), &[]).unwrap();
        assert!(!types_equal(&heap, ab, ba));
    }
}
