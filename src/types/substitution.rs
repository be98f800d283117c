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

//! Mapping from `Var.uid` to a concrete `Type`, applied by a deep
//! structure-preserving walk. Grounded on
//! `examples/original_source/src/typing/Substitution.cpp`: a `TypeVar`
//! looks itself up in the map (bound value, or unchanged if free), and every
//! structural type recursively substitutes and rebuilds. Idempotence relies
//! on `bind()` always binding to an already-fully-substituted value, so no
//! substitution chain ever needs to be followed more than once here.

use super::Type;
use crate::error::ResourceError;
use crate::heap::{GcRef, Heap};
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct Substitution {
    bindings: HashMap<u32, GcRef<Type>>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution::default()
    }

    pub fn bind(&mut self, uid: u32, ty: GcRef<Type>) {
        self.bindings.insert(uid, ty);
    }

    pub fn get(&self, uid: u32) -> Option<GcRef<Type>> {
        self.bindings.get(&uid).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Every type currently bound, for rooting a collection that runs while
    /// this substitution is still live but not yet returned to a caller.
    pub fn bound_types(&self) -> impl Iterator<Item = GcRef<Type>> + '_ {
        self.bindings.values().copied()
    }

    /// Deep, structure-preserving substitution. Allocates fresh `Type`
    /// cells for any node whose children changed; returns the same `GcRef`
    /// unchanged for nodes with no free variables (and therefore no new
    /// allocation at all) to keep repeated `resolve()` calls cheap.
    pub fn apply(&self, heap: &mut Heap, ty: GcRef<Type>, stack: &[Value]) -> Result<GcRef<Type>, ResourceError> {
        let value = heap.get_type(ty).clone();
        match value {
            Type::Top | Type::Bottom | Type::TypeOfTypes | Type::Name(_) => Ok(ty),
            Type::Var(v) => match self.get(v.uid) {
                Some(bound) => self.apply(heap, bound, stack),
                None => Ok(ty),
            },
            Type::Array(item) => {
                let new_item = self.apply(heap, item, stack)?;
                if new_item == item {
                    return Ok(ty);
                }
                heap.allocate_type(Type::Array(new_item), stack)
            }
            Type::Tuple(items) => {
                let mut changed = false;
                let mut new_items = Vec::with_capacity(items.len());
                for item in &items {
                    let substituted = self.apply(heap, *item, stack)?;
                    changed |= substituted != *item;
                    new_items.push(substituted);
                }
                if !changed {
                    return Ok(ty);
                }
                heap.allocate_type(Type::Tuple(new_items), stack)
            }
            Type::Record(fields) => {
                let mut changed = false;
                let mut new_fields = Vec::with_capacity(fields.len());
                for (name, field_ty) in &fields {
                    let substituted = self.apply(heap, *field_ty, stack)?;
                    changed |= substituted != *field_ty;
                    new_fields.push((name.clone(), substituted));
                }
                if !changed {
                    return Ok(ty);
                }
                heap.allocate_type(Type::Record(new_fields), stack)
            }
            Type::Function { params, ret, inferred_count } => {
                let mut changed = false;
                let mut new_params = Vec::with_capacity(params.len());
                for p in &params {
                    let substituted = self.apply(heap, *p, stack)?;
                    changed |= substituted != *p;
                    new_params.push(substituted);
                }
                let new_ret = self.apply(heap, ret, stack)?;
                changed |= new_ret != ret;
                if !changed {
                    return Ok(ty);
                }
                heap.allocate_type(
                    Type::Function { params: new_params, ret: new_ret, inferred_count },
                    stack,
                )
            }
            Type::Union(a, b) => {
                let new_a = self.apply(heap, a, stack)?;
                let new_b = self.apply(heap, b, stack)?;
                if new_a == a && new_b == b {
                    return Ok(ty);
                }
                heap.allocate_type(Type::Union(new_a, new_b), stack)
            }
            Type::Binding(name, inner) => {
                let new_inner = self.apply(heap, inner, stack)?;
                if new_inner == inner {
                    return Ok(ty);
                }
                heap.allocate_type(Type::Binding(name, new_inner), stack)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_var_is_unchanged() {
        let mut heap = Heap::new(false);
        let var = heap
            .allocate_type(Type::Var(super::super::TypeVar { uid: 1, display_name: "T".into(), rigid: false }), &[])
            .unwrap();
        let subst = Substitution::new();
        assert_eq!(subst.apply(&mut heap, var, &[]).unwrap(), var);
    }

    #[test]
    fn bound_var_resolves_through_array() {
        let mut heap = Heap::new(false);
        let num = heap.allocate_type(Type::Name("Number".into()), &[]).unwrap();
        let var = heap
            .allocate_type(Type::Var(super::super::TypeVar { uid: 1, display_name: "T".into(), rigid: false }), &[])
            .unwrap();
        let arr = heap.allocate_type(Type::Array(var), &[]).unwrap();
        let mut subst = Substitution::new();
        subst.bind(1, num);
        let result = subst.apply(&mut heap, arr, &[]).unwrap();
        match heap.get_type(result) {
            Type::Array(item) => assert_eq!(*item, num),
            other => panic!("expected Array, got {:?}", other),
        }
    }

    #[test]
    fn substitution_is_idempotent() {
        let mut heap = Heap::new(false);
        let num = heap.allocate_type(Type::Name("Number".into()), &[]).unwrap();
        let var = heap
            .allocate_type(Type::Var(super::super::TypeVar { uid: 1, display_name: "T".into(), rigid: false }), &[])
            .unwrap();
        let mut subst = Substitution::new();
        subst.bind(1, num);
        let once = subst.apply(&mut heap, var, &[]).unwrap();
        let twice = subst.apply(&mut heap, once, &[]).unwrap();
        assert_eq!(once, twice);
    }
}
