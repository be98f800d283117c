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

//! Chained environment lookup: a miss walks up to the parent scope, adapted
//! to walk a heap-owned parent chain rather than an `Rc` chain.

use crate::cells::GcEnvironment;
use crate::heap::{GcRef, Heap};
use crate::value::Value;

pub type GcEnvironmentRef = GcRef<GcEnvironment>;

pub fn lookup(heap: &Heap, env: GcEnvironmentRef, name: &str) -> Option<Value> {
    let mut current = Some(env);
    while let Some(r) = current {
        let environment = heap.get_environment(r);
        if let Some(v) = environment.get_local(name) {
            return Some(v);
        }
        current = environment.parent;
    }
    None
}

/// `SetLocal`: defines/overwrites a binding in `env` itself, never in an
/// ancestor.
pub fn define(heap: &mut Heap, env: GcEnvironmentRef, name: &str, value: Value) {
    heap.get_environment_mut(env).define(name, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::GcEnvironment;

    #[test]
    fn lookup_chains_to_parent() {
        let mut heap = Heap::new(false);
        let parent = heap.allocate_environment(GcEnvironment::new(None), &[]).unwrap();
        define(&mut heap, parent, "x", Value::number(1.0));
        let child = heap.allocate_environment(GcEnvironment::new(Some(parent)), &[]).unwrap();
        assert_eq!(lookup(&heap, child, "x"), Some(Value::number(1.0)));
        assert_eq!(lookup(&heap, child, "missing"), None);
    }

    #[test]
    fn define_shadows_without_mutating_parent() {
        let mut heap = Heap::new(false);
        let parent = heap.allocate_environment(GcEnvironment::new(None), &[]).unwrap();
        define(&mut heap, parent, "x", Value::number(1.0));
        let child = heap.allocate_environment(GcEnvironment::new(Some(parent)), &[]).unwrap();
        define(&mut heap, child, "x", Value::number(2.0));
        assert_eq!(lookup(&heap, child, "x"), Some(Value::number(2.0)));
        assert_eq!(lookup(&heap, parent, "x"), Some(Value::number(1.0)));
    }
}
