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

//! Mapping from identifier string to `Value`, plus a parent link. Lookups
//! chain to the parent on miss; mutated only by `SetLocal`.
//!
//! Grounded on `examples/original_source/src/runtime/Environment.{h,cpp}`,
//! adapted so the parent link is a heap handle (environments are
//! GC-managed, not `Rc`-owned, since closures sharing a parent form a graph
//! the collector must be free to break cycles in).

use crate::heap::{CellRef, GcRef, Trace};
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct GcEnvironment {
    bindings: Vec<(String, Value)>,
    pub parent: Option<GcRef<GcEnvironment>>,
}

impl GcEnvironment {
    pub fn new(parent: Option<GcRef<GcEnvironment>>) -> Self {
        GcEnvironment { bindings: Vec::new(), parent }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(entry) = self.bindings.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        } else {
            self.bindings.push((name.to_string(), value));
        }
    }

    /// Local lookup only; chaining to the parent requires the heap (to
    /// dereference `parent`) and so lives on `Heap`/`Interpreter` instead.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.bindings.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

impl Trace for GcEnvironment {
    fn trace(&self, visitor: &mut dyn FnMut(Value)) {
        for (_, v) in &self.bindings {
            visitor(*v);
        }
        if let Some(parent) = self.parent {
            visitor(Value::cell(CellRef::Environment(parent)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_get_local() {
        let mut env = GcEnvironment::new(None);
        env.define("x", Value::number(1.0));
        assert_eq!(env.get_local("x"), Some(Value::number(1.0)));
        assert_eq!(env.get_local("y"), None);
    }

    #[test]
    fn redefine_overwrites() {
        let mut env = GcEnvironment::new(None);
        env.define("x", Value::number(1.0));
        env.define("x", Value::number(2.0));
        assert_eq!(env.get_local("x"), Some(Value::number(2.0)));
    }
}
