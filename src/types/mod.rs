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

//! The `Type` sum and its structural equality/substitution, grounded on
//! `examples/original_source/src/typing/PartialEvaluator.cpp`'s `Type::Class`
//! switch (the authoritative variant list; the older `Type.h`/`Type.cpp` in
//! the same tree models only Name/Function/Array and predates it) and
//! `examples/original_source/src/typing/Substitution.cpp`.
//!
//! A `Type` is itself a heap cell: nested types are [`GcRef<Type>`] handles,
//! not inline values, since a cyclic reference (`Type` <-> array of types <->
//! record of types) needs a managed reference the collector can break a
//! cycle through.

pub mod equality;
pub mod substitution;

pub use substitution::Substitution;

use crate::heap::{CellRef, GcRef, Heap, Trace};
use crate::value::Value;

pub type TypeData = Type;

#[derive(Debug, Clone)]
pub enum Type {
    Top,
    Bottom,
    /// "the type of types".
    TypeOfTypes,
    /// Nominal; equality is by identity of the interned instance, so callers
    /// compare `GcRef<Type>` equality for `Name`, never the string.
    Name(String),
    Var(TypeVar),
    Array(GcRef<Type>),
    Tuple(Vec<GcRef<Type>>),
    Record(Vec<(String, GcRef<Type>)>),
    Function {
        params: Vec<GcRef<Type>>,
        ret: GcRef<Type>,
        inferred_count: u32,
    },
    /// Syntactic, non-commutative: `A|B != B|A` unless normalized.
    Union(GcRef<Type>, GcRef<Type>),
    /// Introduces `name` into a surrounding type-level scope.
    Binding(String, GcRef<Type>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVar {
    pub uid: u32,
    pub display_name: String,
    pub rigid: bool,
}

impl Trace for Type {
    fn trace(&self, visitor: &mut dyn FnMut(Value)) {
        match self {
            Type::Top | Type::Bottom | Type::TypeOfTypes | Type::Name(_) | Type::Var(_) => {}
            Type::Array(t) => visitor(Value::cell(CellRef::Type(*t))),
            Type::Tuple(items) => {
                for t in items {
                    visitor(Value::cell(CellRef::Type(*t)));
                }
            }
            Type::Record(fields) => {
                for (_, t) in fields {
                    visitor(Value::cell(CellRef::Type(*t)));
                }
            }
            Type::Function { params, ret, .. } => {
                for t in params {
                    visitor(Value::cell(CellRef::Type(*t)));
                }
                visitor(Value::cell(CellRef::Type(*ret)));
            }
            Type::Union(a, b) => {
                visitor(Value::cell(CellRef::Type(*a)));
                visitor(Value::cell(CellRef::Type(*b)));
            }
            Type::Binding(_, t) => visitor(Value::cell(CellRef::Type(*t))),
        }
    }
}

impl Type {
    pub fn class_name(&self) -> &'static str {
        match self {
            Type::Top => "Top",
            Type::Bottom => "Bottom",
            Type::TypeOfTypes => "Type",
            Type::Name(_) => "Name",
            Type::Var(_) => "Var",
            Type::Array(_) => "Array",
            Type::Tuple(_) => "Tuple",
            Type::Record(_) => "Record",
            Type::Function { .. } => "Function",
            Type::Union(..) => "Union",
            Type::Binding(..) => "Binding",
        }
    }

    /// Human-readable rendering used by diagnostics (`"expected X but found
    /// Y"`) and by `stringify`.
    pub fn display(&self, heap: &Heap) -> String {
        match self {
            Type::Top => "Top".to_string(),
            Type::Bottom => "Bottom".to_string(),
            Type::TypeOfTypes => "Type".to_string(),
            Type::Name(name) => name.clone(),
            Type::Var(v) => v.display_name.clone(),
            Type::Array(t) => format!("[{}]", heap.get_type(*t).display(heap)),
            Type::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(|t| heap.get_type(*t).display(heap)).collect();
                format!("({})", parts.join(", "))
            }
            Type::Record(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(n, t)| format!("{}: {}", n, heap.get_type(*t).display(heap)))
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
            Type::Function { params, ret, .. } => {
                let parts: Vec<String> = params.iter().map(|t| heap.get_type(*t).display(heap)).collect();
                format!("({}) -> {}", parts.join(", "), heap.get_type(*ret).display(heap))
            }
            Type::Union(a, b) => {
                format!("{} | {}", heap.get_type(*a).display(heap), heap.get_type(*b).display(heap))
            }
            Type::Binding(name, t) => format!("{}: {}", name, heap.get_type(*t).display(heap)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::Heap;

    #[test]
    fn name_display_is_the_name() {
        let heap = Heap::new(false);
        assert_eq!(Type::Name("Number".into()).display(&heap), "Number");
    }
}
