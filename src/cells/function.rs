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

use crate::bytecode::BytecodeBlock;
use crate::error::RuntimeError;
use crate::heap::{CellRef, GcRef, Trace};
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::rc::Rc;

/// A function cell is either interpreted bytecode closing over an
/// environment, or a native built-in (`print`/`println`/`stringify` and
/// anything a host registers alongside them).
#[derive(Clone)]
pub enum GcFunction {
    Bytecode {
        block: GcRef<BytecodeBlock>,
        closure: Option<GcRef<crate::cells::GcEnvironment>>,
        ty: Option<CellRef>,
    },
    Native {
        name: &'static str,
        arity: usize,
        implementation: Rc<dyn for<'a> Fn(&mut Interpreter<'a>, &[Value]) -> Result<Value, RuntimeError>>,
        ty: Option<CellRef>,
    },
}

impl std::fmt::Debug for GcFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GcFunction::Bytecode { block, closure, .. } => f
                .debug_struct("Bytecode")
                .field("block", block)
                .field("closure", closure)
                .finish(),
            GcFunction::Native { name, arity, .. } => f
                .debug_struct("Native")
                .field("name", name)
                .field("arity", arity)
                .finish(),
        }
    }
}

impl Trace for GcFunction {
    fn trace(&self, visitor: &mut dyn FnMut(Value)) {
        match self {
            GcFunction::Bytecode { block, closure, ty } => {
                visitor(Value::cell(CellRef::Block(*block)));
                if let Some(env) = closure {
                    visitor(Value::cell(CellRef::Environment(*env)));
                }
                if let Some(ty) = ty {
                    visitor(Value::cell(*ty));
                }
            }
            GcFunction::Native { ty, .. } => {
                if let Some(ty) = ty {
                    visitor(Value::cell(*ty));
                }
            }
        }
    }
}
