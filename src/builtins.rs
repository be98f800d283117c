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

//! The built-in registry: `print`/`println`/`stringify`, plumbed through an
//! `Output` sink abstraction grounded on `examples/emdash-udashboard/src/vm.rs`'s
//! `Output` trait ("trait for capturing VM debug output"), here generalized
//! from one opcode's debug dump to the program's entire output channel.

use crate::cells::GcFunction;
use crate::diagnostics::SourceLocation;
use crate::error::RuntimeError;
use crate::heap::CellRef;
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::io::Write;
use std::rc::Rc;

/// Where a running program's output goes. `()` discards it; `Vec<String>`
/// captures it for tests; `Stdout` is the default host binding.
pub trait Output {
    /// Writes `text` verbatim (`print`).
    fn write(&mut self, text: &str);

    /// Writes `text` followed by a newline (`println`). Default in terms of
    /// `write`; sinks that buffer lines may want to override this directly.
    fn writeln(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }
}

impl Output for () {
    fn write(&mut self, _text: &str) {}
}

/// Captures each `println` call as one element; `print` calls are appended
/// to the last (or a fresh) element instead of splitting lines, so tests can
/// assert on exact program output.
impl Output for Vec<String> {
    fn write(&mut self, text: &str) {
        match self.last_mut() {
            Some(last) if !last.ends_with('\n') => last.push_str(text),
            _ => self.push(text.to_string()),
        }
    }
}

pub struct StdoutSink;

impl Output for StdoutSink {
    fn write(&mut self, text: &str) {
        let mut out = std::io::stdout();
        let _ = out.write_all(text.as_bytes());
    }
}

pub fn stringify_value(heap: &crate::heap::Heap, v: Value) -> String {
    if let Some(n) = v.as_number() {
        return n.to_string();
    }
    if let Some(b) = v.as_bool() {
        return b.to_string();
    }
    if v.is_unit() {
        return "()".to_string();
    }
    if v.is_crash() {
        return "<crash>".to_string();
    }
    match v.as_cell_ref() {
        Some(CellRef::Str(r)) => heap.get_string(r).value.clone(),
        Some(CellRef::Array(r)) => {
            let items = &heap.get_array(r).items;
            let parts: Vec<String> = items.iter().map(|i| stringify_value(heap, *i)).collect();
            format!("[{}]", parts.join(", "))
        }
        Some(CellRef::Tuple(r)) => {
            let items = &heap.get_tuple(r).items;
            let parts: Vec<String> = items.iter().map(|i| stringify_value(heap, *i)).collect();
            format!("({})", parts.join(", "))
        }
        Some(CellRef::Object(r)) => {
            let fields = &heap.get_object(r).fields;
            let parts: Vec<String> = fields.iter().map(|(n, v)| format!("{}: {}", n, stringify_value(heap, *v))).collect();
            format!("{{ {} }}", parts.join(", "))
        }
        _ => "<value>".to_string(),
    }
}

fn expect_string(interpreter: &Interpreter, v: Value) -> Result<String, RuntimeError> {
    match v.as_cell_ref() {
        Some(CellRef::Str(r)) => Ok(interpreter.heap_ref().get_string(r).value.clone()),
        _ => Err(RuntimeError::WrongCellKind {
            location: SourceLocation::synthetic(),
            expected: "String",
            found: "other",
        }),
    }
}

/// Builds the `print`/`println`/`stringify` native functions. `print`
/// and `println` differ only in the trailing newline, matching the
/// signatures `(String) -> Void`.
pub fn print_fn(newline: bool) -> GcFunction {
    GcFunction::Native {
        name: if newline { "println" } else { "print" },
        arity: 1,
        implementation: Rc::new(move |interpreter, args| {
            let text = expect_string(interpreter, args[0])?;
            if newline {
                interpreter.output_mut().writeln(&text);
            } else {
                interpreter.output_mut().write(&text);
            }
            Ok(Value::unit())
        }),
        ty: None,
    }
}

pub fn stringify_fn() -> GcFunction {
    GcFunction::Native {
        name: "stringify",
        arity: 1,
        implementation: Rc::new(|interpreter, args| {
            let text = stringify_value(interpreter.heap_ref(), args[0]);
            let stack: Vec<Value> = Vec::new();
            let r = interpreter
                .heap_mut()
                .allocate_string(crate::cells::GcString::new(text), &stack)
                .map_err(|_| RuntimeError::Crash { location: SourceLocation::synthetic() })?;
            Ok(Value::cell(CellRef::Str(r)))
        }),
        ty: None,
    }
}
