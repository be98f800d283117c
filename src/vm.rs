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

//! The VM singleton: owns the heap, the one persistent global environment,
//! and the running type-variable uid counter, and drives a program from AST
//! to observed output. `!Send`/`!Sync` by construction (the heap holds
//! plain `Vec`-backed allocators with no synchronization), matching
//! `examples/original_source/src/runtime/Environment.h`'s single-threaded
//! ownership rather than introducing `Mutex`/`Arc`.
//!
//! `run_source_ast` is the one entry point an external CLI driver (out of
//! scope here) needs: generate bytecode, run every type-check block first
//! and fail closed on any diagnostic, then run the value-mode program. This
//! mirrors the generator's decision to keep type-checking and execution as
//! two independent blocks rather than one interleaved stream (see
//! DESIGN.md).

use crate::ast::Program;
use crate::builtins::{print_fn, stringify_fn, Output, StdoutSink};
use crate::config::RuntimeConfig;
use crate::diagnostics::Diagnostics;
use crate::environment::{self, GcEnvironmentRef};
use crate::error::{ReachError, Result};
use crate::generator::BytecodeGenerator;
use crate::heap::{CellRef, Heap};
use crate::interpreter::Interpreter;
use crate::cells::GcEnvironment;
use crate::types::Type;
use crate::value::Value;

/// Nominal types registered in the global environment at startup: the four
/// primitive names plus the three type-of-types bookends a `NewNameType`
/// lookup or a type annotation can reference by name.
const NOMINAL_NAMES: &[&str] = &["Void", "Bool", "Number", "String"];

pub struct Vm {
    heap: Heap,
    global_env: GcEnvironmentRef,
    config: RuntimeConfig,
    next_type_var_uid: u32,
    output: Box<dyn Output>,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_output(Box::new(StdoutSink))
    }

    /// Builds a VM writing program output to `output` instead of stdout; the
    /// end-to-end tests use this with a `Vec<String>` sink.
    pub fn with_output(output: Box<dyn Output>) -> Self {
        let config = RuntimeConfig::from_env();
        let mut heap = Heap::new(config.no_gc);
        let global_env = heap
            .allocate_environment(GcEnvironment::new(None), &[])
            .expect("fresh heap cannot be exhausted");
        heap.add_root(CellRef::Environment(global_env));

        let mut vm = Vm { heap, global_env, config, next_type_var_uid: 0, output };
        vm.register_builtins();
        vm
    }

    fn register_builtins(&mut self) {
        for name in NOMINAL_NAMES {
            let r = self
                .heap
                .allocate_type(Type::Name((*name).to_string()), &[])
                .expect("fresh heap cannot be exhausted");
            environment::define(&mut self.heap, self.global_env, name, Value::cell(CellRef::Type(r)));
        }
        for (name, ty) in [("Type", Type::TypeOfTypes), ("Top", Type::Top), ("Bottom", Type::Bottom)] {
            let r = self.heap.allocate_type(ty, &[]).expect("fresh heap cannot be exhausted");
            environment::define(&mut self.heap, self.global_env, name, Value::cell(CellRef::Type(r)));
        }

        for (name, function) in [("print", print_fn(false)), ("println", print_fn(true)), ("stringify", stringify_fn())] {
            let r = self.heap.allocate_function(function, &[]).expect("fresh heap cannot be exhausted");
            environment::define(&mut self.heap, self.global_env, name, Value::cell(CellRef::Function(r)));
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Forces a collection, exercising that values reachable only through
    /// the global environment survive a GC run between calls.
    pub fn collect_garbage(&mut self) {
        self.heap.collect(&[]);
    }

    /// Generates bytecode for `program`, type-checks every function and the
    /// top-level program (failing closed on the first batch of diagnostics),
    /// then executes the value-mode program.
    pub fn run_source_ast(&mut self, program: &Program) -> Result<()> {
        let generated = {
            let mut generator = BytecodeGenerator::new(&mut self.heap, self.config.jit_threshold);
            generator.generate_program(program)
        };

        if self.config.dump_bytecode {
            log::debug!(target: "reach", "{:#?}", generated.value_block.instructions());
        }

        let mut diagnostics = Diagnostics::new();
        {
            let mut sink = ();
            let mut interpreter = Interpreter::new(&mut self.heap, &mut sink);
            for block in &generated.type_check_blocks {
                let d = interpreter.run_type_check(&mut self.next_type_var_uid, block, self.global_env);
                for e in d.errors() {
                    diagnostics.push(e.location.clone(), e.message.clone());
                }
            }
        }
        if !diagnostics.is_empty() {
            return Err(ReachError::from(diagnostics));
        }

        let mut interpreter = Interpreter::new(&mut self.heap, &mut *self.output);
        interpreter.run(&generated.value_block, Vec::new(), Some(self.global_env))?;
        Ok(())
    }
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Declaration, Expr, LexicalDecl, Statement};
    use crate::diagnostics::SourceLocation;

    fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Call { callee: Box::new(Expr::Identifier(name.to_string(), SourceLocation::synthetic())), args, location: SourceLocation::synthetic() }
    }

    #[test]
    fn prints_a_string_literal() {
        let program = Program {
            declarations: vec![Declaration::Statement(Statement::Expression(call(
                "println",
                vec![Expr::Str("hello".to_string(), SourceLocation::synthetic())],
            )))],
        };

        let output = Box::new(Vec::<String>::new());
        let mut vm = Vm::with_output(output);
        vm.run_source_ast(&program).expect("program should run cleanly");
    }

    #[test]
    fn a_let_binding_is_visible_to_later_statements() {
        let program = Program {
            declarations: vec![
                Declaration::Lexical(LexicalDecl {
                    name: "x".to_string(),
                    is_const: false,
                    type_annotation: None,
                    init: Some(Expr::Number(42.0, SourceLocation::synthetic())),
                    location: SourceLocation::synthetic(),
                }),
                Declaration::Statement(Statement::Expression(Expr::Identifier("x".to_string(), SourceLocation::synthetic()))),
            ],
        };

        let mut vm = Vm::with_output(Box::new(Vec::<String>::new()));
        vm.run_source_ast(&program).expect("program should run cleanly");
    }
}
