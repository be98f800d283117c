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

//! The switch-based dispatch loop, grounded on
//! `examples/original_source/src/runtime/Interpreter.{h,cpp}`.
//!
//! The original indexes one contiguous value stack by a signed frame-pointer
//! offset (`cfr + register.offset()`), so a native caller can read an
//! argument register and a callee's local register with the same arithmetic.
//! This crate keeps that same addressing scheme (`Register` is still a
//! signed offset, parameters negative, locals positive) but backs each
//! frame with its own two `Vec<Value>`s (`params`, `locals`) rather than a
//! shared array, since Rust has no equivalent of reinterpreting a raw stack
//! slice at an arbitrary signed offset without unsafe code. `live_values`
//! reconstitutes the flat view the heap's precise stack scan needs.

pub mod unification;

pub use unification::{Constraint, UnificationScope};

use crate::bytecode::{BytecodeBlock, Instruction, Register};
use crate::builtins::Output;
use crate::cells::{GcArray, GcEnvironment, GcFunction, GcObject, GcTuple};
use crate::diagnostics::{Diagnostics, SourceLocation};
use crate::environment::GcEnvironmentRef;
use crate::error::RuntimeError;
use crate::heap::{CellRef, GcRef, Heap};
use crate::logging;
use crate::types::{Type, TypeVar};
use crate::value::Value;

/// Selects the value-mode opcode table or the type-check-mode one over the
/// same instruction stream: a block runs once in each mode, back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Value,
    TypeCheck,
}

struct Frame {
    params: Vec<Value>,
    locals: Vec<Value>,
    environment: Option<GcEnvironmentRef>,
}

impl Frame {
    fn new(params: Vec<Value>, num_locals: u32) -> Frame {
        Frame {
            params,
            locals: vec![Value::crash(); num_locals as usize],
            environment: None,
        }
    }

    fn get(&self, r: Register) -> Value {
        if r.is_local() {
            self.locals[(r.offset() - 1) as usize]
        } else {
            self.params[(-r.offset()) as usize]
        }
    }

    fn set(&mut self, r: Register, value: Value) {
        if r.is_local() {
            self.locals[(r.offset() - 1) as usize] = value;
        } else {
            self.params[(-r.offset()) as usize] = value;
        }
    }
}

pub struct Interpreter<'a> {
    heap: &'a mut Heap,
    output: &'a mut dyn Output,
    frames: Vec<Frame>,
    location: SourceLocation,
}

impl<'a> Interpreter<'a> {
    pub fn new(heap: &'a mut Heap, output: &'a mut dyn Output) -> Interpreter<'a> {
        Interpreter {
            heap,
            output,
            frames: Vec::new(),
            location: SourceLocation::synthetic(),
        }
    }

    pub fn heap_ref(&self) -> &Heap {
        self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        self.heap
    }

    pub fn output_mut(&mut self) -> &mut dyn Output {
        self.output
    }

    /// Flattens every live frame into the snapshot `Heap::collect` scans
    /// precisely.
    fn live_values(&self) -> Vec<Value> {
        let mut out = Vec::new();
        for frame in &self.frames {
            out.extend_from_slice(&frame.params);
            out.extend_from_slice(&frame.locals);
        }
        out
    }

    /// Runs `block` (value mode) with `args` bound to its parameter slots
    /// and `closure` as the enclosing environment, returning the value
    /// written by `End`.
    pub fn run(
        &mut self,
        block: &BytecodeBlock,
        args: Vec<Value>,
        closure: Option<GcEnvironmentRef>,
    ) -> Result<Value, RuntimeError> {
        logging::trace(logging::INTERPRETER, || format!("enter {}", block.name()));
        let mut frame = Frame::new(args, block.num_locals());
        let env = self
            .heap
            .allocate_environment(GcEnvironment::new(closure), &self.live_values())
            .map_err(|_| RuntimeError::Crash { location: self.location.clone() })?;
        frame.environment = Some(env);
        if block.environment_register().is_valid() {
            frame.set(block.environment_register(), Value::cell(CellRef::Environment(env)));
        }
        self.frames.push(frame);

        let mut ip = 0usize;
        let result = loop {
            if let Some(loc) = block.location_of(ip) {
                self.location = loc.clone();
            }
            let instruction = &block.instructions()[ip];
            match self.dispatch_value(block, instruction)? {
                Control::Advance => ip += 1,
                Control::Jump(target) => ip = target,
                Control::Return(v) => break v,
            }
        };

        logging::trace(logging::INTERPRETER, || format!("end {}", block.name()));
        self.frames.pop();
        Ok(result)
    }

    fn current_env(&self) -> GcEnvironmentRef {
        self.frames.last().and_then(|f| f.environment).expect("no active frame")
    }

    fn dispatch_value(&mut self, block: &BytecodeBlock, instruction: &Instruction) -> Result<Control, RuntimeError> {
        let frame = self.frames.last_mut().expect("no active frame");
        match instruction {
            Instruction::LoadConstant { dst, index } => {
                let v = block.constant(*index);
                self.frames.last_mut().unwrap().set(*dst, v);
                Ok(Control::Advance)
            }
            Instruction::GetLocal { dst, src } => {
                let v = frame.get(*src);
                self.frames.last_mut().unwrap().set(*dst, v);
                Ok(Control::Advance)
            }
            Instruction::SetLocal { dst, src } => {
                let v = frame.get(*src);
                self.frames.last_mut().unwrap().set(*dst, v);
                Ok(Control::Advance)
            }
            Instruction::GetGlobal { dst, name } => {
                let identifier = block.identifier(*name).to_string();
                let env = self.current_env();
                let v = crate::environment::lookup(&*self.heap, env, &identifier)
                    .ok_or_else(|| RuntimeError::UndefinedIdentifier { location: self.location.clone(), name: identifier })?;
                self.frames.last_mut().unwrap().set(*dst, v);
                Ok(Control::Advance)
            }
            Instruction::SetGlobal { name, value } => {
                let identifier = block.identifier(*name).to_string();
                let v = frame.get(*value);
                let env = self.current_env();
                crate::environment::define(self.heap, env, &identifier, v);
                Ok(Control::Advance)
            }
            Instruction::NewFunction { dst, function_index } => {
                let nested = block.function(*function_index);
                let env = self.current_env();
                let stack = self.live_values();
                let r = self
                    .heap
                    .allocate_function(GcFunction::Bytecode { block: nested, closure: Some(env), ty: None }, &stack)
                    .map_err(|_| self.crash())?;
                self.frames.last_mut().unwrap().set(*dst, Value::cell(CellRef::Function(r)));
                Ok(Control::Advance)
            }
            Instruction::NewObject { dst } => {
                let stack = self.live_values();
                let r = self
                    .heap
                    .allocate_object(GcObject::new(Vec::new(), None), &stack)
                    .map_err(|_| self.crash())?;
                self.frames.last_mut().unwrap().set(*dst, Value::cell(CellRef::Object(r)));
                Ok(Control::Advance)
            }
            Instruction::SetField { object, name, value } => {
                let obj_ref = self.expect_object(frame.get(*object))?;
                let field_name = block.identifier(*name).to_string();
                let v = frame.get(*value);
                self.heap.get_object_mut(obj_ref).set(&field_name, v);
                Ok(Control::Advance)
            }
            Instruction::GetField { dst, object, name } => {
                let obj_ref = self.expect_object(frame.get(*object))?;
                let field_name = block.identifier(*name);
                let v = self
                    .heap
                    .get_object(obj_ref)
                    .get(field_name)
                    .ok_or_else(|| RuntimeError::UnknownField { location: self.location.clone(), field: field_name.to_string() })?;
                self.frames.last_mut().unwrap().set(*dst, v);
                Ok(Control::Advance)
            }
            Instruction::NewArray { dst, items } => {
                let values: Vec<Value> = items.iter().map(|r| frame.get(*r)).collect();
                let stack = self.live_values();
                let r = self
                    .heap
                    .allocate_array(GcArray::new(values, None), &stack)
                    .map_err(|_| self.crash())?;
                self.frames.last_mut().unwrap().set(*dst, Value::cell(CellRef::Array(r)));
                Ok(Control::Advance)
            }
            Instruction::GetArrayIndex { dst, array, index } => {
                let array_ref = self.expect_array(frame.get(*array))?;
                let idx = self.expect_index(frame.get(*index))?;
                let items = &self.heap.get_array(array_ref).items;
                let v = *items
                    .get(idx)
                    .ok_or_else(|| RuntimeError::IndexOutOfBounds { location: self.location.clone(), index: idx as i64, len: items.len() })?;
                self.frames.last_mut().unwrap().set(*dst, v);
                Ok(Control::Advance)
            }
            Instruction::SetArrayIndex { array, index, value } => {
                let array_ref = self.expect_array(frame.get(*array))?;
                let idx = self.expect_index(frame.get(*index))?;
                let v = frame.get(*value);
                let items = &mut self.heap.get_array_mut(array_ref).items;
                let len = items.len();
                if idx >= len {
                    return Err(RuntimeError::IndexOutOfBounds { location: self.location.clone(), index: idx as i64, len });
                }
                items[idx] = v;
                Ok(Control::Advance)
            }
            Instruction::NewTuple { dst, items } => {
                let values: Vec<Value> = items.iter().map(|r| frame.get(*r)).collect();
                let stack = self.live_values();
                let r = self
                    .heap
                    .allocate_tuple(GcTuple::new(values, None), &stack)
                    .map_err(|_| self.crash())?;
                self.frames.last_mut().unwrap().set(*dst, Value::cell(CellRef::Tuple(r)));
                Ok(Control::Advance)
            }
            Instruction::GetTupleIndex { dst, tuple, index } => {
                let tuple_ref = self.expect_tuple(frame.get(*tuple))?;
                let items = &self.heap.get_tuple(tuple_ref).items;
                let v = *items
                    .get(*index as usize)
                    .ok_or_else(|| RuntimeError::IndexOutOfBounds { location: self.location.clone(), index: *index as i64, len: items.len() })?;
                self.frames.last_mut().unwrap().set(*dst, v);
                Ok(Control::Advance)
            }
            Instruction::Call { dst, callee, args } => {
                let callee_value = frame.get(*callee);
                let arg_values: Vec<Value> = args.iter().map(|r| frame.get(*r)).collect();
                let result = self.call(callee_value, arg_values)?;
                self.frames.last_mut().unwrap().set(*dst, result);
                Ok(Control::Advance)
            }
            Instruction::Jump { target } => Ok(Control::Jump(*target)),
            Instruction::JumpIfFalse { condition, target } => {
                let v = frame.get(*condition);
                if v.as_bool() == Some(false) {
                    Ok(Control::Jump(*target))
                } else {
                    Ok(Control::Advance)
                }
            }
            Instruction::Return { value } => {
                let v = frame.get(*value);
                Ok(Control::Return(v))
            }
            Instruction::End => Ok(Control::Return(Value::unit())),
            other => panic!("{:?} is a type-check-mode instruction; use dispatch_type_check", other),
        }
    }

    /// Invokes a callable value.
    pub fn call(&mut self, callee: Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let cell = callee.as_cell_ref().ok_or_else(|| self.not_callable("<value>"))?;
        let function_ref = match cell {
            CellRef::Function(r) => r,
            _ => return Err(self.not_callable("<value>")),
        };
        let function = self.heap.get_function(function_ref).clone();
        match function {
            GcFunction::Native { name, arity, implementation, .. } => {
                if args.len() != arity {
                    return Err(RuntimeError::ArityMismatch { location: self.location.clone(), expected: arity, found: args.len() });
                }
                let _ = name;
                implementation(self, &args)
            }
            GcFunction::Bytecode { block, closure, .. } => {
                let block_data = self.heap.get_block(block).clone();
                self.run(&block_data, args, closure)
            }
        }
    }

    fn expect_object(&self, v: Value) -> Result<GcRef<GcObject>, RuntimeError> {
        match v.as_cell_ref() {
            Some(CellRef::Object(r)) => Ok(r),
            _ => Err(RuntimeError::WrongCellKind { location: self.location.clone(), expected: "Object", found: "other" }),
        }
    }

    fn expect_array(&self, v: Value) -> Result<GcRef<GcArray>, RuntimeError> {
        match v.as_cell_ref() {
            Some(CellRef::Array(r)) => Ok(r),
            _ => Err(RuntimeError::WrongCellKind { location: self.location.clone(), expected: "Array", found: "other" }),
        }
    }

    fn expect_tuple(&self, v: Value) -> Result<GcRef<GcTuple>, RuntimeError> {
        match v.as_cell_ref() {
            Some(CellRef::Tuple(r)) => Ok(r),
            _ => Err(RuntimeError::WrongCellKind { location: self.location.clone(), expected: "Tuple", found: "other" }),
        }
    }

    fn expect_index(&self, v: Value) -> Result<usize, RuntimeError> {
        v.as_number()
            .map(|n| n as usize)
            .ok_or_else(|| RuntimeError::WrongCellKind { location: self.location.clone(), expected: "Number", found: "other" })
    }

    fn not_callable(&self, name: &str) -> RuntimeError {
        RuntimeError::NotCallable { location: self.location.clone(), name: name.to_string() }
    }

    fn crash(&self) -> RuntimeError {
        RuntimeError::Crash { location: self.location.clone() }
    }

    /// Runs `block` in type-check mode: a separate dispatch loop over the
    /// type-check-mode opcode table, backed by its own flat register file
    /// (indexed the same way a value-mode `Frame` indexes locals, since every
    /// register a `BytecodeGenerator` allocates for type-check instructions is
    /// a local slot; type checking never touches a caller's parameter
    /// registers directly) and a `UnificationScope` stack. `next_type_var_uid`
    /// is the `Vm`'s fresh-uid counter, threaded in by reference rather than
    /// as a whole `&mut Vm` so this method doesn't need to borrow anything
    /// beyond what it actually uses. `env` resolves `GetGlobal`/`NewNameType`
    /// lookups against the nominal types and globals the `Vm` registered
    /// before generation ever ran (see DESIGN.md). Returns the accumulated
    /// diagnostics.
    pub fn run_type_check(
        &mut self,
        next_type_var_uid: &mut u32,
        block: &BytecodeBlock,
        env: GcEnvironmentRef,
    ) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let mut registers: Vec<Value> = vec![Value::crash(); block.num_locals() as usize + 1];
        let mut scopes: Vec<UnificationScope> = Vec::new();
        let mut ip = 0usize;

        while ip < block.instructions().len() {
            if let Some(loc) = block.location_of(ip) {
                self.location = loc.clone();
            }
            let instruction = &block.instructions()[ip];
            match instruction {
                Instruction::PushScope | Instruction::PopScope => {}
                Instruction::PushUnificationScope => scopes.push(UnificationScope::new()),
                Instruction::PopUnificationScope { dst } => {
                    let scope = scopes.pop().expect("PopUnificationScope with no open scope");
                    let stack = root_stack(&registers, &scopes);
                    let ok = scope.resolve(self.heap, &mut diagnostics, self.location.clone(), env, &stack).is_ok();
                    registers[dst.offset().max(0) as usize] = Value::bool(ok);
                }
                Instruction::Unify { lhs, rhs } => {
                    let lhs_v = registers[lhs.offset().max(0) as usize];
                    let rhs_v = registers[rhs.offset().max(0) as usize];
                    if let Some(scope) = scopes.last_mut() {
                        scope.enqueue(Constraint { lhs: lhs_v, rhs: rhs_v });
                    }
                }
                Instruction::GetGlobal { dst, name } => {
                    let identifier = block.identifier(*name).to_string();
                    if let Some(v) = crate::environment::lookup(&*self.heap, env, &identifier) {
                        registers[dst.offset().max(0) as usize] = v;
                    }
                }
                Instruction::NewNameType { dst, name } => {
                    let name_str = block.identifier(*name).to_string();
                    // Reuses the interned nominal instance already published
                    // in the global environment (Void/Bool/Number/String) so
                    // identity-based `Name` equality holds; falls back to a
                    // fresh cell for any other name (no builtin nominal
                    // registry entry exists to reuse).
                    let interned = crate::environment::lookup(&*self.heap, env, &name_str)
                        .and_then(|v| v.as_cell_ref())
                        .and_then(as_type_ref);
                    let r = match interned {
                        Some(r) => Some(r),
                        None => self.heap.allocate_type(Type::Name(name_str), &root_stack(&registers, &scopes)).ok(),
                    };
                    if let Some(r) = r {
                        registers[dst.offset().max(0) as usize] = Value::abstract_value(CellRef::Type(r));
                    }
                }
                Instruction::NewVarType { dst, display_name, rigid } => {
                    let uid = *next_type_var_uid;
                    *next_type_var_uid += 1;
                    let stack = root_stack(&registers, &scopes);
                    if let Ok(r) = self
                        .heap
                        .allocate_type(Type::Var(TypeVar { uid, display_name: display_name.clone(), rigid: *rigid }), &stack)
                    {
                        registers[dst.offset().max(0) as usize] = Value::abstract_value(CellRef::Type(r));
                    }
                }
                Instruction::NewArrayType { dst, item } => {
                    let item_ty = registers[item.offset().max(0) as usize].as_abstract_type().and_then(as_type_ref);
                    if let Some(item_ty) = item_ty {
                        let stack = root_stack(&registers, &scopes);
                        if let Ok(r) = self.heap.allocate_type(Type::Array(item_ty), &stack) {
                            registers[dst.offset().max(0) as usize] = Value::abstract_value(CellRef::Type(r));
                        }
                    }
                }
                Instruction::NewTupleType { dst, items } => {
                    let refs: Option<Vec<GcRef<Type>>> = items
                        .iter()
                        .map(|r| registers[r.offset().max(0) as usize].as_abstract_type().and_then(as_type_ref))
                        .collect();
                    if let Some(refs) = refs {
                        let stack = root_stack(&registers, &scopes);
                        if let Ok(r) = self.heap.allocate_type(Type::Tuple(refs), &stack) {
                            registers[dst.offset().max(0) as usize] = Value::abstract_value(CellRef::Type(r));
                        }
                    }
                }
                Instruction::NewRecordType { dst, fields } => {
                    let resolved: Option<Vec<(String, GcRef<Type>)>> = fields
                        .iter()
                        .map(|(name, r)| {
                            registers[r.offset().max(0) as usize]
                                .as_abstract_type()
                                .and_then(as_type_ref)
                                .map(|ty| (block.identifier(*name).to_string(), ty))
                        })
                        .collect();
                    if let Some(fields) = resolved {
                        let stack = root_stack(&registers, &scopes);
                        if let Ok(r) = self.heap.allocate_type(Type::Record(fields), &stack) {
                            registers[dst.offset().max(0) as usize] = Value::abstract_value(CellRef::Type(r));
                        }
                    }
                }
                Instruction::NewFunctionType { dst, params, ret } => {
                    let param_refs: Option<Vec<GcRef<Type>>> = params
                        .iter()
                        .map(|r| registers[r.offset().max(0) as usize].as_abstract_type().and_then(as_type_ref))
                        .collect();
                    let ret_ref = registers[ret.offset().max(0) as usize].as_abstract_type().and_then(as_type_ref);
                    if let (Some(params), Some(ret)) = (param_refs, ret_ref) {
                        let inferred_count = params
                            .iter()
                            .filter(|p| matches!(self.heap.get_type(**p), Type::Var(v) if !v.rigid))
                            .count() as u32;
                        let stack = root_stack(&registers, &scopes);
                        if let Ok(r) = self.heap.allocate_type(Type::Function { params, ret, inferred_count }, &stack) {
                            registers[dst.offset().max(0) as usize] = Value::abstract_value(CellRef::Type(r));
                        }
                    }
                }
                Instruction::NewUnionType { dst, lhs, rhs } => {
                    let lhs_ty = registers[lhs.offset().max(0) as usize].as_abstract_type().and_then(as_type_ref);
                    let rhs_ty = registers[rhs.offset().max(0) as usize].as_abstract_type().and_then(as_type_ref);
                    if let (Some(lhs_ty), Some(rhs_ty)) = (lhs_ty, rhs_ty) {
                        let stack = root_stack(&registers, &scopes);
                        if let Ok(r) = self.heap.allocate_type(Type::Union(lhs_ty, rhs_ty), &stack) {
                            registers[dst.offset().max(0) as usize] = Value::abstract_value(CellRef::Type(r));
                        }
                    }
                }
                Instruction::NewBindingType { dst, name, inner } => {
                    let inner_ty = registers[inner.offset().max(0) as usize].as_abstract_type().and_then(as_type_ref);
                    if let Some(inner_ty) = inner_ty {
                        let name_str = block.identifier(*name).to_string();
                        let stack = root_stack(&registers, &scopes);
                        if let Ok(r) = self.heap.allocate_type(Type::Binding(name_str, inner_ty), &stack) {
                            registers[dst.offset().max(0) as usize] = Value::abstract_value(CellRef::Type(r));
                        }
                    }
                }
                Instruction::NewValue { dst, value } => {
                    // Re-tags a cell-bearing concrete value as an
                    // `AbstractValue` so it can stand as a symbolic operand
                    // alongside genuine type variables.
                    let v = registers[value.offset().max(0) as usize];
                    if let Some(cell) = v.as_cell_ref() {
                        registers[dst.offset().max(0) as usize] = Value::abstract_value(cell);
                    }
                }
                Instruction::GetTypeForValue { dst, value } => {
                    let v = registers[value.offset().max(0) as usize];
                    let stack = root_stack(&registers, &scopes);
                    if let Some(r) = self.type_of_value(next_type_var_uid, env, v, &stack) {
                        registers[dst.offset().max(0) as usize] = Value::abstract_value(CellRef::Type(r));
                    }
                }
                Instruction::ResolveType { dst, src } => {
                    // No accumulated substitution is visible outside a
                    // UnificationScope before it finalizes (`resolve`), so
                    // there is nothing meaningful to apply mid-scope; this
                    // degrades to a copy, matching "resolve against whatever
                    // is already known" when nothing is known yet.
                    registers[dst.offset().max(0) as usize] = registers[src.offset().max(0) as usize];
                }
                Instruction::CheckType { dst, value, expected_class } => {
                    let v = registers[value.offset().max(0) as usize];
                    let ok = v
                        .as_abstract_type()
                        .and_then(as_type_ref)
                        .map(|r| self.heap.get_type(r).class_name() == expected_class)
                        .unwrap_or(false);
                    registers[dst.offset().max(0) as usize] = Value::bool(ok);
                }
                Instruction::CheckValue { dst, value, expected_class } => {
                    let v = registers[value.offset().max(0) as usize];
                    let ok = value_class_name(v).map(|c| c == expected_class).unwrap_or(false);
                    registers[dst.offset().max(0) as usize] = Value::bool(ok);
                }
                Instruction::NewCallHole { dst, callee, args } => {
                    let callee_v = registers[callee.offset().max(0) as usize];
                    let arg_values: Vec<Value> = args.iter().map(|r| registers[r.offset().max(0) as usize]).collect();
                    let stack = root_stack(&registers, &scopes);
                    if let Ok(r) = self.heap.allocate_hole(crate::hole::Hole::Call { callee: callee_v, args: arg_values }, &stack) {
                        registers[dst.offset().max(0) as usize] = Value::cell(CellRef::Hole(r));
                    }
                }
                Instruction::NewSubscriptHole { dst, target, index } => {
                    let target_v = registers[target.offset().max(0) as usize];
                    let index_v = registers[index.offset().max(0) as usize];
                    let stack = root_stack(&registers, &scopes);
                    if let Ok(r) = self.heap.allocate_hole(crate::hole::Hole::Subscript { target: target_v, index: index_v }, &stack) {
                        registers[dst.offset().max(0) as usize] = Value::cell(CellRef::Hole(r));
                    }
                }
                Instruction::NewMemberHole { dst, object, property } => {
                    let object_v = registers[object.offset().max(0) as usize];
                    let property = block.identifier(*property).to_string();
                    let stack = root_stack(&registers, &scopes);
                    if let Ok(r) = self.heap.allocate_hole(crate::hole::Hole::Member { object: object_v, property }, &stack) {
                        registers[dst.offset().max(0) as usize] = Value::cell(CellRef::Hole(r));
                    }
                }
                Instruction::InferImplicitParameters { function } => {
                    let v = registers[function.offset().max(0) as usize];
                    if let Some(r) = v.as_abstract_type().and_then(as_type_ref) {
                        if let Type::Function { params, .. } = self.heap.get_type(r).clone() {
                            if let Some(scope) = scopes.last_mut() {
                                for p in params {
                                    if let Type::Var(tv) = self.heap.get_type(p) {
                                        if !tv.rigid {
                                            scope.infer(tv.uid);
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                Instruction::TypeError { message } => {
                    diagnostics.push(self.location.clone(), message.clone());
                }
                other => panic!("{:?} is a value-mode instruction; use dispatch_value", other),
            }
            ip += 1;
        }
        diagnostics
    }

    /// Resolves `GetTypeForValue`'s operand to a type. A plain `Type` cell
    /// (an identifier hole that partially evaluated straight to a nominal
    /// type binding) is returned as-is; a hole still holding a pending
    /// member/subscript/call is first partially evaluated against `env`,
    /// and whatever of it remains undecided stands for a fresh, unrigid
    /// type variable rather than a hard error; anything else is classified
    /// by `type_of_concrete_value`. `stack` roots the allocations this may
    /// trigger against the register file and scopes still live in the
    /// caller's dispatch loop.
    fn type_of_value(&mut self, next_type_var_uid: &mut u32, env: GcEnvironmentRef, v: Value, stack: &[Value]) -> Option<GcRef<Type>> {
        match v.as_abstract_type() {
            Some(CellRef::Type(r)) => Some(r),
            Some(CellRef::Hole(_)) => {
                let resolved = crate::hole::partially_evaluate(self.heap, v, env);
                if matches!(resolved.as_any_cell_ref(), Some(CellRef::Hole(_))) {
                    let uid = *next_type_var_uid;
                    *next_type_var_uid += 1;
                    self.heap
                        .allocate_type(Type::Var(TypeVar { uid, display_name: "_".to_string(), rigid: false }), stack)
                        .ok()
                } else {
                    self.type_of_concrete_value(resolved, stack)
                }
            }
            _ => self.type_of_concrete_value(v, stack),
        }
    }

    /// Classifies a concrete value's type, allocating the `Name` cell fresh
    /// for primitives (identity doesn't matter for a throwaway comparison
    /// operand the way it does for a generator-emitted `NewNameType`) and
    /// falling back to a function's own recorded type, if any, for
    /// callables. A cell that is itself a `Type` is returned directly.
    fn type_of_concrete_value(&mut self, v: Value, stack: &[Value]) -> Option<GcRef<Type>> {
        if let Some(CellRef::Type(r)) = v.as_cell_ref() {
            return Some(r);
        }
        if v.is_number() {
            return self.heap.allocate_type(Type::Name("Number".into()), stack).ok();
        }
        if v.is_bool() {
            return self.heap.allocate_type(Type::Name("Bool".into()), stack).ok();
        }
        if v.is_unit() {
            return self.heap.allocate_type(Type::Name("Void".into()), stack).ok();
        }
        match v.as_cell_ref() {
            Some(CellRef::Str(_)) => self.heap.allocate_type(Type::Name("String".into()), stack).ok(),
            Some(CellRef::Function(r)) => match self.heap.get_function(r).clone() {
                GcFunction::Bytecode { ty: Some(CellRef::Type(t)), .. } => Some(t),
                GcFunction::Native { ty: Some(CellRef::Type(t)), .. } => Some(t),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Snapshots every register plus every value still held by an open
/// `UnificationScope`, to root a `collect` that might run mid-type-check.
/// `registers` alone misses constraint operands and substitution bindings a
/// scope holds outside the register file once `Unify` has consumed its
/// operand registers for something else.
fn root_stack(registers: &[Value], scopes: &[UnificationScope]) -> Vec<Value> {
    let mut stack = registers.to_vec();
    for scope in scopes {
        stack.extend(scope.roots());
    }
    stack
}

/// Unwraps an `AbstractValue`'s payload as a `Type` ref; `None` if the cell
/// it wraps isn't a `Type` (mirrors `unification::as_type_ref`, duplicated
/// here since that one is private to its module).
fn as_type_ref(cell: CellRef) -> Option<GcRef<Type>> {
    match cell {
        CellRef::Type(r) => Some(r),
        _ => None,
    }
}

/// Classifies a concrete value by the `Type::class_name()` its own type
/// would report, for `CheckValue`.
fn value_class_name(v: Value) -> Option<&'static str> {
    if v.is_number() || v.is_bool() || v.is_unit() {
        return Some("Name");
    }
    match v.as_cell_ref() {
        Some(CellRef::Str(_)) => Some("Name"),
        Some(CellRef::Array(_)) => Some("Array"),
        Some(CellRef::Tuple(_)) => Some("Tuple"),
        Some(CellRef::Object(_)) => Some("Record"),
        Some(CellRef::Function(_)) => Some("Function"),
        _ => None,
    }
}

enum Control {
    Advance,
    Jump(usize),
    Return(Value),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{BytecodeBlock, Instruction, Register};

    #[test]
    fn runs_a_trivial_block_returning_a_constant() {
        let mut heap = Heap::new(false);
        let mut output = ();
        let mut block = BytecodeBlock::new("main", 10);
        let idx = block.add_constant(Value::number(42.0));
        block.emit(Instruction::LoadConstant { dst: Register::for_local(1), index: idx }, None);
        block.emit(Instruction::Return { value: Register::for_local(1) }, None);
        block.set_num_locals(1);

        let mut interpreter = Interpreter::new(&mut heap, &mut output);
        let result = interpreter.run(&block, vec![], None).unwrap();
        assert_eq!(result.as_number(), Some(42.0));
    }

    #[test]
    fn jump_if_false_skips_the_truthy_branch() {
        let mut heap = Heap::new(false);
        let mut output = ();
        let mut block = BytecodeBlock::new("main", 10);
        let t = block.add_constant(Value::number(1.0));
        let f = block.add_constant(Value::number(2.0));
        let cond = block.add_constant(Value::bool(false));
        block.emit(Instruction::LoadConstant { dst: Register::for_local(1), index: cond }, None);
        block.emit(Instruction::JumpIfFalse { condition: Register::for_local(1), target: 4 }, None);
        block.emit(Instruction::LoadConstant { dst: Register::for_local(1), index: t }, None);
        block.emit(Instruction::Return { value: Register::for_local(1) }, None);
        block.emit(Instruction::LoadConstant { dst: Register::for_local(1), index: f }, None);
        block.emit(Instruction::Return { value: Register::for_local(1) }, None);
        block.set_num_locals(1);

        let mut interpreter = Interpreter::new(&mut heap, &mut output);
        let result = interpreter.run(&block, vec![], None).unwrap();
        assert_eq!(result.as_number(), Some(2.0));
    }
}
