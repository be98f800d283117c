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

//! Bytecode opcodes, grounded on `Instruction.h`'s `INSTRUCTION_IDS` table
//! (value-mode) and the parallel type-check-mode opcode list.
//!
//! Jump targets are indices into the owning block's instruction vector.
//! `Label::link` (see `label.rs`) patches them once the jump destination is
//! known; until then they hold [`PENDING_TARGET`].

use crate::bytecode::Register;

/// Placeholder target for an as-yet-unlinked jump.
pub const PENDING_TARGET: usize = usize::MAX;

#[derive(Debug, Clone)]
pub enum Instruction {
    // --- value mode ---
    /// Loads `constants[index]` into `dst`.
    LoadConstant { dst: Register, index: u32 },
    GetLocal { dst: Register, src: Register },
    SetLocal { dst: Register, src: Register },
    /// Looks `name` up in the interpreter's global environment. A
    /// `BytecodeGenerator` resolves any identifier it cannot bind to a
    /// compile-time local/parameter slot as a reference into the VM's global
    /// environment: the built-in registry `print`/`println`/`stringify`/
    /// `Void`/`Bool`/`Number`/`String`, or any top-level binding a nested
    /// function closes over by name rather than by register.
    GetGlobal { dst: Register, name: u32 },
    /// Publishes `value` into the VM's global environment under `name`. A
    /// top-level `let`/`function` declaration's value becomes visible to
    /// every later top-level statement, and to any closure, by name rather
    /// than by register, since there is no enclosing frame for top-level
    /// bindings to live in as locals.
    SetGlobal { name: u32, value: Register },
    /// Allocates a closure over nested block `functions[function_index]`,
    /// capturing the current environment.
    NewFunction { dst: Register, function_index: u32 },
    NewObject { dst: Register },
    SetField { object: Register, name: u32, value: Register },
    GetField { dst: Register, object: Register, name: u32 },
    NewArray { dst: Register, items: Vec<Register> },
    GetArrayIndex { dst: Register, array: Register, index: Register },
    SetArrayIndex { array: Register, index: Register, value: Register },
    NewTuple { dst: Register, items: Vec<Register> },
    GetTupleIndex { dst: Register, tuple: Register, index: u32 },
    /// Calls `callee` with `args`, storing the result in `dst`.
    Call { dst: Register, callee: Register, args: Vec<Register> },
    Jump { target: usize },
    JumpIfFalse { condition: Register, target: usize },
    Return { value: Register },
    End,

    // --- type-check mode ---
    PushScope,
    PopScope,
    PushUnificationScope,
    /// Finalizes and pops the innermost unification scope, storing whether
    /// it resolved without error as a boolean in `dst`.
    PopUnificationScope { dst: Register },
    Unify { lhs: Register, rhs: Register },
    ResolveType { dst: Register, src: Register },
    /// Tests that `value` (already a `Type` cell) is of class `expected_class`
    /// (`Type::class_name()`, e.g. `"Array"`); result is boolean.
    CheckType { dst: Register, value: Register, expected_class: String },
    /// Tests that a concrete `value` inhabits a type of class `expected_class`.
    CheckValue { dst: Register, value: Register, expected_class: String },
    TypeError { message: String },
    NewVarType { dst: Register, display_name: String, rigid: bool },
    NewNameType { dst: Register, name: u32 },
    NewArrayType { dst: Register, item: Register },
    NewTupleType { dst: Register, items: Vec<Register> },
    NewRecordType { dst: Register, fields: Vec<(u32, Register)> },
    NewFunctionType { dst: Register, params: Vec<Register>, ret: Register },
    NewUnionType { dst: Register, lhs: Register, rhs: Register },
    NewBindingType { dst: Register, name: u32, inner: Register },
    /// Wraps a concrete value as an `AbstractValue` type-checker operand.
    NewValue { dst: Register, value: Register },
    GetTypeForValue { dst: Register, value: Register },
    NewCallHole { dst: Register, callee: Register, args: Vec<Register> },
    NewSubscriptHole { dst: Register, target: Register, index: Register },
    NewMemberHole { dst: Register, object: Register, property: u32 },
    InferImplicitParameters { function: Register },
}

impl Instruction {
    /// Rewrites a jump's placeholder target. Panics on any other variant;
    /// only `Label` calls this, and only on instructions it itself recorded.
    pub fn patch_target(&mut self, resolved: usize) {
        match self {
            Instruction::Jump { target } => *target = resolved,
            Instruction::JumpIfFalse { target, .. } => *target = resolved,
            other => panic!("patch_target called on non-jump instruction {:?}", other),
        }
    }
}
