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

//! Register bytecode, value-mode and type-check-mode opcodes alike, grounded
//! on
//! `examples/original_source/src/bytecode/{Register,Label,Instruction,
//! InstructionStream,BytecodeBlock}.{h,cpp}`.
//!
//! The original packs instructions into a flat `Vec<u32>` and recovers
//! variable-length operands (call argument lists, record field lists) by
//! reading successive words after a fixed-size header. Safe Rust has no
//! reason to pay for that packing: this crate represents a block's code as
//! `Vec<Instruction>`, an enum whose variants carry their operands directly,
//! and resolves forward jumps by patching a target *index* into that vector
//! rather than a byte offset into a word stream. Every property this needs
//! from the encoding: linear forward scan, O(1) random access to any
//! already-emitted instruction, label back-patching before a block is
//! sealed, holds for `Vec<Instruction>` exactly as it held for the packed
//! stream.

pub mod block;
pub mod instruction;
pub mod label;
pub mod register;

pub use block::BytecodeBlock;
pub use instruction::Instruction;
pub use label::Label;
pub use register::Register;
