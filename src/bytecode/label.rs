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

//! Forward-jump label, grounded on `Label.h`.
//!
//! The original tracks, per pending reference, the prologue size in effect
//! when the jump was recorded, because later code can grow the instruction
//! stream's header (e.g. inserting additional locals) and every already
//! recorded byte offset must shift by the same delta. This crate's
//! `Vec<Instruction>` stream has no such header to grow. Emitting never
//! moves an already-pushed instruction, so a label here is just the set of
//! not-yet-patched instruction indices.

use crate::bytecode::Instruction;

#[derive(Debug, Default)]
pub struct Label {
    pending: Vec<usize>,
}

impl Label {
    pub fn new() -> Label {
        Label::default()
    }

    /// Records that `instructions[at]` is a jump targeting this label.
    pub fn add_reference(&mut self, at: usize) {
        self.pending.push(at);
    }

    /// Patches every pending jump to target `instructions.len()` (the next
    /// instruction to be emitted). Consumes the label: a `Label` is linked
    /// exactly once, at the point its target becomes known.
    pub fn link(self, instructions: &mut [Instruction]) {
        let target = instructions.len();
        for at in self.pending {
            instructions[at].patch_target(target);
        }
    }

    /// Patches every pending jump to an explicit, already-known offset
    /// (used for backward jumps, e.g. a loop condition re-check).
    pub fn link_to(self, instructions: &mut [Instruction], target: usize) {
        for at in self.pending {
            instructions[at].patch_target(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Register;

    #[test]
    fn link_patches_all_pending_jumps_to_the_current_end() {
        let mut instructions = vec![
            Instruction::Jump { target: crate::bytecode::instruction::PENDING_TARGET },
            Instruction::JumpIfFalse { condition: Register::for_local(1), target: crate::bytecode::instruction::PENDING_TARGET },
        ];
        let mut label = Label::new();
        label.add_reference(0);
        label.add_reference(1);
        instructions.push(Instruction::End);
        label.link(&mut instructions);
        match instructions[0] {
            Instruction::Jump { target } => assert_eq!(target, 3),
            _ => unreachable!(),
        }
        match instructions[1] {
            Instruction::JumpIfFalse { target, .. } => assert_eq!(target, 3),
            _ => unreachable!(),
        }
    }
}
