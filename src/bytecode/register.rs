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

//! A signed offset into a call frame: positive is a 1-based local slot,
//! zero or negative is a parameter slot, and a distinguished sentinel offset
//! means "no register" (used for e.g. a block with no environment
//! register). Grounded on
//! `examples/original_source/src/bytecode/Register.{h,cpp}`.

use std::fmt;

const INVALID_OFFSET: i32 = i32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    offset: i32,
}

impl Register {
    pub fn for_local(offset: u32) -> Register {
        debug_assert!(offset > 0, "local register offset must be nonzero");
        Register { offset: offset as i32 }
    }

    pub fn for_parameter(offset: u32) -> Register {
        Register { offset: -(offset as i32) }
    }

    pub fn invalid() -> Register {
        Register { offset: INVALID_OFFSET }
    }

    pub fn is_valid(&self) -> bool {
        self.offset != INVALID_OFFSET
    }

    pub fn is_local(&self) -> bool {
        self.offset > 0
    }

    /// Panics on an invalid register, matching the original's assertion.
    pub fn offset(&self) -> i32 {
        debug_assert!(self.is_valid(), "trying to get offset of invalid register");
        self.offset
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            write!(f, "<invalid>")
        } else if self.is_local() {
            write!(f, "loc{}", self.offset)
        } else {
            write!(f, "arg{}", -self.offset)
        }
    }
}

impl Default for Register {
    fn default() -> Register {
        Register::invalid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_and_parameter_offsets_have_opposite_signs() {
        assert_eq!(Register::for_local(3).offset(), 3);
        assert_eq!(Register::for_parameter(0).offset(), 0);
        assert_eq!(Register::for_parameter(2).offset(), -2);
    }

    #[test]
    fn invalid_register_is_not_valid_and_not_local() {
        let r = Register::invalid();
        assert!(!r.is_valid());
        assert!(!r.is_local());
    }

    #[test]
    fn display_matches_local_and_parameter_convention() {
        assert_eq!(Register::for_local(1).to_string(), "loc1");
        assert_eq!(Register::for_parameter(1).to_string(), "arg1");
        assert_eq!(Register::invalid().to_string(), "<invalid>");
    }
}
