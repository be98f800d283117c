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

//! Source positions and the diagnostic accumulator used by the type checker
//! and the interpreter's fatal-error path.

use std::fmt;

/// A single point in a source file. Offsets are byte offsets; line/column are
/// 1-based, matching the `<file>:<line>:<column>: <message>` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

/// A span with a filename, used by every AST node and carried through to
/// bytecode via the location table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct SourceLocation {
    pub file: String,
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceLocation {
    pub fn synthetic() -> Self {
        SourceLocation::default()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.start.line, self.start.column)
    }
}

/// One accumulated type error, with the message text already rendered since
/// the type checker reports in terms of already-substituted type names.
#[derive(Debug, Clone)]
pub struct TypeError {
    pub location: SourceLocation,
    pub message: String,
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// VM-owned accumulator of type errors, keyed implicitly by bytecode offset
/// through the `SourceLocation` each error carries, accumulated during type
/// checking.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<TypeError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.errors.push(TypeError {
            location,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[TypeError] {
        &self.errors
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_file_line_column_message() {
        let loc = SourceLocation {
            file: "a.reach".into(),
            start: SourcePosition { line: 3, column: 5, offset: 10 },
            end: SourcePosition { line: 3, column: 8, offset: 13 },
        };
        assert_eq!(format!("{}", loc), "a.reach:3:5");
    }

    #[test]
    fn diagnostics_batches_errors() {
        let mut d = Diagnostics::new();
        assert!(d.is_empty());
        d.push(SourceLocation::synthetic(), "expected `Number` but found `String`");
        assert!(!d.is_empty());
        assert_eq!(d.errors().len(), 1);
    }
}
