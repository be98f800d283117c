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

//! The four error kinds this crate can surface, structured with `thiserror`
//! the way `fuel-vm`/`wasmtime` split their core errors.

use crate::diagnostics::{Diagnostics, SourceLocation};
use thiserror::Error;

/// A malformed token stream. Parsing itself is out of scope for this crate;
/// this variant exists so the error taxonomy is complete and so a future
/// parser has somewhere to report into.
#[derive(Debug, Error)]
#[error("{location}: {message}")]
pub struct ParseError {
    pub location: SourceLocation,
    pub message: String,
}

/// Fatal interpreter failures: a *Crash* value observed, an out-of-bounds
/// index, a wrong cell-kind cast, an unknown field, or division producing a
/// non-representable result. These are always fatal: the process terminates
/// with a diagnostic, they are never caught by user code (the source
/// language has no `throw`/`catch`).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{location}: crash value observed")]
    Crash { location: SourceLocation },

    #[error("{location}: index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        location: SourceLocation,
        index: i64,
        len: usize,
    },

    #[error("{location}: expected cell of kind {expected}, found {found}")]
    WrongCellKind {
        location: SourceLocation,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{location}: unknown field `{field}`")]
    UnknownField {
        location: SourceLocation,
        field: String,
    },

    #[error("{location}: `{name}` is not callable")]
    NotCallable {
        location: SourceLocation,
        name: String,
    },

    #[error("{location}: wrong number of arguments: expected {expected}, found {found}")]
    ArityMismatch {
        location: SourceLocation,
        expected: usize,
        found: usize,
    },

    #[error("{location}: undefined identifier `{name}`")]
    UndefinedIdentifier {
        location: SourceLocation,
        name: String,
    },
}

/// Allocation failed even after a collection attempt.
#[derive(Debug, Error)]
#[error("out of memory: allocator for `{kind}` exhausted after collection")]
pub struct ResourceError {
    pub kind: &'static str,
}

/// Top-level error type threading the four error kinds through the crate's
/// public API. Type errors are batched (`Diagnostics`); the other three are
/// always singular and fatal.
#[derive(Debug, Error)]
pub enum ReachError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("type checking failed:\n{0}")]
    Type(Diagnostics),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl From<Diagnostics> for ReachError {
    fn from(diagnostics: Diagnostics) -> Self {
        ReachError::Type(diagnostics)
    }
}

pub type Result<T> = std::result::Result<T, ReachError>;
