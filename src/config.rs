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

//! Runtime tuning knobs, collected once from the environment into a single
//! typed struct instead of scattered `std::env::var` calls.

use std::env;

const DEFAULT_JIT_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub dump_ast: bool,
    pub dump_bytecode: bool,
    pub print_ast_locations: bool,
    pub no_gc: bool,
    pub no_jit: bool,
    pub jit_threshold: u32,
}

impl RuntimeConfig {
    /// Reads the environment-variable contract this crate honors.
    pub fn from_env() -> Self {
        RuntimeConfig {
            dump_ast: env_flag("DUMP_AST"),
            dump_bytecode: env_flag("DUMP_BYTECODE"),
            print_ast_locations: env_flag("PRINT_AST_LOCATIONS"),
            no_gc: env_flag("NO_GC"),
            no_jit: env_flag("NO_JIT"),
            jit_threshold: env::var("JIT_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_JIT_THRESHOLD),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            dump_ast: false,
            dump_bytecode: false,
            print_ast_locations: false,
            no_gc: false,
            no_jit: false,
            jit_threshold: DEFAULT_JIT_THRESHOLD,
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var_os(name).is_some()
}

/// `true` if `LOG_<channel>` is set. Used by the `logging` module's channel
/// filter and directly by call sites that want a cheap early-out before
/// formatting an expensive trace line.
pub fn log_channel_enabled(channel: &str) -> bool {
    env::var_os(format!("LOG_{}", channel)).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_gc_and_jit_enabled_with_threshold_ten() {
        let c = RuntimeConfig::default();
        assert!(!c.no_gc);
        assert!(!c.no_jit);
        assert_eq!(c.jit_threshold, 10);
    }
}
