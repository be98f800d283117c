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

//! Adapter from this crate's `LOG_<channel>` contract onto the `log` facade.
//!
//! `RUST_LOG` cannot express "one channel per subsystem name chosen by this
//! crate", so each channel is checked directly against the environment and,
//! if enabled, forwarded to `log::trace!` under a target matching the
//! channel name. A binary that wants to see the output still needs to
//! install a `log` implementation (`env_logger::init()` is what the test
//! suite and any future CLI driver use); this module only decides whether a
//! given line is worth emitting.

use crate::config::log_channel_enabled;

/// The three channels this crate defines: unification and constraint
/// solving trace lines, plus the interpreter's own general-purpose channel.
pub const UNIFICATION_SCOPE: &str = "UnificationScope";
pub const CONSTRAINT_SOLVING: &str = "ConstraintSolving";
pub const INTERPRETER: &str = "Interpreter";

/// Emit `message` (lazily built by `f`) on `channel` if `LOG_<channel>` is
/// set. Lazy so hot paths (e.g. constraint solving) don't pay formatting
/// cost when the channel is off.
pub fn trace(channel: &str, f: impl FnOnce() -> String) {
    if log_channel_enabled(channel) {
        log::trace!(target: "reach", "[{}] {}", channel, f());
    }
}

#[macro_export]
macro_rules! log_channel {
    ($channel:expr, $($arg:tt)*) => {
        $crate::logging::trace($channel, || format!($($arg)*));
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_channel_does_not_panic() {
        // No LOG_ThisChannelDoesNotExist set in the test environment.
        trace("ThisChannelDoesNotExist", || panic!("should not be formatted"));
    }
}
