//! Verbosity-gated logging on top of `tracing`.
//!
//! `OptimizerConfig::verbosity` decides which events a run emits at all; the
//! installed subscriber then decides where they go. Warnings and fallbacks are
//! always emitted with `tracing::warn!`/`error!` and are not gated.
//!
//! | verbosity | macro          | tracing level | typical events                       |
//! |-----------|----------------|---------------|--------------------------------------|
//! | 1         | `log_changes!` | INFO          | run start/finish, new global bests   |
//! | 2         | `log_checks!`  | DEBUG         | iteration progress, repair moves     |
//! | 3         | `log_debug!`   | TRACE         | neighbors, pheromone, particle moves |

use tracing::Span;

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

#[doc(hidden)]
#[macro_export]
macro_rules! __log_gated {
    ($verbosity:expr, $min:path, $level:ident, $($arg:tt)*) => {
        if $verbosity >= $min {
            ::tracing::$level!($($arg)*);
        }
    };
}

/// INFO event when verbosity >= 1.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::__log_gated!($verbosity, $crate::logging::VERBOSITY_CHANGES, info, $($arg)*)
    };
}

/// DEBUG event when verbosity >= 2.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::__log_gated!($verbosity, $crate::logging::VERBOSITY_CHECKS, debug, $($arg)*)
    };
}

/// TRACE event when verbosity >= 3.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::__log_gated!($verbosity, $crate::logging::VERBOSITY_DEBUG, trace, $($arg)*)
    };
}

/// Span wrapping one `optimize` call so every event of the run carries its
/// algorithm and size.
pub fn run_span(algorithm: &str, scenes: usize, seed: u64) -> Span {
    tracing::info_span!("optimize", algorithm, scenes, seed)
}
