#![deny(missing_docs)]
//! Shared logging utilities for the mirror workspace.
//!
//! This crate provides the `mirror_*` logging macros used across the codebase,
//! the poll-cycle context they stamp on every line, and a minimal test
//! initializer for the global logger.

use std::cell::Cell;

#[doc(hidden)]
pub use log as __log;

thread_local! {
    /// Thread-local storage for the current poll cycle number.
    static POLL_CYCLE: Cell<u64> = const { Cell::new(0) };
}

/// Sets the poll cycle number for the current thread.
/// The poll loop calls this once at the start of every cycle.
pub fn set_poll_cycle(cycle: u64) {
    POLL_CYCLE.with(|v| v.set(cycle));
}

/// Retrieves the poll cycle number for the current thread.
/// Returns 0 outside of a cycle (startup, tests).
pub fn poll_cycle() -> u64 {
    POLL_CYCLE.with(|v| v.get())
}

#[doc(hidden)]
#[macro_export]
macro_rules! __mirror_log {
    ($level:ident, $($arg:tt)*) => {{
        let cycle = $crate::poll_cycle();
        if cycle == 0 {
            $crate::__log::$level!($($arg)*);
        } else {
            $crate::__log::$level!("[cycle {}] {}", cycle, format_args!($($arg)*));
        }
    }};
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! mirror_trace {
    ($($arg:tt)*) => {
        $crate::__mirror_log!(trace, $($arg)*)
    };
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! mirror_info {
    ($($arg:tt)*) => {
        $crate::__mirror_log!(info, $($arg)*)
    };
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! mirror_debug {
    ($($arg:tt)*) => {
        $crate::__mirror_log!(debug, $($arg)*)
    };
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! mirror_warn {
    ($($arg:tt)*) => {
        $crate::__mirror_log!(warn, $($arg)*)
    };
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! mirror_error {
    ($($arg:tt)*) => {
        $crate::__mirror_log!(error, $($arg)*)
    };
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::{poll_cycle, set_poll_cycle};

    #[test]
    fn poll_cycle_is_thread_local() {
        set_poll_cycle(7);
        assert_eq!(poll_cycle(), 7);

        let other = std::thread::spawn(poll_cycle).join().unwrap();
        assert_eq!(other, 0);
    }

    #[test]
    fn macros_expand_inside_and_outside_a_cycle() {
        super::initialize_for_tests();
        set_poll_cycle(0);
        mirror_info!("startup line {}", 1);
        set_poll_cycle(3);
        mirror_warn!("cycle line {}", "x");
        mirror_debug!("plain");
        set_poll_cycle(0);
    }
}
