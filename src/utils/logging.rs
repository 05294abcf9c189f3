//! Conditional, tagged logging macros.
//!
//! Each module that uses them defines two constants:
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TAG: &str = "relay";
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("polling every {}ms", 1500); // => "[relay] polling every 1500ms"
//! ```
//!
//! Flipping `ENABLE_LOGS` to `false` silences the module without touching
//! `RUST_LOG`.

/// Debug-level log line, prefixed with the module's `LOG_TAG`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!("[{}] {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}

/// Info-level log line, prefixed with the module's `LOG_TAG`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!("[{}] {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}

/// Warn-level log line, prefixed with the module's `LOG_TAG`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!("[{}] {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}

/// Error-level log line, prefixed with the module's `LOG_TAG`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!("[{}] {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}

/// Initialise the global logger. `RUST_LOG` wins; `info` otherwise.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    // A second init (tests, embedding) is not an error worth surfacing.
    let _ = env_logger::Builder::from_env(env).try_init();
}
