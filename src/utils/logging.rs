//! Conditional logging macros gated on a module-level `ENABLE_LOGS` const.
//!
//! Chatty modules (the pipeline worker logs every snapshot decision) define
//! `const ENABLE_LOGS: bool = true;` and use these instead of the plain
//! `log` macros so the whole module can be silenced with one flip. The
//! macros are exported at the crate root.

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
