//! Error codes and fatal-error reporting
//!
//! Every unrecoverable failure in this crate is reported exactly once at the
//! point it is detected: one error-level log line naming the component, the
//! failing operation and a numeric code. The error is then returned up to the
//! entry point, which terminates the process with that code.

use std::fmt::Display;

/// Numeric code identifying a failure path
pub trait ErrorCode {
    fn code(&self) -> u32;
}

/// Logs `error` once under `component` and hands it back for returning
pub(crate) fn fatal<E>(component: &str, error: E) -> E
where
    E: ErrorCode + Display,
{
    log::error!("{component} {error} (error 0x{:06X})", error.code());
    error
}
