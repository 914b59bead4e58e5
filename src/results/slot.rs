//! # Per-thread outcome record.
//!
//! A [`ThreadResult`] is written by the callbacks running on behalf of one thread id
//! and read once by the aggregator after the run.
//!
//! ## Rules
//! - Status `0` means success; any other value is a failure (conventionally an OS
//!   error number, negative values are allowed for library-specific codes).
//! - The **first** failure is sticky: later calls to `fail*` are ignored, so a cleanup
//!   phase can never hide the error of an init phase.
//! - There is no way to reset a slot back to success.

use std::fmt::{self, Write};
use std::io;
use std::panic::Location;

use super::message::ErrMsg;

/// Status recorded when a callback panics instead of returning.
pub const STATUS_PANICKED: i32 = -1;

/// Outcome of one thread: status code plus bounded diagnostic text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadResult {
    status: i32,
    message: ErrMsg,
}

impl ThreadResult {
    /// Creates a successful (empty) result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status code (`0` = success).
    #[inline]
    pub fn status(&self) -> i32 {
        self.status
    }

    /// Returns the diagnostic message (empty on success).
    #[inline]
    pub fn message(&self) -> &ErrMsg {
        &self.message
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == 0
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.status != 0
    }

    /// Records a failure with a plain message.
    ///
    /// Ignored if the slot already holds a failure or if `status` is `0`.
    /// Returns `true` when this call changed the slot.
    pub fn fail(&mut self, status: i32, message: &str) -> bool {
        self.fail_fmt(status, format_args!("{message}"))
    }

    /// Records a failure with a formatted message (truncated to the slot capacity).
    pub fn fail_fmt(&mut self, status: i32, args: fmt::Arguments<'_>) -> bool {
        if status == 0 || self.is_failed() {
            return false;
        }
        self.status = status;
        let _ = self.message.write_fmt(args);
        true
    }

    /// Records an OS-level failure of `func`, tagged with the caller's location.
    ///
    /// Message format: `<file>:<line> -> <func>() failed: <os error text>`.
    ///
    /// ```
    /// use mtt_harness::ThreadResult;
    ///
    /// let mut result = ThreadResult::new();
    /// result.fail_os("ibv_reg_mr", 12);
    /// assert_eq!(result.status(), 12);
    /// assert!(result.message().as_str().contains("ibv_reg_mr() failed"));
    /// ```
    #[track_caller]
    pub fn fail_os(&mut self, func: &str, errno: i32) -> bool {
        let at = Location::caller();
        let err = io::Error::from_raw_os_error(errno);
        self.fail_fmt(
            errno,
            format_args!(
                "{}:{} -> {}() failed: {}",
                base_file_name(at.file()),
                at.line(),
                func,
                err
            ),
        )
    }
}

impl fmt::Display for ThreadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            f.write_str("ok")
        } else {
            write!(f, "status={} {}", self.status, self.message)
        }
    }
}

/// Strips the directory part of a source path.
fn base_file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
