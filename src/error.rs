//! Error types used by the orchestrator and the argument parser.
//!
//! This module defines two error enums:
//!
//! - [`RunError`] infrastructure failures of a run (never callback failures,
//!   which are data recorded in [`ThreadResult`](crate::ThreadResult)s).
//! - [`ArgsError`] invalid command-line arguments of a test program.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging.

use std::io;

use thiserror::Error;

/// # Errors produced by the orchestrator itself.
///
/// A callback failure is never a `RunError`; it surfaces through the
/// [`Report`](crate::Report) of a successful `run`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// The run was requested with zero threads; nothing was executed.
    #[error("thread count must be at least 1")]
    NoThreads,

    /// A worker thread could not be created; the run was aborted after cleanup.
    #[error("cannot spawn worker thread {id}: {source}")]
    Spawn {
        /// Id of the thread that could not be created.
        id: u32,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The event observer could not be started; nothing was executed.
    #[error("cannot start event observer: {source}")]
    ObserverStart {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A worker thread terminated outside of any callback.
    #[error("worker thread {id} terminated unexpectedly")]
    WorkerLost {
        /// Id of the lost thread.
        id: u32,
    },
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use mtt_harness::RunError;
    ///
    /// assert_eq!(RunError::NoThreads.as_label(), "run_no_threads");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::NoThreads => "run_no_threads",
            RunError::Spawn { .. } => "run_spawn_failed",
            RunError::ObserverStart { .. } => "run_observer_failed",
            RunError::WorkerLost { .. } => "run_worker_lost",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RunError::NoThreads => "no threads requested".to_string(),
            RunError::Spawn { id, source } => format!("spawn of thread {id} failed: {source}"),
            RunError::ObserverStart { source } => format!("observer start failed: {source}"),
            RunError::WorkerLost { id } => format!("thread {id} lost"),
        }
    }
}

/// # Errors produced while parsing test program arguments.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArgsError {
    /// Wrong number of arguments.
    #[error("usage: {program} <threads_num> <addr>")]
    Usage {
        /// Program name used in the usage line.
        program: String,
    },

    /// The thread count is not a positive integer.
    #[error("invalid number of threads: {value:?} (expected a positive integer)")]
    InvalidThreads {
        /// The rejected value.
        value: String,
    },
}

impl ArgsError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ArgsError::Usage { .. } => "args_usage",
            ArgsError::InvalidThreads { .. } => "args_invalid_threads",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_display_and_label() {
        let err = RunError::Spawn {
            id: 1,
            source: io::Error::new(io::ErrorKind::WouldBlock, "no more threads"),
        };
        assert_eq!(err.as_label(), "run_spawn_failed");
        assert_eq!(err.to_string(), "cannot spawn worker thread 1: no more threads");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_args_error_messages() {
        let err = ArgsError::Usage {
            program: "mtt".into(),
        };
        assert_eq!(err.as_message(), "usage: mtt <threads_num> <addr>");
        assert_eq!(err.as_label(), "args_usage");
    }
}
