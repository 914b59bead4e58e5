//! # Result aggregation.
//!
//! Reduces the per-thread [`ThreadResult`]s of a run into one [`Outcome`].
//!
//! ## Rule: first failure wins
//! ```text
//! results:  [ ok , ok , EINVAL(id 2) , EIO(id 3) ]
//!                        ▲
//!                        └─ lowest failing id decides status + message
//! ```
//! The scan goes by id, not by completion order, so the outcome is the same for
//! every thread interleaving.

use std::fmt;

use super::slot::ThreadResult;

/// Overall status of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// `0` on success, otherwise the status of the lowest failing id.
    pub status: i32,
    /// Message of the lowest failing id (empty on success).
    pub message: String,
    /// Id whose slot decided the outcome.
    pub failed_thread: Option<u32>,
}

impl Outcome {
    /// Applies first-failure-wins over `results`, indexed by thread id.
    pub fn reduce<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a ThreadResult>,
    {
        results
            .into_iter()
            .zip(0u32..)
            .find(|(r, _)| r.is_failed())
            .map(|(r, id)| Self {
                status: r.status(),
                message: r.message().as_str().to_owned(),
                failed_thread: Some(id),
            })
            .unwrap_or_default()
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    /// Maps the status to a process exit code.
    ///
    /// - `0` → `0`
    /// - `1..=255` → the status itself
    /// - anything else → `1`
    pub fn exit_code(&self) -> i32 {
        match self.status {
            0 => 0,
            s @ 1..=255 => s,
            _ => 1,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failed_thread {
            None => f.write_str("PASS"),
            Some(id) => write!(f, "FAIL [thread {id}] status={}: {}", self.status, self.message),
        }
    }
}

/// Everything a run produced: the aggregated outcome and every per-thread slot.
#[derive(Clone, Debug)]
pub struct Report {
    /// First-failure-wins reduction of [`Report::results`].
    pub outcome: Outcome,
    /// Per-thread results, indexed by thread id.
    pub results: Vec<ThreadResult>,
}

impl Report {
    /// Builds a report, aggregating `results` on the way.
    pub fn new(results: Vec<ThreadResult>) -> Self {
        let outcome = Outcome::reduce(&results);
        Self { outcome, results }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Ids of all threads that ended with a failure, in increasing order.
    pub fn failed_threads(&self) -> Vec<u32> {
        self.results
            .iter()
            .zip(0u32..)
            .filter(|(r, _)| r.is_failed())
            .map(|(_, id)| id)
            .collect()
    }
}
