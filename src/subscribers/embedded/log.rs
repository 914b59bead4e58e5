//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos. Output is produced on the observer thread, so it
//! may interleave with output of the calling thread while a run is in progress.
//!
//! ## Example output
//! ```text
//! [run-starting] run=3 test="example" threads=4
//! [phase-starting] run=3 phase=seq_init
//! [thread-spawned] run=3 thread=0
//! [callback-failed] run=3 thread=2 phase=par_init status=22 reason="..."
//! [barrier-released] run=3 last=1 failed=1
//! [main-skipped] run=3 thread=2 status=22
//! [run-finished] run=3 status=22 thread=2
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let label = e.kind.as_label();
        let run = opt(e.run);
        match e.kind {
            EventKind::RunStarting => {
                println!(
                    "[{label}] run={run} test={:?} threads={}",
                    e.reason.as_deref().unwrap_or(""),
                    opt(e.threads)
                );
            }
            EventKind::PhaseStarting | EventKind::PhaseCompleted => {
                println!("[{label}] run={run} phase={}", opt(e.phase));
            }
            EventKind::ThreadSpawned => {
                println!("[{label}] run={run} thread={}", opt(e.thread));
            }
            EventKind::SpawnFailed => {
                println!(
                    "[{label}] run={run} thread={} reason={:?}",
                    opt(e.thread),
                    e.reason
                );
            }
            EventKind::BarrierReleased => {
                println!(
                    "[{label}] run={run} last={} failed={}",
                    opt(e.thread),
                    opt(e.threads)
                );
            }
            EventKind::BarrierAborted => {
                println!("[{label}] run={run}");
            }
            EventKind::CallbackFailed | EventKind::CallbackPanicked => {
                println!(
                    "[{label}] run={run} thread={} phase={} status={} reason={:?}",
                    opt(e.thread),
                    opt(e.phase),
                    opt(e.status),
                    e.reason
                );
            }
            EventKind::MainSkipped => {
                println!(
                    "[{label}] run={run} thread={} status={}",
                    opt(e.thread),
                    opt(e.status)
                );
            }
            EventKind::RunFinished => {
                println!(
                    "[{label}] run={run} status={} thread={}",
                    opt(e.status),
                    opt(e.thread)
                );
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                println!("[{label}] {}", e.reason.as_deref().unwrap_or("unknown"));
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
