//! # Runtime events emitted by the orchestrator and its worker threads.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Run events**: run and phase boundaries, thread spawning, barrier release
//! - **Thread events**: callback failures, panics, skipped main bodies
//! - **Subscriber events**: overflow and panics inside subscribers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, run id,
//! thread id, phase and status.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use mtt_harness::{Event, EventKind, Phase};
//!
//! let ev = Event::new(EventKind::CallbackFailed)
//!     .with_thread(2)
//!     .with_phase(Phase::ParInit)
//!     .with_status(22)
//!     .with_reason("rpma_conn_req_new() failed");
//!
//! assert_eq!(ev.kind, EventKind::CallbackFailed);
//! assert_eq!(ev.thread, Some(2));
//! assert_eq!(ev.reason.as_deref(), Some("rpma_conn_req_new() failed"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::Phase;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `run` (when raised for a run)
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed), or the run's
    /// observer fell behind the bus and lost events for every subscriber.
    ///
    /// Sets:
    /// - `run` (when raised for a run)
    /// - `reason`: subscriber name (`*` for all) and reason ("full", "closed", "lagged")
    SubscriberOverflow,

    // === Run events ===
    /// A run is starting.
    ///
    /// Sets:
    /// - `run`, `threads`, `reason`: test name
    RunStarting,

    /// A phase is starting.
    ///
    /// The parallel section is bracketed as a whole: `PhaseStarting` with
    /// `par_init` before the first spawn, `PhaseCompleted` with `par_fini` after
    /// the last join.
    ///
    /// Sets:
    /// - `run`, `phase`
    PhaseStarting,

    /// A phase has finished for every thread.
    ///
    /// Sets:
    /// - `run`, `phase`
    PhaseCompleted,

    /// A worker thread was created.
    ///
    /// Sets:
    /// - `run`, `thread`
    ThreadSpawned,

    /// A worker thread could not be created; the run is aborted.
    ///
    /// Sets:
    /// - `run`, `thread`, `reason`: OS error text
    SpawnFailed,

    /// Every participant arrived at the barrier; main bodies may start.
    ///
    /// Published once per run by the last thread to arrive.
    ///
    /// Sets:
    /// - `run`, `thread` (the last arrival), `threads` (number of failed arrivals)
    BarrierReleased,

    /// The barrier was aborted because the run could not spawn every thread.
    ///
    /// Sets:
    /// - `run`
    BarrierAborted,

    // === Thread events ===
    /// A callback recorded a failure in its result slot.
    ///
    /// Sets:
    /// - `run`, `thread`, `phase`, `status`, `reason`: slot message
    CallbackFailed,

    /// A callback panicked; the panic was recorded as a failure.
    ///
    /// Sets:
    /// - `run`, `thread`, `phase`, `status`, `reason`: panic message
    CallbackPanicked,

    /// The main body was not called because the thread failed earlier
    /// (or the barrier was aborted).
    ///
    /// Sets:
    /// - `run`, `thread`, `status`
    MainSkipped,

    /// The run has finished (always the last event of a run).
    ///
    /// Sets:
    /// - `run`, `status`, `thread` (lowest failing id, if any), `reason`
    RunFinished,
}

impl EventKind {
    /// Returns a short stable label (kebab-case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::SubscriberPanicked => "subscriber-panicked",
            EventKind::SubscriberOverflow => "subscriber-overflow",
            EventKind::RunStarting => "run-starting",
            EventKind::PhaseStarting => "phase-starting",
            EventKind::PhaseCompleted => "phase-completed",
            EventKind::ThreadSpawned => "thread-spawned",
            EventKind::SpawnFailed => "spawn-failed",
            EventKind::BarrierReleased => "barrier-released",
            EventKind::BarrierAborted => "barrier-aborted",
            EventKind::CallbackFailed => "callback-failed",
            EventKind::CallbackPanicked => "callback-panicked",
            EventKind::MainSkipped => "main-skipped",
            EventKind::RunFinished => "run-finished",
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Run this event belongs to.
    pub run: Option<u64>,
    /// Thread id, if the event concerns one thread.
    pub thread: Option<u32>,
    /// Phase, if the event concerns one phase.
    pub phase: Option<Phase>,
    /// Status code (result slot status or overall status).
    pub status: Option<i32>,
    /// Thread count (run start) or failed-arrival count (barrier).
    pub threads: Option<u32>,
    /// Human-readable reason (errors, test name, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            run: None,
            thread: None,
            phase: None,
            status: None,
            threads: None,
            reason: None,
        }
    }

    /// Attaches the run id.
    #[inline]
    pub fn with_run(mut self, run: u64) -> Self {
        self.run = Some(run);
        self
    }

    /// Attaches a thread id.
    #[inline]
    pub fn with_thread(mut self, id: u32) -> Self {
        self.thread = Some(id);
        self
    }

    /// Attaches a phase.
    #[inline]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a status code.
    #[inline]
    pub fn with_status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a thread count.
    #[inline]
    pub fn with_threads(mut self, n: u32) -> Self {
        self.threads = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// Creates the overflow event telling subscribers that `missed` bus events
    /// were lost before reaching them.
    #[inline]
    pub fn observer_lagged(missed: u64) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber=* reason=lagged missed={missed}"))
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// True if this is the final event of `run`.
    #[inline]
    pub fn finishes(&self, run: u64) -> bool {
        self.kind == EventKind::RunFinished && self.run == Some(run)
    }
}
