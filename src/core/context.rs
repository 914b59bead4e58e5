//! # Per-thread context and guarded callback invocation.
//!
//! A [`ThreadContext`] owns everything that belongs to one thread id for the
//! duration of a run: the id, the per-thread state slot and the result slot.
//! It is handed to exactly one thread at a time as `&mut`, so no locking is needed.
//!
//! [`ThreadContext::invoke`] runs one callback with panic isolation and reports
//! new failures on the bus:
//!
//! ```text
//! invoke(phase, f)
//!   ├─ was_ok = result.is_ok()
//!   ├─ catch_unwind(f(&mut state, &mut result))
//!   │     └─ panic ─► result.fail(STATUS_PANICKED, msg) ─► publish CallbackPanicked
//!   └─ was_ok && result.is_failed() ─► publish CallbackFailed
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::core::Phase;
use crate::events::{Bus, Event, EventKind};
use crate::results::{STATUS_PANICKED, ThreadResult};

/// Everything owned by one thread id during a run.
#[derive(Debug)]
pub struct ThreadContext<S> {
    id: u32,
    state: Option<S>,
    result: ThreadResult,
}

impl<S> ThreadContext<S> {
    pub(crate) fn new(id: u32) -> Self {
        Self {
            id,
            state: None,
            result: ThreadResult::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn result(&self) -> &ThreadResult {
        &self.result
    }

    /// True while no callback has recorded a failure for this id.
    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.result.is_ok()
    }

    /// Runs one callback for this context, isolating panics.
    ///
    /// The panic hook is left alone: it runs before the unwind is caught here.
    ///
    /// Publishes `CallbackFailed` if this call turned a healthy slot into a failed one,
    /// or `CallbackPanicked` if the callback panicked.
    pub(crate) fn invoke<F>(&mut self, phase: Phase, emit: &Emitter<'_>, f: F)
    where
        F: FnOnce(&mut Option<S>, &mut ThreadResult),
    {
        let was_ok = self.result.is_ok();
        let state = &mut self.state;
        let result = &mut self.result;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(state, result)));

        match outcome {
            Ok(()) => {
                if was_ok && self.result.is_failed() {
                    emit.publish(
                        Event::new(EventKind::CallbackFailed)
                            .with_thread(self.id)
                            .with_phase(phase)
                            .with_status(self.result.status())
                            .with_reason(self.result.message().as_str()),
                    );
                }
            }
            Err(payload) => {
                let info = panic_message(&*payload);
                self.result.fail_fmt(
                    STATUS_PANICKED,
                    format_args!("{phase}() of thread {} panicked: {info}", self.id),
                );
                emit.publish(
                    Event::new(EventKind::CallbackPanicked)
                        .with_thread(self.id)
                        .with_phase(phase)
                        .with_status(self.result.status())
                        .with_reason(info),
                );
            }
        }
    }

    /// Consumes the context, dropping any state a fini callback left behind.
    pub(crate) fn into_result(self) -> ThreadResult {
        self.result
    }
}

/// Publishes events tagged with one run id.
#[derive(Clone, Copy)]
pub(crate) struct Emitter<'a> {
    bus: &'a Bus,
    run: u64,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(bus: &'a Bus, run: u64) -> Self {
        Self { bus, run }
    }

    #[inline]
    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_run(self.run));
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
