//! # Parallel part of one thread's lifecycle.
//!
//! Runs on the worker thread of a single id:
//!
//! ```text
//! healthy? ──yes──► par_init
//!    │
//!    ▼
//! barrier.arrive(healthy)          (always, even when failed)
//!    ├─ Complete ─► healthy? ──yes──► main
//!    │                   └────no───► publish MainSkipped
//!    └─ Aborted  ─► publish MainSkipped
//!    ▼
//! par_fini                          (always)
//! ```
//!
//! ## Rules
//! - A thread that failed in `seq_init` skips `par_init` but still arrives.
//! - No callback panic can keep a thread from arriving: every callback runs
//!   through [`ThreadContext::invoke`].
//! - The last thread to arrive publishes `BarrierReleased`.

use crate::core::barrier::{PhaseBarrier, Release};
use crate::core::context::{Emitter, ThreadContext};
use crate::core::Phase;
use crate::events::{Event, EventKind};
use crate::suite::MultithreadedTest;

/// Drives `par_init → barrier → main → par_fini` for one context.
pub(crate) fn run_worker<T>(
    test: &T,
    prestate: &T::Prestate,
    ctx: &mut ThreadContext<T::State>,
    barrier: &PhaseBarrier,
    emit: &Emitter<'_>,
) where
    T: MultithreadedTest,
{
    let id = ctx.id();

    if ctx.is_healthy() {
        ctx.invoke(Phase::ParInit, emit, |state, result| {
            test.par_init(id, prestate, state, result)
        });
    }

    let release = barrier.arrive(ctx.is_healthy());
    if let Release::Complete {
        leader: true,
        failed,
    } = release
    {
        emit.publish(
            Event::new(EventKind::BarrierReleased)
                .with_thread(id)
                .with_threads(u32::try_from(failed).unwrap_or(u32::MAX)),
        );
    }

    let may_run_main = matches!(release, Release::Complete { .. }) && ctx.is_healthy();
    if may_run_main {
        ctx.invoke(Phase::Main, emit, |state, result| {
            test.main(id, prestate, state.as_ref(), result)
        });
    } else {
        emit.publish(
            Event::new(EventKind::MainSkipped)
                .with_thread(id)
                .with_status(ctx.result().status()),
        );
    }

    ctx.invoke(Phase::ParFini, emit, |state, result| {
        test.par_fini(id, prestate, state, result)
    });
}
