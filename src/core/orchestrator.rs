//! # Orchestrator: drives N threads through the five lifecycle phases.
//!
//! The [`Orchestrator`] owns the event bus, the subscriber list, the worker
//! [`Spawner`] and the configuration. Each call to [`Orchestrator::run`] is one
//! independent run of a [`MultithreadedTest`].
//!
//! ## Phase state machine
//! ```text
//!  calling thread                     worker threads (one per id)
//!  ──────────────                     ───────────────────────────
//!  seq_init(0), …, seq_init(N-1)
//!        │
//!        ├── spawn 0 ──────────────►  par_init ─┐
//!        ├── spawn 1 ──────────────►  par_init ─┤
//!        └── spawn N-1 ────────────►  par_init ─┤
//!                                               ▼
//!                                     PhaseBarrier (all N arrive, failed or not)
//!                                               │
//!                                     main (healthy ids only)
//!                                               │
//!        ┌── join all ◄────────────── par_fini (every id)
//!        ▼
//!  seq_fini(0), …, seq_fini(N-1)
//!        │
//!  Outcome::reduce (first failure by id wins)
//! ```
//!
//! ## Failure handling
//! - A callback failure is data: it is recorded in the id's [`ThreadResult`] and the
//!   run goes on. Later phases skip `par_init`/`main` for that id but always run
//!   `par_fini` and `seq_fini`.
//! - A panicking callback is recorded as a failure with [`STATUS_PANICKED`].
//! - If a worker thread cannot be created, the barrier is aborted (spawned threads
//!   skip `main`), `par_fini` runs on the calling thread for every id without a
//!   thread, all spawned threads are joined, `seq_fini` runs for every id and the
//!   run returns [`RunError::Spawn`].
//!
//! [`ThreadResult`]: crate::ThreadResult
//! [`STATUS_PANICKED`]: crate::STATUS_PANICKED

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, mpsc};
use std::thread;

use crate::core::barrier::PhaseBarrier;
use crate::core::builder::OrchestratorBuilder;
use crate::core::context::{Emitter, ThreadContext};
use crate::core::observer::Observer;
use crate::core::spawn::Spawner;
use crate::core::worker::run_worker;
use crate::core::{Config, Phase};
use crate::error::RunError;
use crate::events::{Bus, Event, EventKind};
use crate::results::{Report, ThreadResult};
use crate::subscribers::Subscribe;
use crate::suite::MultithreadedTest;

/// Global run counter; run ids start at 1.
static RUN_SEQ: AtomicU64 = AtomicU64::new(1);

/// Runs multithreaded tests through the sequential/parallel phase protocol.
pub struct Orchestrator {
    cfg: Config,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    spawner: Arc<dyn Spawner>,
}

impl Orchestrator {
    /// Creates an orchestrator without subscribers, using OS threads.
    pub fn new(cfg: Config) -> Self {
        OrchestratorBuilder::new(cfg).build()
    }

    /// Returns a builder for subscribers and a custom [`Spawner`].
    pub fn builder(cfg: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        subscribers: Vec<Arc<dyn Subscribe>>,
        spawner: Arc<dyn Spawner>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            bus,
            subscribers,
            spawner,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the event bus; call `subscribe()` on it before a run to observe events
    /// synchronously.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs `test` on `threads` worker threads with the shared `prestate`.
    ///
    /// Returns a [`Report`] whenever every thread could be created, whatever the
    /// callbacks reported; inspect [`Report::outcome`] for pass/fail.
    ///
    /// ### Errors
    /// - [`RunError::NoThreads`] if `threads == 0` (nothing runs)
    /// - [`RunError::ObserverStart`] if subscribers are configured and their
    ///   observer thread cannot start (nothing runs)
    /// - [`RunError::Spawn`] if a worker thread cannot be created (cleanup still runs)
    /// - [`RunError::WorkerLost`] if a worker thread died outside any callback
    pub fn run<T>(
        &self,
        test: &T,
        prestate: &T::Prestate,
        threads: u32,
    ) -> Result<Report, RunError>
    where
        T: MultithreadedTest,
    {
        if threads == 0 {
            return Err(RunError::NoThreads);
        }

        let run = RUN_SEQ.fetch_add(1, AtomicOrdering::Relaxed);
        let observer = Observer::start(&self.bus, &self.subscribers, run, self.observer_name())
            .map_err(|source| RunError::ObserverStart { source })?;
        let emit = Emitter::new(&self.bus, run);

        emit.publish(
            Event::new(EventKind::RunStarting)
                .with_threads(threads)
                .with_reason(test.name()),
        );

        let mut contexts: Vec<ThreadContext<T::State>> =
            (0..threads).map(ThreadContext::new).collect();

        run_sequential(Phase::SeqInit, &mut contexts, &emit, |id, state, result| {
            test.seq_init(id, prestate, state, result)
        });

        emit.publish(Event::new(EventKind::PhaseStarting).with_phase(Phase::ParInit));
        let parallel = self.run_parallel(test, prestate, &mut contexts, emit);
        emit.publish(Event::new(EventKind::PhaseCompleted).with_phase(Phase::ParFini));

        run_sequential(Phase::SeqFini, &mut contexts, &emit, |id, state, result| {
            test.seq_fini(id, prestate, state, result)
        });

        let report = Report::new(
            contexts
                .into_iter()
                .map(ThreadContext::into_result)
                .collect(),
        );

        let finished = finished_event(&report, parallel.as_ref().err()).with_run(run);
        self.bus.publish(finished.clone());
        if let Some(observer) = observer {
            observer.finish(finished);
        }

        parallel.map(|()| report)
    }

    /// Spawns one worker per context, joins them all and handles spawn failures.
    fn run_parallel<T>(
        &self,
        test: &T,
        prestate: &T::Prestate,
        contexts: &mut [ThreadContext<T::State>],
        emit: Emitter<'_>,
    ) -> Result<(), RunError>
    where
        T: MultithreadedTest,
    {
        let barrier = PhaseBarrier::new(contexts.len());
        let barrier = &barrier;

        thread::scope(|scope| {
            let mut workers = Vec::with_capacity(contexts.len());
            let mut orphans = Vec::new();
            let mut error = None;
            let mut pending = contexts.iter_mut();

            for ctx in pending.by_ref() {
                let id = ctx.id();
                let (handoff, inbox) = mpsc::sync_channel::<&mut ThreadContext<T::State>>(1);

                // The context is sent only once the thread exists, so a failed
                // spawn leaves it with the calling thread.
                let spawned = self.spawner.builder(id, &self.cfg).and_then(|builder| {
                    builder.spawn_scoped(scope, move || {
                        if let Ok(ctx) = inbox.recv() {
                            run_worker(test, prestate, ctx, barrier, &emit);
                        }
                    })
                });

                match spawned {
                    Ok(handle) => {
                        workers.push((id, handle));
                        if let Err(mpsc::SendError(ctx)) = handoff.send(ctx) {
                            error.get_or_insert(RunError::WorkerLost { id });
                            orphans.push(ctx);
                            break;
                        }
                        emit.publish(Event::new(EventKind::ThreadSpawned).with_thread(id));
                    }
                    Err(source) => {
                        emit.publish(
                            Event::new(EventKind::SpawnFailed)
                                .with_thread(id)
                                .with_reason(source.to_string()),
                        );
                        error = Some(RunError::Spawn { id, source });
                        orphans.push(ctx);
                        break;
                    }
                }
            }
            orphans.extend(pending);

            if !orphans.is_empty() {
                barrier.abort();
                emit.publish(Event::new(EventKind::BarrierAborted));
                for ctx in orphans {
                    let id = ctx.id();
                    emit.publish(
                        Event::new(EventKind::MainSkipped)
                            .with_thread(id)
                            .with_status(ctx.result().status()),
                    );
                    ctx.invoke(Phase::ParFini, &emit, |state, result| {
                        test.par_fini(id, prestate, state, result)
                    });
                }
            }

            for (id, handle) in workers {
                if handle.join().is_err() {
                    error.get_or_insert(RunError::WorkerLost { id });
                }
            }

            error.map_or(Ok(()), Err)
        })
    }

    fn observer_name(&self) -> &str {
        if self.cfg.thread_name.is_empty() {
            "mtt"
        } else {
            &self.cfg.thread_name
        }
    }
}

/// Runs one sequential phase on the calling thread, for every id in order.
fn run_sequential<S, F>(phase: Phase, contexts: &mut [ThreadContext<S>], emit: &Emitter<'_>, mut call: F)
where
    F: FnMut(u32, &mut Option<S>, &mut ThreadResult),
{
    emit.publish(Event::new(EventKind::PhaseStarting).with_phase(phase));
    for ctx in contexts.iter_mut() {
        let id = ctx.id();
        ctx.invoke(phase, emit, |state, result| call(id, state, result));
    }
    emit.publish(Event::new(EventKind::PhaseCompleted).with_phase(phase));
}

fn finished_event(report: &Report, error: Option<&RunError>) -> Event {
    let outcome = &report.outcome;
    let mut ev = Event::new(EventKind::RunFinished).with_status(outcome.status);
    if let Some(id) = outcome.failed_thread {
        ev = ev.with_thread(id);
    }
    match error {
        Some(err) => ev.with_reason(err.as_message()),
        None if !outcome.message.is_empty() => ev.with_reason(outcome.message.as_str()),
        None => ev,
    }
}
