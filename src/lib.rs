//! # mtt-harness
//!
//! **mtt-harness** runs multithreaded tests through a fixed, phase-driven lifecycle.
//!
//! A test supplies five callbacks; the orchestrator runs them for `N` threads with
//! sequential setup, a start barrier that maximizes contention in the test body,
//! guaranteed cleanup and a single aggregated outcome.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────────────┐        ┌──────────────────────┐
//!     │ MultithreadedTest    │        │ Prestate (shared, &) │
//!     │ (user callbacks)     │        │                      │
//!     └──────────┬───────────┘        └──────────┬───────────┘
//!                ▼                               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator::run(test, prestate, N)                             │
//! │  - ThreadContext × N (state slot + ThreadResult per id)           │
//! │  - PhaseBarrier (one-shot, tolerant to failed arrivals)           │
//! │  - Spawner (builds worker threads)                                │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │  worker 0    │   │  worker 1    │   │  worker N-1  │   │
//!     │ par_init     │   │ par_init     │   │ par_init     │   │
//!     │ ─ barrier ─  │   │ ─ barrier ─  │   │ ─ barrier ─  │   │
//!     │ main         │   │ main         │   │ main         │   │
//!     │ par_fini     │   │ par_fini     │   │ par_fini     │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ Publishes:       │                  │                 │
//!      │ - CallbackFailed │                  │                 │
//!      │ - MainSkipped    │                  │                 │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                    (capacity: Config::bus_capacity)               │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  observer thread       │
//!                       │  (one per run, only    │
//!                       │   with subscribers)    │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      sub1.on   sub2.on   subN.on
//!                      _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! seq_init(0..N)        calling thread, in id order
//! spawn N workers ─┐
//!                  ├─ par_init        (skipped for ids that already failed)
//!                  ├─ barrier         (every id arrives, failed or not)
//!                  ├─ main            (only ids without a failure)
//!                  └─ par_fini        (always)
//! join N workers ──┘
//! seq_fini(0..N)        calling thread, in id order (always)
//! Outcome::reduce       first failure in id order wins
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Tests**         | Define tests as trait impls or closures.                      | [`MultithreadedTest`], [`TestFn`]          |
//! | **Orchestration** | Run the five phases on `N` threads.                           | [`Orchestrator`], [`OrchestratorBuilder`]  |
//! | **Results**       | Per-thread result slots and the aggregated outcome.           | [`ThreadResult`], [`Outcome`], [`Report`]  |
//! | **Subscriber API**| Hook into run events (logging, journals, custom subscribers). | [`Subscribe`]                              |
//! | **Errors**        | Typed errors for orchestration and argument parsing.          | [`RunError`], [`ArgsError`]                |
//! | **Configuration** | Thread naming, stack size and bus capacity.                   | [`Config`]                                 |
//! | **Arguments**     | `<program> <threads_num> <addr>` command line.                | [`TestArgs`]                               |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use mtt_harness::{Config, Orchestrator, TestFn};
//!
//! // Build subscribers (optional)
//! #[cfg(feature = "logging")]
//! let subs: Vec<Arc<dyn mtt_harness::Subscribe>> = vec![Arc::new(mtt_harness::LogWriter::default())];
//! #[cfg(not(feature = "logging"))]
//! let subs: Vec<Arc<dyn mtt_harness::Subscribe>> = Vec::new();
//!
//! let orch = Orchestrator::builder(Config::default())
//!     .with_subscribers(subs)
//!     .build();
//!
//! // Every thread bumps a shared counter once the barrier opens.
//! let test = TestFn::<AtomicU64, ()>::new("counter", |_id, counter, _state, _result| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! let counter = AtomicU64::new(0);
//! let report = orch.run(&test, &counter, 8).expect("run failed");
//!
//! assert!(report.is_success());
//! assert_eq!(counter.load(Ordering::SeqCst), 8);
//! assert_eq!(report.outcome.exit_code(), 0);
//! ```
mod args;
mod core;
mod error;
mod events;
mod results;
mod subscribers;
mod suite;

// ---- Public re-exports ----

pub use args::TestArgs;
pub use core::{
    Config, Orchestrator, OrchestratorBuilder, OsSpawner, Phase, PhaseBarrier, Release, Spawner,
    ThreadContext,
};
pub use error::{ArgsError, RunError};
pub use events::{Bus, Event, EventKind};
pub use results::{ERRMSG_MAX, ErrMsg, Outcome, Report, STATUS_PANICKED, ThreadResult};
pub use subscribers::{Subscribe, SubscriberSet};
pub use suite::{InitFiniFn, MainFn, MultithreadedTest, TestFn};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
