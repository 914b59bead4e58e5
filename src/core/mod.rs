//! Runtime core: orchestration and lifecycle.
//!
//! This module contains the phase protocol of a multithreaded test run.
//! The main public API from this module is [`Orchestrator`], which drives the
//! sequential and parallel phases, the start barrier and result aggregation.
//!
//! Internal modules:
//! - [`orchestrator`]: runs the five phases and handles spawn failures;
//! - [`worker`]: the parallel part of one thread's lifecycle;
//! - [`barrier`]: one-shot start barrier tolerant to failed arrivals;
//! - [`context`]: per-thread state/result slot and panic-isolated callbacks;
//! - [`observer`]: per-run thread feeding async subscribers;
//! - [`spawn`]: worker thread builder seam.

mod barrier;
mod builder;
mod config;
mod context;
mod observer;
mod orchestrator;
mod phase;
mod spawn;
mod worker;

#[cfg(test)]
mod tests;

pub use barrier::{PhaseBarrier, Release};
pub use builder::OrchestratorBuilder;
pub use config::Config;
pub use context::ThreadContext;
pub use orchestrator::Orchestrator;
pub use phase::Phase;
pub use spawn::{OsSpawner, Spawner};

pub(crate) use context::panic_message;
