//! # Worker thread preparation.
//!
//! The [`Spawner`] seam decides how the worker thread for a given id is built.
//! The orchestrator asks it for a [`thread::Builder`] right before spawning;
//! an `Err` is treated exactly like an OS-level spawn failure.
//!
//! [`OsSpawner`] is the default: it applies the configured name and stack size.

use std::io;
use std::thread;

use crate::core::Config;

/// Prepares the builder of each worker thread.
pub trait Spawner: Send + Sync + 'static {
    /// Returns the builder used to spawn the worker for `id`.
    fn builder(&self, id: u32, cfg: &Config) -> io::Result<thread::Builder>;
}

/// Default spawner: plain OS threads named after [`Config::thread_name`].
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSpawner;

impl Spawner for OsSpawner {
    fn builder(&self, id: u32, cfg: &Config) -> io::Result<thread::Builder> {
        let mut builder = thread::Builder::new();
        if let Some(name) = cfg.thread_name_for(id) {
            builder = builder.name(name);
        }
        if let Some(size) = cfg.stack_size() {
            builder = builder.stack_size(size);
        }
        Ok(builder)
    }
}
