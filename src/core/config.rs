//! # Orchestrator configuration.
//!
//! Provides [`Config`], centralized settings for worker threads and the event system.
//!
//! ## Sentinel values
//! - `stack_size = 0` → platform default stack size
//! - `thread_name = ""` → unnamed worker threads

use std::borrow::Cow;

/// Configuration of an [`Orchestrator`](crate::Orchestrator).
///
/// ## Field semantics
/// - `thread_name`: worker name prefix; workers are named `"{thread_name}-{id}"`
/// - `stack_size`: worker stack size in bytes (`0` = platform default)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`, `""`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Prefix of worker thread names.
    pub thread_name: Cow<'static, str>,

    /// Stack size of each worker thread, in bytes.
    ///
    /// - `0` = platform default
    pub stack_size: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// The observer thread that lags behind more than `bus_capacity` events
    /// skips the oldest ones. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the worker stack size as an `Option` (`None` = platform default).
    #[inline]
    pub fn stack_size(&self) -> Option<usize> {
        if self.stack_size == 0 {
            None
        } else {
            Some(self.stack_size)
        }
    }

    /// Returns the name of the worker thread for `id`, if naming is enabled.
    pub fn thread_name_for(&self, id: u32) -> Option<String> {
        if self.thread_name.is_empty() {
            None
        } else {
            Some(format!("{}-{id}", self.thread_name))
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `thread_name = "mtt"`
    /// - `stack_size = 0` (platform default)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            thread_name: Cow::Borrowed("mtt"),
            stack_size: 0,
            bus_capacity: 1024,
        }
    }
}
