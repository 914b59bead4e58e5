//! # One-shot, failure-tolerant phase barrier.
//!
//! Separates "every thread has finished (or skipped) its parallel init" from
//! "any thread may start its main body".
//!
//! ## Rules
//! - Every participant arrives exactly once, **healthy or not**. Failed threads are
//!   counted like any other, so the count always reaches `parties` and no healthy
//!   thread waits for a failed peer.
//! - The barrier carries no payload; whether a thread runs its main body is decided
//!   from the thread's own result slot.
//! - One instance per run; it is never reset.
//! - [`PhaseBarrier::abort`] releases every waiter (present and future) with
//!   [`Release::Aborted`]. The orchestrator uses it when it cannot spawn all threads.
//!
//! ```text
//!  thread 0 ──arrive(ok)───────┐
//!  thread 1 ──arrive(failed)───┤  arrived == parties ──► all released
//!  thread 2 ──arrive(ok)───────┘  (last arrival is the leader)
//! ```

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// How a participant left the barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// All participants arrived.
    Complete {
        /// True for exactly one participant: the last to arrive.
        leader: bool,
        /// Number of participants that arrived in a failed state.
        failed: usize,
    },
    /// The barrier was aborted before every participant arrived.
    Aborted,
}

#[derive(Debug, Default)]
struct State {
    arrived: usize,
    failed: usize,
    aborted: bool,
}

/// Counting barrier that tolerates failed participants and can be aborted.
#[derive(Debug)]
pub struct PhaseBarrier {
    parties: usize,
    state: Mutex<State>,
    cvar: Condvar,
}

impl PhaseBarrier {
    /// Creates a barrier for `parties` participants (clamped to a minimum of 1).
    pub fn new(parties: usize) -> Self {
        Self {
            parties: parties.max(1),
            state: Mutex::new(State::default()),
            cvar: Condvar::new(),
        }
    }

    /// Arrives at the barrier and blocks until all participants have arrived
    /// or the barrier is aborted.
    ///
    /// `healthy = false` marks a participant that failed before arriving; it is
    /// still counted.
    pub fn arrive(&self, healthy: bool) -> Release {
        let mut st = self.lock();
        if st.aborted {
            return Release::Aborted;
        }

        debug_assert!(st.arrived < self.parties, "more arrivals than parties");
        st.arrived += 1;
        if !healthy {
            st.failed += 1;
        }

        if st.arrived >= self.parties {
            let failed = st.failed;
            drop(st);
            self.cvar.notify_all();
            return Release::Complete {
                leader: true,
                failed,
            };
        }

        let st = self
            .cvar
            .wait_while(st, |s| !s.aborted && s.arrived < self.parties)
            .unwrap_or_else(PoisonError::into_inner);

        if st.arrived >= self.parties {
            Release::Complete {
                leader: false,
                failed: st.failed,
            }
        } else {
            Release::Aborted
        }
    }

    /// Releases every current and future waiter with [`Release::Aborted`].
    ///
    /// Has no effect once all participants have arrived.
    pub fn abort(&self) {
        let mut st = self.lock();
        if st.arrived < self.parties {
            st.aborted = true;
        }
        drop(st);
        self.cvar.notify_all();
    }

    /// True if the barrier was aborted before completing.
    pub fn is_aborted(&self) -> bool {
        self.lock().aborted
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
