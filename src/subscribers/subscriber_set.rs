//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`]: distributes events to multiple subscribers
//! concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     │    (bounded)
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//!          (bounded)
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Isolation**: slow/panicking subscriber doesn't affect others
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//!
//! Workers are tokio tasks, so [`SubscriberSet::new`] must be called inside a
//! tokio runtime. The orchestrator does this on its observer thread.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

/// Queue feeding one subscriber's worker.
struct Lane {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event subscribers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
    run: Option<u64>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Each subscriber gets a bounded queue (capacity from
    /// [`Subscribe::queue_capacity`], minimum 1) drained by its own worker task.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        Self::spawn(subs, bus, None)
    }

    /// Like [`new`](Self::new), but overflow and panic reports are tagged with `run`.
    #[must_use]
    pub fn for_run(subs: Vec<Arc<dyn Subscribe>>, bus: Bus, run: u64) -> Self {
        Self::spawn(subs, bus, Some(run))
    }

    fn spawn(subs: Vec<Arc<dyn Subscribe>>, bus: Bus, run: Option<u64>) -> Self {
        let (lanes, workers) = subs
            .into_iter()
            .map(|sub| open_lane(sub, bus.clone(), run))
            .unzip();
        Self {
            lanes,
            workers,
            bus,
            run,
        }
    }

    /// Queues `event` for every subscriber without waiting.
    ///
    /// A subscriber whose queue is full (or whose worker is gone) misses the event,
    /// and a `SubscriberOverflow` naming it is published on the bus. Overflow
    /// reports themselves are never reported again.
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());

        for lane in &self.lanes {
            let reason = match lane.queue.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) => "closed",
            };
            if !shared.is_subscriber_overflow() {
                self.bus
                    .publish(tag(Event::subscriber_overflow(lane.name, reason), self.run));
            }
        }
    }

    /// Closes every queue and waits until each worker has processed what was queued.
    pub async fn shutdown(self) {
        drop(self.lanes);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}

fn tag(ev: Event, run: Option<u64>) -> Event {
    match run {
        Some(run) => ev.with_run(run),
        None => ev,
    }
}

/// Spawns the worker of one subscriber; panics inside `on_event` are reported, not propagated.
fn open_lane(sub: Arc<dyn Subscribe>, bus: Bus, run: Option<u64>) -> (Lane, JoinHandle<()>) {
    let (queue, mut inbox) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
    let lane = Lane {
        name: sub.name(),
        queue,
    };

    let worker = tokio::spawn(async move {
        while let Some(ev) = inbox.recv().await {
            let delivered = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
            if let Err(payload) = delivered {
                let info = crate::core::panic_message(&*payload);
                bus.publish(tag(Event::subscriber_panicked(sub.name(), info), run));
            }
        }
    });

    (lane, worker)
}
