//! # Per-run observer thread.
//!
//! Test threads are plain OS threads, while subscribers are async. The observer
//! bridges the two: it owns a current-thread tokio runtime and forwards every bus
//! event of its run to a [`SubscriberSet`].
//!
//! ```text
//! Orchestrator::run
//!   ├─ Observer::start()      bus.subscribe() happens here, before any publish
//!   │     └─ thread "{name}-observer": block_on {
//!   │            select {
//!   │              done      ─► drain what is left, stop
//!   │              rx.recv() ─► set.emit(ev) if ev.run == run
//!   │                           stop at this run's RunFinished
//!   │                           Lagged(n) ─► set.emit(SubscriberOverflow)
//!   │            }
//!   │            set.shutdown().await             (drains every queue)
//!   │        }
//!   ├─ ... phases publish events ...
//!   └─ Observer::finish(RunFinished)   sends `done`, joins the thread
//! ```
//!
//! The bus is shared by every run of an orchestrator, so the observer can fall
//! behind and lose events, including its own `RunFinished`. Stopping therefore
//! never depends on receiving it: `finish` hands the final event over out of band,
//! and the observer delivers it itself if the bus no longer has it.
//!
//! After `finish` returns, every event of the run has been processed by every
//! subscriber, except events lost to a full queue or a lagging observer; both
//! losses are reported as `SubscriberOverflow`.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::sync::oneshot;

use crate::events::{Bus, Event};
use crate::subscribers::{Subscribe, SubscriberSet};

pub(crate) struct Observer {
    handle: JoinHandle<()>,
    done: oneshot::Sender<Event>,
}

impl Observer {
    /// Starts the observer for `run`, or returns `None` if there is nobody to notify.
    pub(crate) fn start(
        bus: &Bus,
        subscribers: &[Arc<dyn Subscribe>],
        run: u64,
        name: &str,
    ) -> io::Result<Option<Self>> {
        if subscribers.is_empty() {
            return Ok(None);
        }

        let runtime = tokio::runtime::Builder::new_current_thread().build()?;
        let rx = bus.subscribe();
        let bus = bus.clone();
        let subs = subscribers.to_vec();
        let (done, finished) = oneshot::channel();

        let handle = thread::Builder::new()
            .name(format!("{name}-observer"))
            .spawn(move || {
                runtime.block_on(async move {
                    let set = SubscriberSet::for_run(subs, bus, run);
                    observe(rx, finished, &set, run).await;
                    set.shutdown().await;
                });
            })?;

        Ok(Some(Self { handle, done }))
    }

    /// Hands over the run's final event and waits until every event has been delivered.
    pub(crate) fn finish(self, last: Event) {
        let _ = self.done.send(last);
        let _ = self.handle.join();
    }
}

async fn observe(
    mut rx: broadcast::Receiver<Event>,
    mut finished: oneshot::Receiver<Event>,
    set: &SubscriberSet,
    run: u64,
) {
    loop {
        tokio::select! {
            biased;
            last = &mut finished => {
                drain(&mut rx, set, run, last.ok());
                return;
            }
            received = rx.recv() => match received {
                Ok(ev) => {
                    if forward(set, run, &ev) {
                        return;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    set.emit(&Event::observer_lagged(missed).with_run(run));
                }
                Err(RecvError::Closed) => return,
            },
        }
    }
}

/// Delivers what the bus still holds for `run`, then makes sure `last` is delivered.
///
/// Every event of the run was published before `last` was created, so nothing of
/// the run can follow an event with a newer sequence number.
fn drain(rx: &mut broadcast::Receiver<Event>, set: &SubscriberSet, run: u64, last: Option<Event>) {
    loop {
        match rx.try_recv() {
            Ok(ev) => {
                if last.as_ref().is_some_and(|l| ev.seq > l.seq) {
                    break;
                }
                if forward(set, run, &ev) {
                    return;
                }
            }
            Err(TryRecvError::Lagged(missed)) => {
                set.emit(&Event::observer_lagged(missed).with_run(run));
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    if let Some(last) = last {
        set.emit(&last);
    }
}

/// Emits `ev` if it belongs to `run`; returns true once the run's last event went out.
fn forward(set: &SubscriberSet, run: u64, ev: &Event) -> bool {
    if ev.run != Some(run) {
        return false;
    }
    set.emit(ev);
    ev.finishes(run)
}
