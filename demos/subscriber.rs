//! # Example: subscriber
//!
//! Shows how to observe a run with subscribers:
//! - the built-in [`LogWriter`] prints every event;
//! - a custom subscriber counts callback failures and skipped `main`s.
//!
//! Thread 2 fails in `par_init`, so it skips `main` while the other threads run it.
//!
//! ## Flow
//! ```text
//! Orchestrator::run()
//!     ├─► publish(RunStarting / PhaseStarting / ThreadSpawned / ...)
//!     ├─► workers publish(CallbackFailed / BarrierReleased / MainSkipped)
//!     └─► observer thread
//!           └─► SubscriberSet.emit() ──► LogWriter / FailureStats .on_event()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example subscriber --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mtt_harness::{Config, Event, EventKind, LogWriter, Orchestrator, Subscribe, TestFn};

struct FailureStats {
    failures: AtomicU64,
    skipped: AtomicU64,
}

impl FailureStats {
    fn new() -> Self {
        Self {
            failures: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    fn print_stats(&self) {
        println!();
        println!("Stats:");
        println!(" ├─► Failures: {}", self.failures.load(Ordering::Relaxed));
        println!(" └─► Skipped:  {}", self.skipped.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Subscribe for FailureStats {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::CallbackFailed | EventKind::CallbackPanicked => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::MainSkipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "failure-stats"
    }
}

fn main() {
    let stats = Arc::new(FailureStats::new());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default()), stats.clone()];

    let orch = Orchestrator::builder(Config::default())
        .with_subscribers(subs)
        .build();

    let test = TestFn::<AtomicU64, ()>::new("flaky-init", |_id, hits, _state, _res| {
        hits.fetch_add(1, Ordering::Relaxed);
    })
    .with_par_init(|id, _hits, _state, res| {
        if id == 2 {
            res.fail(22, "cannot open session");
        }
    });

    let hits = AtomicU64::new(0);
    match orch.run(&test, &hits, 4) {
        Ok(report) => {
            println!("{}", report.outcome);
            println!("main ran {} times", hits.load(Ordering::Relaxed));
        }
        Err(e) => eprintln!("[{}] {}", e.as_label(), e.as_message()),
    }
    stats.print_stats();
}
