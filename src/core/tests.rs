use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::error::RunError;
use crate::events::{Event, EventKind};
use crate::results::{STATUS_PANICKED, ThreadResult};
use crate::subscribers::Subscribe;
use crate::suite::{MultithreadedTest, TestFn};

/// Ordered record of every callback invocation.
#[derive(Default)]
struct Journal {
    calls: Mutex<Vec<(Phase, u32)>>,
}

impl Journal {
    fn record(&self, phase: Phase, id: u32) {
        self.calls.lock().unwrap().push((phase, id));
    }

    fn snapshot(&self) -> Vec<(Phase, u32)> {
        self.calls.lock().unwrap().clone()
    }

    fn ids(&self, phase: Phase) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .snapshot()
            .into_iter()
            .filter(|(p, _)| *p == phase)
            .map(|(_, id)| id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Records each callback, then fails or panics where scripted.
#[derive(Default)]
struct Scripted {
    fail: Option<(Phase, u32, i32)>,
    fail_also: Option<(Phase, u32, i32)>,
    panic: Option<(Phase, u32)>,
}

impl Scripted {
    fn failing(phase: Phase, id: u32, status: i32) -> Self {
        Self {
            fail: Some((phase, id, status)),
            ..Self::default()
        }
    }

    fn panicking(phase: Phase, id: u32) -> Self {
        Self {
            panic: Some((phase, id)),
            ..Self::default()
        }
    }

    fn step(&self, phase: Phase, id: u32, journal: &Journal, result: &mut ThreadResult) {
        journal.record(phase, id);
        if self.panic == Some((phase, id)) {
            panic!("scripted panic");
        }
        for (p, i, status) in [self.fail, self.fail_also].into_iter().flatten() {
            if p == phase && i == id {
                result.fail_fmt(status, format_args!("{phase} failed for {id}"));
            }
        }
    }
}

impl MultithreadedTest for Scripted {
    type Prestate = Journal;
    type State = u32;

    fn seq_init(&self, id: u32, j: &Journal, state: &mut Option<u32>, r: &mut ThreadResult) {
        *state = Some(id);
        self.step(Phase::SeqInit, id, j, r);
    }

    fn par_init(&self, id: u32, j: &Journal, _: &mut Option<u32>, r: &mut ThreadResult) {
        self.step(Phase::ParInit, id, j, r);
    }

    fn main(&self, id: u32, j: &Journal, state: Option<&u32>, r: &mut ThreadResult) {
        assert_eq!(state, Some(&id));
        self.step(Phase::Main, id, j, r);
    }

    fn par_fini(&self, id: u32, j: &Journal, _: &mut Option<u32>, r: &mut ThreadResult) {
        self.step(Phase::ParFini, id, j, r);
    }

    fn seq_fini(&self, id: u32, j: &Journal, state: &mut Option<u32>, r: &mut ThreadResult) {
        state.take();
        self.step(Phase::SeqFini, id, j, r);
    }
}

/// Refuses to create the worker of one id.
struct FailAt(u32);

impl Spawner for FailAt {
    fn builder(&self, id: u32, cfg: &Config) -> io::Result<thread::Builder> {
        if id == self.0 {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "no more threads"));
        }
        OsSpawner.builder(id, cfg)
    }
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn count(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}

#[test]
fn test_all_threads_succeed() {
    let journal = Journal::default();
    let report = Orchestrator::new(Config::default())
        .run(&Scripted::default(), &journal, 3)
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.outcome.exit_code(), 0);
    assert_eq!(report.results.len(), 3);
    for phase in Phase::ALL {
        assert_eq!(journal.ids(phase), vec![0, 1, 2], "phase {phase}");
    }
}

#[test]
fn test_par_init_failure_skips_main_for_that_thread_only() {
    let journal = Journal::default();
    let orch = Orchestrator::new(Config::default());
    let mut rx = orch.bus().subscribe();

    let report = orch
        .run(&Scripted::failing(Phase::ParInit, 2, 22), &journal, 4)
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.outcome.status, 22);
    assert_eq!(report.outcome.failed_thread, Some(2));
    assert_eq!(report.outcome.message, "par_init failed for 2");
    assert_eq!(report.outcome.exit_code(), 22);
    assert_eq!(report.failed_threads(), vec![2]);

    assert_eq!(journal.ids(Phase::Main), vec![0, 1, 3]);
    assert_eq!(journal.ids(Phase::ParFini), vec![0, 1, 2, 3]);
    assert_eq!(journal.ids(Phase::SeqFini), vec![0, 1, 2, 3]);

    let events = drain(&mut rx);
    let released: Vec<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::BarrierReleased)
        .collect();
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].threads, Some(1));
    assert_eq!(count(&events, EventKind::CallbackFailed), 1);
    assert_eq!(count(&events, EventKind::MainSkipped), 1);
}

#[test]
fn test_seq_init_failure_still_runs_both_finis() {
    let journal = Journal::default();
    let report = Orchestrator::new(Config::default())
        .run(&Scripted::failing(Phase::SeqInit, 1, 5), &journal, 3)
        .unwrap();

    assert_eq!(report.outcome.status, 5);
    assert_eq!(report.outcome.failed_thread, Some(1));
    assert_eq!(journal.ids(Phase::ParInit), vec![0, 2]);
    assert_eq!(journal.ids(Phase::Main), vec![0, 2]);
    assert_eq!(journal.ids(Phase::ParFini), vec![0, 1, 2]);
    assert_eq!(journal.ids(Phase::SeqFini), vec![0, 1, 2]);
}

#[test]
fn test_sequential_phases_bracket_parallel_ones() {
    let journal = Journal::default();
    Orchestrator::new(Config::default())
        .run(&Scripted::default(), &journal, 4)
        .unwrap();

    let calls = journal.snapshot();
    let seq_init: Vec<u32> = calls[..4].iter().map(|(_, id)| *id).collect();
    assert!(calls[..4].iter().all(|(p, _)| *p == Phase::SeqInit));
    assert_eq!(seq_init, vec![0, 1, 2, 3]);

    let seq_fini: Vec<u32> = calls[calls.len() - 4..].iter().map(|(_, id)| *id).collect();
    assert!(calls[calls.len() - 4..].iter().all(|(p, _)| *p == Phase::SeqFini));
    assert_eq!(seq_fini, vec![0, 1, 2, 3]);

    let last_par_init = calls.iter().rposition(|(p, _)| *p == Phase::ParInit).unwrap();
    let first_main = calls.iter().position(|(p, _)| *p == Phase::Main).unwrap();
    assert!(last_par_init < first_main, "main started before every par_init");
}

#[test]
fn test_single_thread_order() {
    let journal = Journal::default();
    Orchestrator::new(Config::default())
        .run(&Scripted::default(), &journal, 1)
        .unwrap();

    assert_eq!(
        journal.snapshot(),
        vec![
            (Phase::SeqInit, 0),
            (Phase::ParInit, 0),
            (Phase::Main, 0),
            (Phase::ParFini, 0),
            (Phase::SeqFini, 0),
        ]
    );
}

#[test]
fn test_panic_in_par_init_does_not_deadlock() {
    let journal = Journal::default();
    let report = Orchestrator::new(Config::default())
        .run(&Scripted::panicking(Phase::ParInit, 0), &journal, 3)
        .unwrap();

    assert_eq!(report.outcome.status, STATUS_PANICKED);
    assert_eq!(report.outcome.failed_thread, Some(0));
    assert!(report.outcome.message.contains("par_init() of thread 0 panicked"));
    assert!(report.outcome.message.contains("scripted panic"));
    assert_eq!(journal.ids(Phase::Main), vec![1, 2]);
    assert_eq!(journal.ids(Phase::ParFini), vec![0, 1, 2]);
}

#[test]
fn test_lowest_failed_id_wins() {
    let test = Scripted {
        fail: Some((Phase::ParInit, 3, 7)),
        fail_also: Some((Phase::Main, 1, 9)),
        panic: None,
    };
    let journal = Journal::default();
    let report = Orchestrator::new(Config::default())
        .run(&test, &journal, 4)
        .unwrap();

    assert_eq!(report.outcome.failed_thread, Some(1));
    assert_eq!(report.outcome.status, 9);
    assert_eq!(report.failed_threads(), vec![1, 3]);
}

#[test]
fn test_first_failure_of_a_thread_is_kept() {
    let test = Scripted {
        fail: Some((Phase::Main, 0, 11)),
        fail_also: Some((Phase::ParFini, 0, 12)),
        panic: None,
    };
    let journal = Journal::default();
    let report = Orchestrator::new(Config::default())
        .run(&test, &journal, 2)
        .unwrap();

    assert_eq!(report.outcome.status, 11);
    assert_eq!(report.outcome.message, "main failed for 0");
}

#[test]
fn test_spawn_failure_aborts_barrier_and_cleans_up() {
    let journal = Journal::default();
    let orch = Orchestrator::builder(Config::default())
        .with_spawner(FailAt(1))
        .build();
    let mut rx = orch.bus().subscribe();

    let err = orch.run(&Scripted::default(), &journal, 3).unwrap_err();
    assert!(matches!(err, RunError::Spawn { id: 1, .. }));

    assert_eq!(journal.ids(Phase::SeqInit), vec![0, 1, 2]);
    assert_eq!(journal.ids(Phase::ParInit), vec![0]);
    assert!(journal.ids(Phase::Main).is_empty());
    assert_eq!(journal.ids(Phase::ParFini), vec![0, 1, 2]);
    assert_eq!(journal.ids(Phase::SeqFini), vec![0, 1, 2]);

    let events = drain(&mut rx);
    assert_eq!(count(&events, EventKind::SpawnFailed), 1);
    assert_eq!(count(&events, EventKind::BarrierAborted), 1);
    assert_eq!(count(&events, EventKind::BarrierReleased), 0);
    assert_eq!(count(&events, EventKind::ThreadSpawned), 1);
    assert_eq!(events.last().map(|e| e.kind), Some(EventKind::RunFinished));
}

#[test]
fn test_spawn_failure_of_first_thread() {
    let journal = Journal::default();
    let orch = Orchestrator::builder(Config::default())
        .with_spawner(FailAt(0))
        .build();

    let err = orch.run(&Scripted::default(), &journal, 2).unwrap_err();
    assert!(matches!(err, RunError::Spawn { id: 0, .. }));
    assert!(journal.ids(Phase::ParInit).is_empty());
    assert_eq!(journal.ids(Phase::ParFini), vec![0, 1]);
    assert_eq!(journal.ids(Phase::SeqFini), vec![0, 1]);
}

#[test]
fn test_zero_threads_is_rejected() {
    let journal = Journal::default();
    let err = Orchestrator::new(Config::default())
        .run(&Scripted::default(), &journal, 0)
        .unwrap_err();

    assert!(matches!(err, RunError::NoThreads));
    assert!(journal.snapshot().is_empty());
}

struct DropProbe(Arc<AtomicUsize>);

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_leftover_state_is_dropped() {
    let test = TestFn::<Arc<AtomicUsize>, DropProbe>::new("leak", |_, _, state, result| {
        if state.is_none() {
            result.fail(1, "no probe");
        }
    })
    .with_seq_init(|_, drops, state, _| *state = Some(DropProbe(Arc::clone(drops))));

    let drops = Arc::new(AtomicUsize::new(0));
    let report = Orchestrator::new(Config::default())
        .run(&test, &drops, 3)
        .unwrap();

    assert!(report.is_success());
    assert_eq!(drops.load(Ordering::SeqCst), 3);
}

#[test]
fn test_os_error_message_format() {
    let test = TestFn::<(), ()>::new("connect", |id, _, _, result| {
        if id == 1 {
            result.fail_os("connect", 111);
        }
    });
    let report = Orchestrator::new(Config::default())
        .run(&test, &(), 2)
        .unwrap();

    assert_eq!(report.outcome.status, 111);
    assert!(report.outcome.message.starts_with("tests.rs:"));
    assert!(report.outcome.message.contains(" -> connect() failed: "));
}

#[test]
fn test_worker_threads_are_named() {
    let names = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&names);
    let test = TestFn::<(), ()>::new("names", move |_, _, _, _| {
        let name = thread::current().name().map(str::to_string);
        seen.lock().unwrap().push(name);
    });
    let cfg = Config {
        thread_name: "probe".into(),
        ..Config::default()
    };
    Orchestrator::new(cfg).run(&test, &(), 2).unwrap();

    let mut names = names.lock().unwrap().clone();
    names.sort();
    assert_eq!(
        names,
        vec![Some("probe-0".to_string()), Some("probe-1".to_string())]
    );
}

struct Recorder {
    kinds: Arc<Mutex<Vec<EventKind>>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.kinds.lock().unwrap().push(ev.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[test]
fn test_subscriber_sees_whole_run() {
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Recorder {
        kinds: Arc::clone(&kinds),
    })];
    let orch = Orchestrator::builder(Config::default())
        .with_subscribers(subs)
        .build();

    let journal = Journal::default();
    orch.run(&Scripted::default(), &journal, 2).unwrap();
    let first_run = kinds.lock().unwrap().clone();

    assert_eq!(first_run.first(), Some(&EventKind::RunStarting));
    assert_eq!(first_run.last(), Some(&EventKind::RunFinished));
    assert_eq!(
        first_run
            .iter()
            .filter(|k| **k == EventKind::ThreadSpawned)
            .count(),
        2
    );

    // A second run gets its own observer.
    kinds.lock().unwrap().clear();
    orch.run(&Scripted::default(), &journal, 1).unwrap();
    let second_run = kinds.lock().unwrap().clone();
    assert_eq!(second_run.first(), Some(&EventKind::RunStarting));
    assert_eq!(second_run.last(), Some(&EventKind::RunFinished));
}

/// Blocks its observer inside the first delivered event until released.
struct Gate {
    entered: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
    seen: Mutex<Vec<(Option<u64>, EventKind)>>,
}

#[async_trait]
impl Subscribe for Gate {
    async fn on_event(&self, ev: &Event) {
        self.seen.lock().unwrap().push((ev.run, ev.kind));
        let release = self.release.lock().unwrap().take();
        if let Some(release) = release {
            let entered = self.entered.lock().unwrap().take();
            if let Some(entered) = entered {
                let _ = entered.send(());
            }
            let _ = release.recv();
        }
    }

    fn name(&self) -> &'static str {
        "gate"
    }
}

#[test]
fn test_lagging_observer_still_finishes_its_run() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gate = Arc::new(Gate {
        entered: Mutex::new(Some(entered_tx)),
        release: Mutex::new(Some(release_rx)),
        seen: Mutex::new(Vec::new()),
    });
    let cfg = Config {
        bus_capacity: 4,
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![gate.clone()];
    let orch = Arc::new(Orchestrator::builder(cfg).with_subscribers(subs).build());

    let (done_tx, done_rx) = mpsc::channel();
    let first = Arc::clone(&orch);
    thread::spawn(move || {
        let journal = Journal::default();
        let res = first.run(&Scripted::default(), &journal, 1);
        let _ = done_tx.send(res.map(|report| report.is_success()));
    });

    entered_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("first run never reached its subscriber");

    // A busy second run on the same bus while the first observer is stuck.
    let journal = Journal::default();
    assert!(orch.run(&Scripted::default(), &journal, 8).unwrap().is_success());

    release_tx.send(()).unwrap();
    let first_result = done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("first run did not return after its observer lagged");
    assert!(matches!(first_result, Ok(true)));

    let seen = gate.seen.lock().unwrap().clone();
    let (first_run, first_kind) = seen[0];
    assert_eq!(first_kind, EventKind::RunStarting);
    let first_run_kinds: Vec<EventKind> = seen
        .iter()
        .filter(|(run, _)| *run == first_run)
        .map(|(_, kind)| *kind)
        .collect();
    assert!(first_run_kinds.contains(&EventKind::SubscriberOverflow));
    assert_eq!(first_run_kinds.last(), Some(&EventKind::RunFinished));
}

#[test]
fn test_subscriber_only_sees_its_own_run() {
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Recorder {
        kinds: Arc::clone(&kinds),
    })];
    let observed = Orchestrator::builder(Config::default())
        .with_subscribers(subs)
        .build();

    let journal = Journal::default();
    let mut rx = observed.bus().subscribe();
    observed.run(&Scripted::default(), &journal, 2).unwrap();

    let runs: Vec<Option<u64>> = drain(&mut rx).iter().map(|e| e.run).collect();
    assert!(runs.iter().all(|run| run.is_some() && *run == runs[0]));
    assert_eq!(kinds.lock().unwrap().len(), runs.len());
}
