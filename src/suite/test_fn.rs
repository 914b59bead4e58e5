//! # Closure-backed test (`TestFn`)
//!
//! [`TestFn`] assembles a [`MultithreadedTest`] from closures. The main body is
//! mandatory and given at construction; the four init/fini callbacks are optional
//! builder setters and stay no-ops when absent.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use mtt_harness::{Config, Orchestrator, TestFn, ThreadResult};
//!
//! let test = TestFn::<AtomicU32, String>::new("greet", |_id, hits, state, _res| {
//!     assert!(state.is_some());
//!     hits.fetch_add(1, Ordering::Relaxed);
//! })
//! .with_par_init(|id, _hits, state, _res| *state = Some(format!("thread-{id}")))
//! .with_par_fini(|_id, _hits, state, _res| drop(state.take()));
//!
//! let hits = AtomicU32::new(0);
//! let report = Orchestrator::new(Config::default()).run(&test, &hits, 3).unwrap();
//! assert!(report.is_success());
//! assert_eq!(hits.load(Ordering::Relaxed), 3);
//! assert_eq!(test.name(), "greet");
//! ```

use std::borrow::Cow;

use crate::results::ThreadResult;
use crate::suite::test::MultithreadedTest;

/// Signature shared by the init and fini callbacks.
pub type InitFiniFn<P, S> =
    Box<dyn Fn(u32, &P, &mut Option<S>, &mut ThreadResult) + Send + Sync + 'static>;

/// Signature of the main body (state is read-only).
pub type MainFn<P, S> = Box<dyn Fn(u32, &P, Option<&S>, &mut ThreadResult) + Send + Sync + 'static>;

/// Function-backed multithreaded test.
pub struct TestFn<P: ?Sized, S> {
    name: Cow<'static, str>,
    seq_init: Option<InitFiniFn<P, S>>,
    par_init: Option<InitFiniFn<P, S>>,
    main: MainFn<P, S>,
    par_fini: Option<InitFiniFn<P, S>>,
    seq_fini: Option<InitFiniFn<P, S>>,
}

impl<P: ?Sized, S> TestFn<P, S> {
    /// Creates a test with the given name and main body.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, main: F) -> Self
    where
        F: Fn(u32, &P, Option<&S>, &mut ThreadResult) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            seq_init: None,
            par_init: None,
            main: Box::new(main),
            par_fini: None,
            seq_fini: None,
        }
    }

    /// Returns the test name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the sequential init callback.
    pub fn with_seq_init<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, &P, &mut Option<S>, &mut ThreadResult) + Send + Sync + 'static,
    {
        self.seq_init = Some(Box::new(f));
        self
    }

    /// Sets the parallel init callback.
    pub fn with_par_init<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, &P, &mut Option<S>, &mut ThreadResult) + Send + Sync + 'static,
    {
        self.par_init = Some(Box::new(f));
        self
    }

    /// Sets the parallel fini callback.
    pub fn with_par_fini<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, &P, &mut Option<S>, &mut ThreadResult) + Send + Sync + 'static,
    {
        self.par_fini = Some(Box::new(f));
        self
    }

    /// Sets the sequential fini callback.
    pub fn with_seq_fini<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, &P, &mut Option<S>, &mut ThreadResult) + Send + Sync + 'static,
    {
        self.seq_fini = Some(Box::new(f));
        self
    }
}

fn call<P: ?Sized, S>(
    f: &Option<InitFiniFn<P, S>>,
    id: u32,
    prestate: &P,
    state: &mut Option<S>,
    result: &mut ThreadResult,
) {
    if let Some(f) = f {
        f(id, prestate, state, result);
    }
}

impl<P, S> MultithreadedTest for TestFn<P, S>
where
    P: Sync + ?Sized,
    S: Send,
{
    type Prestate = P;
    type State = S;

    fn name(&self) -> &str {
        &self.name
    }

    fn seq_init(&self, id: u32, prestate: &P, state: &mut Option<S>, result: &mut ThreadResult) {
        call(&self.seq_init, id, prestate, state, result);
    }

    fn par_init(&self, id: u32, prestate: &P, state: &mut Option<S>, result: &mut ThreadResult) {
        call(&self.par_init, id, prestate, state, result);
    }

    fn main(&self, id: u32, prestate: &P, state: Option<&S>, result: &mut ThreadResult) {
        (self.main)(id, prestate, state, result);
    }

    fn par_fini(&self, id: u32, prestate: &P, state: &mut Option<S>, result: &mut ThreadResult) {
        call(&self.par_fini, id, prestate, state, result);
    }

    fn seq_fini(&self, id: u32, prestate: &P, state: &mut Option<S>, result: &mut ThreadResult) {
        call(&self.seq_fini, id, prestate, state, result);
    }
}
