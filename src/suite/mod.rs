//! # Test abstractions.
//!
//! - [`MultithreadedTest`] - trait with the five lifecycle callbacks
//! - [`TestFn`] - closure-backed implementation

mod test_fn;

pub use test::MultithreadedTest;
pub use test_fn::{InitFiniFn, MainFn, TestFn};
