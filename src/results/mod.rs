//! # Per-thread results and their aggregation.
//!
//! - [`ThreadResult`] the per-thread slot (status + bounded message)
//! - [`ErrMsg`] bounded, truncating diagnostic string
//! - [`Outcome`] / [`Report`] first-failure-wins reduction over all slots

mod message;
mod outcome;
mod slot;

pub use message::{ERRMSG_MAX, ErrMsg};
pub use outcome::{Outcome, Report};
pub use slot::{STATUS_PANICKED, ThreadResult};
