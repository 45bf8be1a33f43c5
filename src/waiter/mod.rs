//! Asynchronous operation waiters.
//!
//! Control planes apply mutations asynchronously and only expose progress
//! through repeated reads. This module provides:
//! - [`WaitSpec`]: the pending/target state sets, poll interval and timeout
//! - [`StatusFetcher`]: one remote read returning an [`Observation`]
//! - [`Waiter`]: the polling loop producing a [`WaitOutcome`]

mod fetcher;
mod poll;
mod spec;

pub use fetcher::{Observation, StatusFetcher};
pub use poll::{WaitError, WaitOutcome, Waiter};
pub use spec::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, WaitSpec};
