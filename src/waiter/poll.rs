//! Polling loop driving a status fetcher through a wait spec.

use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::error::LifecycleError;

use super::fetcher::{Observation, StatusFetcher};
use super::spec::WaitSpec;

/// Final result of a successful wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    /// The resource reached one of the target states.
    Reached(Observation<T>),
    /// The resource settled in a state outside both sets, e.g. `FAILED`.
    ///
    /// This is not an error at the waiter level; callers inspect the state
    /// and reason to decide.
    Unexpected(Observation<T>),
    /// The resource no longer exists and the wait expected its absence.
    Gone,
}

impl<T> WaitOutcome<T> {
    /// Returns the final observed state label, if any.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        match self {
            Self::Reached(obs) | Self::Unexpected(obs) => Some(&obs.state),
            Self::Gone => None,
        }
    }

    /// Returns the final observation, if any.
    #[must_use]
    pub const fn observation(&self) -> Option<&Observation<T>> {
        match self {
            Self::Reached(obs) | Self::Unexpected(obs) => Some(obs),
            Self::Gone => None,
        }
    }

    /// Consumes the outcome and returns the fetched value, if any.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Reached(obs) | Self::Unexpected(obs) => Some(obs.value),
            Self::Gone => None,
        }
    }

    /// Returns true if a target state was reached or the resource is gone.
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        matches!(self, Self::Reached(_) | Self::Gone)
    }
}

/// Errors terminating a wait.
#[derive(Debug, Error)]
pub enum WaitError<T> {
    /// The resource stayed pending past the timeout.
    #[error("Timeout after {elapsed:?} waiting for state {expected} (last state: {last_state})")]
    TimedOut {
        /// Last observed state label.
        last_state: String,
        /// Last fetched value.
        last_value: T,
        /// Rendered target set.
        expected: String,
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// A read failed. Reads are never retried inside a wait.
    #[error(transparent)]
    Fetch(LifecycleError),
}

impl<T> From<WaitError<T>> for LifecycleError {
    fn from(err: WaitError<T>) -> Self {
        match err {
            WaitError::TimedOut {
                last_state,
                expected,
                elapsed,
                ..
            } => Self::WaitTimedOut {
                last_state,
                expected,
                elapsed,
            },
            WaitError::Fetch(err) => err,
        }
    }
}

/// Drives one wait to completion.
///
/// A waiter is built for a single call and consumed by [`Waiter::wait`].
#[derive(Debug)]
pub struct Waiter {
    /// State machine to wait on.
    spec: WaitSpec,
}

impl Waiter {
    /// Creates a waiter for the given spec.
    #[must_use]
    pub const fn new(spec: WaitSpec) -> Self {
        Self { spec }
    }

    /// Polls `fetcher` for `key` until a target state, an unexpected
    /// state, absence (for deletion specs) or the timeout.
    ///
    /// The first read happens immediately. The deadline is checked after
    /// every pending observation, so the call never blocks much longer
    /// than `timeout + poll_interval`.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::TimedOut`] when the timeout elapses while the
    /// resource is pending, and [`WaitError::Fetch`] for any read failure
    /// other than not-found on a deletion spec.
    pub async fn wait<F>(
        self,
        fetcher: &F,
        key: &F::Key,
    ) -> std::result::Result<WaitOutcome<F::Value>, WaitError<F::Value>>
    where
        F: StatusFetcher + ?Sized,
    {
        let start = Instant::now();
        let mut fetches: u32 = 0;

        debug!(
            "Waiting for {key}: pending [{}], target [{}], timeout {:?}",
            self.spec.pending.iter().cloned().collect::<Vec<_>>().join(", "),
            self.spec.target_label(),
            self.spec.timeout
        );

        loop {
            fetches = fetches.saturating_add(1);

            let observation = match fetcher.fetch(key).await {
                Ok(observation) => observation,
                Err(err) if err.is_not_found() && self.spec.expects_absence() => {
                    info!("{key} no longer exists (after {fetches} reads)");
                    return Ok(WaitOutcome::Gone);
                }
                Err(err) => {
                    debug!("Status read for {key} failed: {err}");
                    return Err(WaitError::Fetch(err));
                }
            };

            if self.spec.is_target(&observation.state) {
                info!(
                    "{key} reached {} after {fetches} reads",
                    observation.state
                );
                return Ok(WaitOutcome::Reached(observation));
            }

            if !self.spec.is_pending(&observation.state) {
                warn!(
                    "{key} settled in unexpected state {}{}",
                    observation.state,
                    observation
                        .reason
                        .as_deref()
                        .map(|r| format!(": {r}"))
                        .unwrap_or_default()
                );
                return Ok(WaitOutcome::Unexpected(observation));
            }

            let elapsed = start.elapsed();
            if elapsed >= self.spec.timeout {
                return Err(WaitError::TimedOut {
                    last_state: observation.state,
                    last_value: observation.value,
                    expected: self.spec.target_label(),
                    elapsed,
                });
            }

            debug!(
                "{key} is {} (read {fetches}), next read in {:?}",
                observation.state, self.spec.poll_interval
            );
            sleep(self.spec.poll_interval).await;
        }
    }
}
