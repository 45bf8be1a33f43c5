//! Declarative description of a remote state machine to wait on.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::ConfigError;

/// Default interval between status reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default overall wait budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// States a waiter polls through and the states it accepts.
///
/// An empty `target` set means the wait completes when the resource
/// disappears; the fetcher signals that with a not-found error. Pairing
/// an empty target with a resource that never goes away simply times out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    /// States considered in progress.
    pub pending: BTreeSet<String>,
    /// States considered successfully terminal.
    pub target: BTreeSet<String>,
    /// Fixed delay between reads.
    pub poll_interval: Duration,
    /// Total wall-clock budget.
    pub timeout: Duration,
}

impl WaitSpec {
    /// Creates a spec with the default poll interval and timeout.
    #[must_use]
    pub fn new<P, T>(pending: P, target: T) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            pending: pending.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates a spec that waits for the resource to disappear.
    #[must_use]
    pub fn deletion<P>(pending: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self::new(pending, Vec::<String>::new())
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true if `state` is an in-progress state.
    #[must_use]
    pub fn is_pending(&self, state: &str) -> bool {
        self.pending.contains(state)
    }

    /// Returns true if `state` is an accepting state.
    #[must_use]
    pub fn is_target(&self, state: &str) -> bool {
        self.target.contains(state)
    }

    /// Returns true if this spec waits for the resource to be gone.
    #[must_use]
    pub fn expects_absence(&self) -> bool {
        self.target.is_empty()
    }

    /// Human-readable rendering of the target set.
    #[must_use]
    pub fn target_label(&self) -> String {
        if self.target.is_empty() {
            return String::from("<deleted>");
        }
        self.target.iter().cloned().collect::<Vec<_>>().join(", ")
    }

    /// Checks that the state sets are disjoint and durations non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the pending and target sets overlap or a
    /// duration is zero.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if let Some(state) = self.pending.intersection(&self.target).next() {
            return Err(ConfigError::validation(
                format!("state '{state}' is both pending and target"),
                "wait.pending",
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::validation(
                "poll interval must be greater than zero",
                "wait.poll_interval_secs",
            ));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::validation(
                "timeout must be greater than zero",
                "wait.timeout_secs",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let spec = WaitSpec::new(["CREATING"], ["READY"]);
        assert!(spec.is_pending("CREATING"));
        assert!(spec.is_target("READY"));
        assert!(!spec.is_pending("READY"));
        assert!(!spec.is_target("FAILED"));
        assert!(!spec.expects_absence());
    }

    #[test]
    fn test_deletion_spec() {
        let spec = WaitSpec::deletion(["DELETING"]);
        assert!(spec.expects_absence());
        assert_eq!(spec.target_label(), "<deleted>");
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_overlapping_sets_rejected() {
        let spec = WaitSpec::new(["CREATING", "READY"], ["READY"]);
        let err = spec.validate().unwrap_err();
        assert!(err.to_string().contains("READY"));
    }

    #[test]
    fn test_zero_durations_rejected() {
        let spec = WaitSpec::new(["A"], ["B"]).with_poll_interval(Duration::ZERO);
        assert!(spec.validate().is_err());

        let spec = WaitSpec::new(["A"], ["B"]).with_timeout(Duration::ZERO);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_target_label_sorted() {
        let spec = WaitSpec::new(["CREATING"], ["CREATED", "ACTIVATED"]);
        assert_eq!(spec.target_label(), "ACTIVATED, CREATED");
    }
}
