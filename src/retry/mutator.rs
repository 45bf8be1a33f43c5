//! Bounded-duration retry of mutating control-plane calls.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::error::{LifecycleError, Result};

use super::predicate::{RetryTable, Verdict};

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Time IAM changes typically need to become visible to the control plane.
pub const IAM_PROPAGATION_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Retry policy for one resource operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Bound on the total time spent retrying.
    pub max_duration: Duration,
    /// Flat delay between attempts.
    pub delay: Duration,
    /// Classification table.
    pub table: RetryTable,
}

impl RetryPolicy {
    /// Creates a policy with the default delay.
    #[must_use]
    pub const fn new(max_duration: Duration, table: RetryTable) -> Self {
        Self {
            max_duration,
            delay: DEFAULT_RETRY_DELAY,
            table,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn never() -> Self {
        Self::new(Duration::ZERO, RetryTable::new())
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns true if the error is classified as transient.
    #[must_use]
    pub fn is_retryable(&self, err: &LifecycleError) -> bool {
        self.table.classify(err) == Verdict::Retryable
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::never()
    }
}

/// One remote create, update or delete invocation.
///
/// Implementations must be safe to invoke repeatedly: a retried create
/// that already succeeded must fail with an error the retry table treats
/// as fatal.
#[cfg_attr(test, mockall::automock(type Output = String;))]
#[async_trait]
pub trait MutationOp: Send + Sync {
    /// Response of a successful call.
    type Output: Send;

    /// Performs the call once.
    async fn call(&self) -> Result<Self::Output>;
}

/// Wraps mutating calls with the retry policy of one operation.
#[derive(Debug)]
pub struct RetryingMutator<'a> {
    /// Policy in effect.
    policy: &'a RetryPolicy,
    /// Calls made so far.
    attempts: u32,
}

impl<'a> RetryingMutator<'a> {
    /// Creates a mutator for the given policy.
    #[must_use]
    pub const fn new(policy: &'a RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// Number of calls made so far, including the final bare attempt.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Calls `op`, retrying transient failures.
    ///
    /// Retryable errors are retried after a flat delay while less than
    /// `max_duration` has elapsed. Once the window is exhausted one last
    /// attempt is made and its result is returned as is, so callers see
    /// the real error rather than a synthetic timeout.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error, or the error of the final attempt.
    pub async fn call<O>(&mut self, op: &O) -> Result<O::Output>
    where
        O: MutationOp + ?Sized,
    {
        let start = Instant::now();

        loop {
            self.attempts = self.attempts.saturating_add(1);

            let err = match op.call().await {
                Ok(output) => return Ok(output),
                Err(err) => err,
            };

            if !self.policy.is_retryable(&err) {
                debug!("Attempt {} failed with fatal error: {err}", self.attempts);
                return Err(err);
            }

            if start.elapsed() >= self.policy.max_duration {
                warn!(
                    "Retry window of {:?} exhausted after {} attempts ({err}), making final attempt",
                    self.policy.max_duration, self.attempts
                );
                break;
            }

            debug!(
                "Attempt {} failed with transient error: {err}; retrying in {:?}",
                self.attempts, self.policy.delay
            );
            sleep(self.policy.delay).await;
        }

        self.attempts = self.attempts.saturating_add(1);
        op.call().await
    }
}

/// Calls `op` under `policy`. See [`RetryingMutator::call`].
///
/// # Errors
///
/// Returns the first fatal error, or the error of the final attempt.
pub async fn retrying_call<O>(op: &O, policy: &RetryPolicy) -> Result<O::Output>
where
    O: MutationOp + ?Sized,
{
    RetryingMutator::new(policy).call(op).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use mockall::Sequence;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio_test::{assert_err, assert_ok};

    fn iam_policy() -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs(10),
            RetryTable::new().retry_on_message("InvalidInputException", "is not authorized to perform"),
        )
        .with_delay(Duration::from_secs(1))
    }

    fn transient() -> LifecycleError {
        ApiError::service(
            "InvalidInputException",
            "Role is not authorized to perform: iam:PassRole",
        )
        .into()
    }

    fn fatal() -> LifecycleError {
        ApiError::service("AlreadyExistsException", "Trigger my-trigger already exists").into()
    }

    /// Always fails transiently, numbering each failure.
    struct AlwaysTransient {
        calls: AtomicU32,
    }

    #[async_trait]
    impl MutationOp for AlwaysTransient {
        type Output = ();

        async fn call(&self) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Err(ApiError::service(
                "InvalidInputException",
                format!("attempt {call}: Role is not authorized to perform: iam:PassRole"),
            )
            .into())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let mut op = MockMutationOp::new();
        op.expect_call().times(1).returning(|| Ok(String::from("created")));

        let policy = iam_policy();
        let mut mutator = RetryingMutator::new(&policy);
        let output = assert_ok!(mutator.call(&op).await);

        assert_eq!(output, "created");
        assert_eq!(mutator.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_short_circuits() {
        let mut op = MockMutationOp::new();
        op.expect_call().times(1).returning(|| Err(fatal()));

        let policy = iam_policy();
        let mut mutator = RetryingMutator::new(&policy);
        let err = assert_err!(mutator.call(&op).await);

        assert_eq!(err.error_code(), Some("AlreadyExistsException"));
        assert_eq!(mutator.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_absorbed() {
        let mut seq = Sequence::new();
        let mut op = MockMutationOp::new();
        op.expect_call()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|| Err(transient()));
        op.expect_call()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(String::from("created")));

        let start = Instant::now();
        let output = assert_ok!(retrying_call(&op, &iam_policy()).await);

        assert_eq!(output, "created");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_after_transient_stops_immediately() {
        let mut seq = Sequence::new();
        let mut op = MockMutationOp::new();
        op.expect_call()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(transient()));
        op.expect_call()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(fatal()));

        let err = assert_err!(retrying_call(&op, &iam_policy()).await);
        assert_eq!(err.error_code(), Some("AlreadyExistsException"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_surfaces_final_attempt_error() {
        let op = AlwaysTransient {
            calls: AtomicU32::new(0),
        };
        let policy = iam_policy();

        let start = Instant::now();
        let mut mutator = RetryingMutator::new(&policy);
        let err = assert_err!(mutator.call(&op).await);

        // Attempts at 0s..=10s inside the window, then one bare attempt.
        let calls = op.calls.load(Ordering::SeqCst);
        assert!(start.elapsed() >= policy.max_duration);
        assert_eq!(calls, 12);
        assert_eq!(mutator.attempts(), calls);

        // The error is the real one from the last call, not a timeout.
        assert_eq!(err.error_code(), Some("InvalidInputException"));
        assert!(err.message().starts_with(&format!("attempt {calls}:")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_window_makes_one_final_attempt() {
        let op = AlwaysTransient {
            calls: AtomicU32::new(0),
        };
        let policy = RetryPolicy::new(Duration::ZERO, iam_policy().table);

        let err = assert_err!(retrying_call(&op, &policy).await);

        assert_eq!(op.calls.load(Ordering::SeqCst), 2);
        assert!(err.message().starts_with("attempt 2:"));
    }

    #[tokio::test]
    async fn test_never_policy_does_not_retry() {
        let op = AlwaysTransient {
            calls: AtomicU32::new(0),
        };

        assert_err!(retrying_call(&op, &RetryPolicy::never()).await);
        assert_eq!(op.calls.load(Ordering::SeqCst), 1);
    }
}
