//! Converger driving one lifecycle operation to completion.
//!
//! A create, update or delete is a retried mutation followed by the wait
//! the resource profile prescribes for that operation. The waiter reports
//! unexpected terminal states as values; this layer turns them into
//! errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::error::{LifecycleError, Result};
use crate::profiles::{Operation, ResourceKind, ResourceProfile};
use crate::retry::{MutationOp, RetryingMutator};
use crate::waiter::{StatusFetcher, WaitOutcome, Waiter};

/// Runs operations under one resource profile.
#[derive(Debug)]
pub struct Converger<'a> {
    /// Profile in effect.
    profile: &'a ResourceProfile,
}

/// Result of a converged operation.
#[derive(Debug, Clone, Serialize)]
pub struct ConvergeReport {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Operation performed.
    pub operation: Operation,
    /// Resource key.
    pub id: String,
    /// Mutation calls made.
    pub attempts: u32,
    /// Final observed state; `None` if the resource is gone or no wait ran.
    pub final_state: Option<String>,
    /// Whether a wait followed the mutation.
    pub waited: bool,
    /// When the operation started.
    pub started_at: DateTime<Utc>,
    /// When the operation finished.
    pub finished_at: DateTime<Utc>,
}

impl ConvergeReport {
    /// Wall-clock time spent.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for ConvergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}: {} after {} attempt(s) in {}s",
            self.operation,
            self.kind,
            self.id,
            self.final_state.as_deref().unwrap_or("<deleted>"),
            self.attempts,
            self.duration().num_seconds()
        )
    }
}

impl<'a> Converger<'a> {
    /// Creates a converger for a profile.
    #[must_use]
    pub const fn new(profile: &'a ResourceProfile) -> Self {
        Self { profile }
    }

    /// Creates a resource and waits for it to become usable.
    ///
    /// # Errors
    ///
    /// Returns the mutation error, a wait timeout, a read failure, or
    /// [`LifecycleError::UnexpectedState`].
    pub async fn create<O, F>(&self, op: &O, fetcher: &F, key: &F::Key) -> Result<ConvergeReport>
    where
        O: MutationOp + ?Sized,
        F: StatusFetcher + ?Sized,
    {
        self.run(Operation::Create, op, fetcher, key).await
    }

    /// Updates a resource and waits for it to settle.
    ///
    /// # Errors
    ///
    /// See [`Converger::create`].
    pub async fn update<O, F>(&self, op: &O, fetcher: &F, key: &F::Key) -> Result<ConvergeReport>
    where
        O: MutationOp + ?Sized,
        F: StatusFetcher + ?Sized,
    {
        self.run(Operation::Update, op, fetcher, key).await
    }

    /// Deletes a resource and waits for it to disappear.
    ///
    /// A delete rejected because the resource is already absent succeeds.
    ///
    /// # Errors
    ///
    /// See [`Converger::create`].
    pub async fn delete<O, F>(&self, op: &O, fetcher: &F, key: &F::Key) -> Result<ConvergeReport>
    where
        O: MutationOp + ?Sized,
        F: StatusFetcher + ?Sized,
    {
        self.run(Operation::Delete, op, fetcher, key).await
    }

    /// Runs `operation`: the retried mutation, then the profile's wait.
    ///
    /// # Errors
    ///
    /// See [`Converger::create`].
    pub async fn run<O, F>(
        &self,
        operation: Operation,
        op: &O,
        fetcher: &F,
        key: &F::Key,
    ) -> Result<ConvergeReport>
    where
        O: MutationOp + ?Sized,
        F: StatusFetcher + ?Sized,
    {
        let kind = self.profile.kind;
        let op_profile = self.profile.operation(operation);
        let started_at = Utc::now();
        info!("Starting {operation} of {kind} {key}");

        let mut mutator = RetryingMutator::new(&op_profile.retry);
        let already_gone = match mutator.call(op).await {
            Ok(_) => false,
            Err(err) if operation == Operation::Delete && err.is_not_found() => {
                info!("{kind} {key} was already deleted");
                true
            }
            Err(err) => return Err(err),
        };

        let mut report = ConvergeReport {
            kind,
            operation,
            id: key.to_string(),
            attempts: mutator.attempts(),
            final_state: None,
            waited: false,
            started_at,
            finished_at: started_at,
        };

        if let (Some(spec), false) = (&op_profile.wait, already_gone) {
            report.waited = true;
            match Waiter::new(spec.clone()).wait(fetcher, key).await? {
                WaitOutcome::Reached(observation) => {
                    report.final_state = Some(observation.state);
                }
                WaitOutcome::Gone => {}
                WaitOutcome::Unexpected(observation) => {
                    warn!("{operation} of {kind} {key} ended in {}", observation.state);
                    return Err(LifecycleError::UnexpectedState {
                        id: key.to_string(),
                        state: observation.state,
                        reason: observation.reason,
                    });
                }
            }
        }

        report.finished_at = Utc::now();
        info!("Finished {report}");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::profiles::builtin_profile;
    use crate::waiter::Observation;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio_test::assert_ok;

    /// Fails with the queued errors, then succeeds.
    struct ScriptedOp {
        failures: Mutex<Vec<LifecycleError>>,
        calls: AtomicU32,
    }

    impl ScriptedOp {
        fn new(failures: Vec<LifecycleError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl MutationOp for ScriptedOp {
        type Output = ();

        async fn call(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut failures = self.failures.lock().expect("lock");
            if failures.is_empty() {
                Ok(())
            } else {
                Err(failures.remove(0))
            }
        }
    }

    /// Replays states; `None` means absent. The last entry repeats.
    struct StateFetcher {
        states: Vec<Option<&'static str>>,
        reason: Option<&'static str>,
        calls: AtomicU32,
    }

    impl StateFetcher {
        fn new(states: Vec<Option<&'static str>>) -> Self {
            Self {
                states,
                reason: None,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusFetcher for StateFetcher {
        type Key = str;
        type Value = ();

        async fn fetch(&self, key: &str) -> Result<Observation<()>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            match self.states[call.min(self.states.len() - 1)] {
                Some(state) => {
                    let observation = Observation::new(state, ());
                    Ok(match self.reason {
                        Some(reason) => observation.with_reason(reason),
                        None => observation,
                    })
                }
                None => Err(ApiError::not_found("resource", key).into()),
            }
        }
    }

    fn iam_error() -> LifecycleError {
        ApiError::service(
            "InvalidInputException",
            "Role should be given assume role permissions for Glue Service",
        )
        .into()
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_retries_then_waits() {
        let profile = builtin_profile(ResourceKind::DevEndpoint);
        let op = ScriptedOp::new(vec![iam_error(), iam_error()]);
        let fetcher = StateFetcher::new(vec![Some("PROVISIONING"), Some("READY")]);

        let report = assert_ok!(
            Converger::new(&profile)
                .create(&op, &fetcher, "dev-endpoint-1")
                .await
        );

        assert_eq!(report.attempts, 3);
        assert_eq!(report.final_state.as_deref(), Some("READY"));
        assert!(report.waited);
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(report.id, "dev-endpoint-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_state_becomes_error() {
        let profile = builtin_profile(ResourceKind::DevEndpoint);
        let op = ScriptedOp::new(vec![]);
        let mut fetcher = StateFetcher::new(vec![Some("PROVISIONING"), Some("FAILED")]);
        fetcher.reason = Some("subnet has no NAT gateway");

        let err = Converger::new(&profile)
            .create(&op, &fetcher, "dev-endpoint-1")
            .await
            .unwrap_err();

        match err {
            LifecycleError::UnexpectedState { id, state, reason } => {
                assert_eq!(id, "dev-endpoint-1");
                assert_eq!(state, "FAILED");
                assert_eq!(reason.as_deref(), Some("subnet has no NAT gateway"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_waits_for_absence() {
        let profile = builtin_profile(ResourceKind::Trigger);
        let op = ScriptedOp::new(vec![]);
        let fetcher = StateFetcher::new(vec![Some("DELETING"), Some("DELETING"), None]);

        let report = assert_ok!(Converger::new(&profile).delete(&op, &fetcher, "t1").await);

        assert_eq!(report.final_state, None);
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(report.to_string(), "delete trigger t1: <deleted> after 1 attempt(s) in 0s");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_of_absent_resource_succeeds() {
        let profile = builtin_profile(ResourceKind::Registry);
        let op = ScriptedOp::new(vec![ApiError::not_found("registry", "r1").into()]);
        let fetcher = StateFetcher::new(vec![Some("DELETING")]);

        let report = assert_ok!(Converger::new(&profile).delete(&op, &fetcher, "r1").await);

        assert!(!report.waited);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_not_found_is_fatal() {
        let profile = builtin_profile(ResourceKind::Schema);
        let op = ScriptedOp::new(vec![ApiError::not_found("registry", "r1").into()]);
        let fetcher = StateFetcher::new(vec![Some("AVAILABLE")]);

        let err = Converger::new(&profile)
            .create(&op, &fetcher, "r1/s1")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_configured() {
        let profile = builtin_profile(ResourceKind::Crawler);
        let op = ScriptedOp::new(vec![]);
        let fetcher = StateFetcher::new(vec![Some("READY")]);

        let report = assert_ok!(Converger::new(&profile).create(&op, &fetcher, "c1").await);
        assert!(!report.waited);
        assert_eq!(report.final_state, None);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_timeout_is_reported() {
        let profile = builtin_profile(ResourceKind::PartitionIndex);
        let op = ScriptedOp::new(vec![]);
        let fetcher = StateFetcher::new(vec![Some("CREATING")]);

        let err = Converger::new(&profile)
            .create(&op, &fetcher, "111122223333:db:tbl:idx")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::WaitTimedOut { ref last_state, .. } if last_state == "CREATING"));
    }
}
