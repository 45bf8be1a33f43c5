//! Configuration model for `glue-lifecycle.yaml`.
//!
//! Every section is optional. An empty file yields the built-in profiles
//! talking to the default endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::profiles::{Operation, ResourceKind};
use crate::retry::{DEFAULT_RETRY_DELAY, RetryPolicy, RetryTable};
use crate::waiter::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, WaitSpec};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Control-plane connection settings.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Per-kind overrides of the built-in profiles.
    #[serde(default)]
    pub profiles: BTreeMap<ResourceKind, ProfileOverride>,
}

/// Control-plane connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL of the control plane.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl RemoteConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Overrides for one resource kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileOverride {
    /// Create operation override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<OperationOverride>,
    /// Update operation override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<OperationOverride>,
    /// Delete operation override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<OperationOverride>,
}

impl ProfileOverride {
    /// Returns the override of an operation, if any.
    #[must_use]
    pub const fn operation(&self, operation: Operation) -> Option<&OperationOverride> {
        match operation {
            Operation::Create => self.create.as_ref(),
            Operation::Update => self.update.as_ref(),
            Operation::Delete => self.delete.as_ref(),
        }
    }
}

/// Override for one operation. Each section replaces the built-in one whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationOverride {
    /// Replacement wait spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<WaitConfig>,
    /// Replacement retry policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

/// Wait spec as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WaitConfig {
    /// Pending states.
    #[serde(default)]
    pub pending: Vec<String>,
    /// Target states. Empty means wait for deletion.
    #[serde(default)]
    pub target: Vec<String>,
    /// Poll interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Wait timeout in seconds.
    #[serde(default = "default_wait_timeout")]
    pub timeout_secs: u64,
}

impl WaitConfig {
    /// Builds the wait spec.
    #[must_use]
    pub fn to_wait_spec(&self) -> WaitSpec {
        WaitSpec::new(self.pending.iter().cloned(), self.target.iter().cloned())
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Retry policy as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retry window in seconds.
    pub max_duration_secs: u64,
    /// Delay between attempts in seconds.
    #[serde(default = "default_retry_delay")]
    pub delay_secs: u64,
    /// Ordered classification rules.
    #[serde(default)]
    pub rules: RetryTable,
}

impl RetryConfig {
    /// Builds the retry policy.
    #[must_use]
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(self.max_duration_secs), self.rules.clone())
            .with_delay(Duration::from_secs(self.delay_secs))
    }
}

fn default_endpoint() -> String {
    String::from("http://localhost:4566")
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

const fn default_wait_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

const fn default_retry_delay() -> u64 {
    DEFAULT_RETRY_DELAY.as_secs()
}
