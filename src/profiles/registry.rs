//! Effective per-kind profiles: built-ins merged with configuration.

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{LifecycleConfig, OperationOverride};
use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::waiter::WaitSpec;

use super::builtin::builtin_profile;
use super::kind::{Operation, ResourceKind};

/// Wait and retry behaviour of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationProfile {
    /// State machine to wait on after the mutation, if any.
    pub wait: Option<WaitSpec>,
    /// Retry policy for the mutation.
    pub retry: RetryPolicy,
}

impl OperationProfile {
    /// Creates an operation profile.
    #[must_use]
    pub const fn new(wait: Option<WaitSpec>, retry: RetryPolicy) -> Self {
        Self { wait, retry }
    }
}

/// Behaviour of all operations of one resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceProfile {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Create operation.
    pub create: OperationProfile,
    /// Update operation.
    pub update: OperationProfile,
    /// Delete operation.
    pub delete: OperationProfile,
}

impl ResourceProfile {
    /// Creates a profile with no waits and no retries.
    #[must_use]
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            create: OperationProfile::default(),
            update: OperationProfile::default(),
            delete: OperationProfile::default(),
        }
    }

    /// Sets the create operation.
    #[must_use]
    pub fn with_create(mut self, create: OperationProfile) -> Self {
        self.create = create;
        self
    }

    /// Sets the update operation.
    #[must_use]
    pub fn with_update(mut self, update: OperationProfile) -> Self {
        self.update = update;
        self
    }

    /// Sets the delete operation.
    #[must_use]
    pub fn with_delete(mut self, delete: OperationProfile) -> Self {
        self.delete = delete;
        self
    }

    /// Returns the profile of an operation.
    #[must_use]
    pub const fn operation(&self, operation: Operation) -> &OperationProfile {
        match operation {
            Operation::Create => &self.create,
            Operation::Update => &self.update,
            Operation::Delete => &self.delete,
        }
    }

    fn operation_mut(&mut self, operation: Operation) -> &mut OperationProfile {
        match operation {
            Operation::Create => &mut self.create,
            Operation::Update => &mut self.update,
            Operation::Delete => &mut self.delete,
        }
    }
}

/// Effective profiles for every resource kind.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: BTreeMap<ResourceKind, ResourceProfile>,
}

impl ProfileRegistry {
    /// Creates a registry with the built-in profiles.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            profiles: ResourceKind::ALL
                .into_iter()
                .map(|kind| (kind, builtin_profile(kind)))
                .collect(),
        }
    }

    /// Creates a registry from built-ins with configuration overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if an override produces an invalid wait spec.
    pub fn from_config(config: &LifecycleConfig) -> Result<Self> {
        let mut registry = Self::builtin();

        for (kind, overrides) in &config.profiles {
            let profile = registry
                .profiles
                .entry(*kind)
                .or_insert_with(|| ResourceProfile::new(*kind));

            for operation in Operation::ALL {
                if let Some(op_override) = overrides.operation(operation) {
                    debug!("Applying {operation} override for {kind}");
                    apply_override(profile.operation_mut(operation), op_override)?;
                }
            }
        }

        Ok(registry)
    }

    /// Returns the profile of a kind.
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> Option<&ResourceProfile> {
        self.profiles.get(&kind)
    }

    /// Iterates over all profiles in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceProfile> {
        self.profiles.values()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn apply_override(target: &mut OperationProfile, op_override: &OperationOverride) -> Result<()> {
    if let Some(wait) = &op_override.wait {
        let spec = wait.to_wait_spec();
        spec.validate()?;
        target.wait = Some(spec);
    }

    if let Some(retry) = &op_override.retry {
        target.retry = retry.to_retry_policy();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigParser;
    use std::time::Duration;

    #[test]
    fn test_builtin_covers_all_kinds() {
        let registry = ProfileRegistry::builtin();
        for kind in ResourceKind::ALL {
            assert!(registry.get(kind).is_some(), "{kind}");
        }
        assert_eq!(registry.iter().count(), ResourceKind::ALL.len());
    }

    #[test]
    fn test_override_replaces_wait_and_retry() {
        let yaml = r"
profiles:
  dev_endpoint:
    create:
      wait:
        pending: [PROVISIONING, STARTING]
        target: [READY]
        poll_interval_secs: 30
        timeout_secs: 1800
      retry:
        max_duration_secs: 300
        delay_secs: 10
        rules:
          - code: InvalidInputException
            message_contains: not authorized
";
        let config = ConfigParser::new().parse_yaml(yaml, None).expect("valid config");
        let registry = ProfileRegistry::from_config(&config).expect("valid overrides");
        let profile = registry.get(ResourceKind::DevEndpoint).expect("present");

        let wait = profile.create.wait.as_ref().expect("wait spec");
        assert!(wait.is_pending("STARTING"));
        assert_eq!(wait.poll_interval, Duration::from_secs(30));
        assert_eq!(wait.timeout, Duration::from_secs(1800));

        assert_eq!(profile.create.retry.max_duration, Duration::from_secs(300));
        assert_eq!(profile.create.retry.delay, Duration::from_secs(10));
        assert_eq!(profile.create.retry.table.rules().len(), 1);

        // Untouched operations keep their built-in behaviour.
        assert_eq!(
            profile.delete,
            builtin_profile(ResourceKind::DevEndpoint).delete
        );
    }

    #[test]
    fn test_override_with_overlapping_states_is_rejected() {
        let yaml = r"
profiles:
  schema:
    create:
      wait:
        pending: [PENDING, AVAILABLE]
        target: [AVAILABLE]
";
        let config = ConfigParser::new().parse_yaml(yaml, None).expect("valid yaml");
        assert!(ProfileRegistry::from_config(&config).is_err());
    }
}
