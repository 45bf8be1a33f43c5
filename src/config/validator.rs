//! Configuration validation.
//!
//! Collects every problem in one pass so `glue-lifecycle validate` can report
//! them together, then fails on the first error.

use crate::error::{ConfigError, LifecycleError, Result};
use crate::profiles::{Operation, ResourceKind};
use reqwest::Url;
use std::collections::HashSet;
use tracing::debug;

use super::spec::{LifecycleConfig, OperationOverride, RemoteConfig, RetryConfig, WaitConfig};

/// Validator for lifecycle configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a configuration, returning warnings on success.
    ///
    /// # Errors
    ///
    /// Returns the first validation error.
    pub fn validate(&self, config: &LifecycleConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        match result.errors.first() {
            None => {
                debug!("Configuration validation passed");
                Ok(result)
            }
            Some(first) => Err(LifecycleError::Config(ConfigError::validation(
                first.message.clone(),
                first.field.clone(),
            ))),
        }
    }

    /// Validates a configuration and returns every finding.
    #[must_use]
    pub fn check(&self, config: &LifecycleConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_remote(&config.remote, &mut result);

        for (kind, overrides) in &config.profiles {
            for operation in Operation::ALL {
                if let Some(op_override) = overrides.operation(operation) {
                    Self::validate_operation(*kind, operation, op_override, &mut result);
                }
            }
        }

        result
    }

    fn validate_remote(remote: &RemoteConfig, result: &mut ValidationResult) {
        match Url::parse(&remote.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => result.error(
                "remote.endpoint",
                format!("Endpoint scheme must be http or https, got '{}'", url.scheme()),
            ),
            Err(e) => result.error(
                "remote.endpoint",
                format!("Endpoint '{}' is not a valid URL: {e}", remote.endpoint),
            ),
        }

        if remote.request_timeout_secs == 0 {
            result.error(
                "remote.request_timeout_secs",
                "Request timeout must be at least 1 second",
            );
        }
    }

    fn validate_operation(
        kind: ResourceKind,
        operation: Operation,
        op_override: &OperationOverride,
        result: &mut ValidationResult,
    ) {
        let prefix = format!("profiles.{kind}.{operation}");

        if op_override.wait.is_none() && op_override.retry.is_none() {
            result
                .warnings
                .push(format!("{prefix}: Override is empty and has no effect"));
        }

        if let Some(wait) = &op_override.wait {
            Self::validate_wait(wait, &format!("{prefix}.wait"), result);
        }

        if let Some(retry) = &op_override.retry {
            Self::validate_retry(retry, &format!("{prefix}.retry"), result);
        }
    }

    fn validate_wait(wait: &WaitConfig, prefix: &str, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (field, states) in [("pending", &wait.pending), ("target", &wait.target)] {
            for (i, state) in states.iter().enumerate() {
                if state.trim().is_empty() {
                    result.error(
                        format!("{prefix}.{field}[{i}]"),
                        "State label cannot be empty",
                    );
                } else if !seen.insert(state.as_str()) {
                    result.error(
                        format!("{prefix}.{field}[{i}]"),
                        format!("State '{state}' is listed more than once"),
                    );
                }
            }
        }

        if wait.poll_interval_secs == 0 {
            result.error(
                format!("{prefix}.poll_interval_secs"),
                "Poll interval must be at least 1 second",
            );
        }

        if wait.timeout_secs == 0 {
            result.error(
                format!("{prefix}.timeout_secs"),
                "Timeout must be at least 1 second",
            );
        } else if wait.poll_interval_secs > wait.timeout_secs {
            result.warnings.push(format!(
                "{prefix}: Poll interval {}s exceeds timeout {}s; only one poll will happen",
                wait.poll_interval_secs, wait.timeout_secs
            ));
        }

        if wait.pending.is_empty() && wait.target.is_empty() {
            result.warnings.push(format!(
                "{prefix}: No pending states; any observed state is unexpected"
            ));
        }
    }

    fn validate_retry(retry: &RetryConfig, prefix: &str, result: &mut ValidationResult) {
        for (i, rule) in retry.rules.rules().iter().enumerate() {
            if rule.matcher.is_empty() {
                result.error(
                    format!("{prefix}.rules[{i}]"),
                    "Rule must set a code, a message_contains, or both",
                );
            }
        }

        if retry.rules.is_empty() && retry.max_duration_secs > 0 {
            result.warnings.push(format!(
                "{prefix}: Retry window set but no rules; every error is fatal"
            ));
        }

        if retry.delay_secs == 0 && retry.max_duration_secs > 0 {
            result.warnings.push(format!(
                "{prefix}.delay_secs: Zero delay retries in a tight loop"
            ));
        }
    }
}

impl ValidationResult {
    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigParser;

    fn parse(yaml: &str) -> LifecycleConfig {
        ConfigParser::new().parse_yaml(yaml, None).expect("valid yaml")
    }

    #[test]
    fn test_default_config_is_valid() {
        let result = ConfigValidator::new()
            .validate(&LifecycleConfig::default())
            .expect("valid");
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_bad_endpoint() {
        let config = parse("remote:\n  endpoint: ftp://glue.local\n");
        let result = ConfigValidator::new().check(&config);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.errors[0].field, "remote.endpoint");

        let config = parse("remote:\n  endpoint: not a url\n");
        assert!(ConfigValidator::new().validate(&config).is_err());
    }

    #[test]
    fn test_overlapping_states_and_zero_durations() {
        let yaml = r"
profiles:
  schema:
    create:
      wait:
        pending: [PENDING, AVAILABLE]
        target: [AVAILABLE]
        poll_interval_secs: 0
        timeout_secs: 0
";
        let result = ConfigValidator::new().check(&parse(yaml));

        let fields: Vec<_> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "profiles.schema.create.wait.target[0]",
                "profiles.schema.create.wait.poll_interval_secs",
                "profiles.schema.create.wait.timeout_secs",
            ]
        );
    }

    #[test]
    fn test_empty_matcher_is_rejected() {
        let yaml = r"
profiles:
  crawler:
    update:
      retry:
        max_duration_secs: 60
        rules:
          - verdict: retryable
";
        let err = ConfigValidator::new().validate(&parse(yaml)).unwrap_err();
        assert!(err.to_string().contains("Rule must set a code"));
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let yaml = r"
profiles:
  trigger:
    update: {}
    delete:
      wait:
        pending: [DELETING]
        poll_interval_secs: 60
        timeout_secs: 30
";
        let result = ConfigValidator::new().validate(&parse(yaml)).expect("valid");
        assert_eq!(result.warning_count(), 2);
    }
}
