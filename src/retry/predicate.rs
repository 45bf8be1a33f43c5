//! Data-driven classification of mutation errors.
//!
//! Each resource kind supplies a [`RetryTable`]: an ordered list of
//! matchers, each mapping an error code and/or message substring to a
//! [`Verdict`]. The first matching rule wins; anything unmatched is fatal.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LifecycleError;

/// Classification of a failed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Caused by a temporary condition; the call may be retried.
    Retryable,
    /// Anything else; surfaced immediately.
    Fatal,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retryable => write!(f, "retryable"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Matches an error by code, by message substring, or both.
///
/// A matcher with neither condition never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMatcher {
    /// Exact error code, e.g. `InvalidInputException`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Substring the error message must contain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_contains: Option<String>,
}

impl ErrorMatcher {
    /// Matches any error carrying `code`.
    #[must_use]
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message_contains: None,
        }
    }

    /// Matches errors carrying `code` whose message contains `needle`.
    #[must_use]
    pub fn code_and_message(code: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message_contains: Some(needle.into()),
        }
    }

    /// Matches any error whose message contains `needle`.
    #[must_use]
    pub fn message(needle: impl Into<String>) -> Self {
        Self {
            code: None,
            message_contains: Some(needle.into()),
        }
    }

    /// Returns true if the matcher has no condition.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.code.is_none() && self.message_contains.is_none()
    }

    /// Tests the matcher against an error.
    #[must_use]
    pub fn matches(&self, err: &LifecycleError) -> bool {
        if self.is_empty() {
            return false;
        }

        if let Some(code) = &self.code {
            if err.error_code() != Some(code.as_str()) {
                return false;
            }
        }

        if let Some(needle) = &self.message_contains {
            if !err.message().contains(needle.as_str()) {
                return false;
            }
        }

        true
    }
}

impl fmt::Display for ErrorMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.message_contains) {
            (Some(code), Some(needle)) => write!(f, "{code} containing {needle:?}"),
            (Some(code), None) => write!(f, "{code}"),
            (None, Some(needle)) => write!(f, "message containing {needle:?}"),
            (None, None) => write!(f, "<empty>"),
        }
    }
}

const fn default_verdict() -> Verdict {
    Verdict::Retryable
}

/// One entry of a retry table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryRule {
    /// What the rule matches.
    #[serde(flatten)]
    pub matcher: ErrorMatcher,
    /// Verdict for matching errors.
    #[serde(default = "default_verdict")]
    pub verdict: Verdict,
}

/// Ordered list of retry rules for one resource operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryTable {
    rules: Vec<RetryRule>,
}

impl RetryTable {
    /// Creates an empty table; every error is fatal.
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Creates a table from explicit rules.
    #[must_use]
    pub const fn from_rules(rules: Vec<RetryRule>) -> Self {
        Self { rules }
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(mut self, matcher: ErrorMatcher, verdict: Verdict) -> Self {
        self.rules.push(RetryRule { matcher, verdict });
        self
    }

    /// Appends a retryable rule matching an error code.
    #[must_use]
    pub fn retry_on_code(self, code: &str) -> Self {
        self.with_rule(ErrorMatcher::code(code), Verdict::Retryable)
    }

    /// Appends a retryable rule matching an error code and message substring.
    #[must_use]
    pub fn retry_on_message(self, code: &str, needle: &str) -> Self {
        self.with_rule(ErrorMatcher::code_and_message(code, needle), Verdict::Retryable)
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[RetryRule] {
        &self.rules
    }

    /// Returns true if the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classifies an error. The first matching rule wins.
    #[must_use]
    pub fn classify(&self, err: &LifecycleError) -> Verdict {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(err))
            .map_or(Verdict::Fatal, |rule| rule.verdict)
    }
}
