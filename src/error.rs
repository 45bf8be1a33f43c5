//! Error types for the Glue lifecycle subsystem.
//!
//! This module provides the error hierarchy shared by waiters, retrying
//! mutations, identifier decoding, configuration and the remote adapter.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Control-plane API errors.
    #[error("Control plane error: {0}")]
    Api(#[from] ApiError),

    /// Composite identifier errors.
    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    /// A wait exceeded its timeout while the resource stayed pending.
    #[error("Timeout after {elapsed:?} waiting for state {expected} (last state: {last_state})")]
    WaitTimedOut {
        /// Last observed state label.
        last_state: String,
        /// Target states, comma separated.
        expected: String,
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// A resource settled in a state outside both the pending and target sets.
    #[error("Resource {id} reached unexpected state {state}{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    UnexpectedState {
        /// Identifier of the resource.
        id: String,
        /// Observed state label.
        state: String,
        /// Failure reason reported by the control plane, if any.
        reason: Option<String>,
    },

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Unknown resource kind name.
    #[error("Unknown resource kind: {name}")]
    UnknownKind {
        /// The unrecognised name.
        name: String,
    },

    /// Unknown operation name.
    #[error("Unknown operation: {name}")]
    UnknownOperation {
        /// The unrecognised name.
        name: String,
    },
}

/// Errors reported by the remote control plane.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The resource does not exist.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource kind or path.
        resource: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// The service rejected the request.
    #[error("{code}: {message}")]
    Service {
        /// Error code, e.g. `InvalidInputException`.
        code: String,
        /// Error message from the service.
        message: String,
        /// HTTP status code, when known.
        status: Option<u16>,
    },

    /// Network error.
    #[error("Network error communicating with control plane: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid response from control plane: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Composite identifier errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier does not have the expected shape.
    #[error("Malformed identifier {id:?}: expected {expected}")]
    Malformed {
        /// The offending identifier.
        id: String,
        /// Expected format, e.g. `catalog-id:database-name:table-name`.
        expected: String,
    },

    /// A field contains a separator and would not decode back to itself.
    #[error("Field {field:?} must not contain '{separator}'")]
    ReservedSeparator {
        /// The offending field.
        field: String,
        /// Separator found in the field.
        separator: char,
    },

    /// A single empty partition value encodes the same as no values.
    #[error("A partition needs at least one non-empty value, or none at all")]
    EmptyPartitionValue,
}

/// Result type alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;

impl LifecycleError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the remote resource was reported absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotFound { .. }))
    }

    /// Returns the service error code, if this error carries one.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Api(ApiError::Service { code, .. }) => Some(code.as_str()),
            Self::Api(ApiError::NotFound { .. }) => Some("EntityNotFoundException"),
            _ => None,
        }
    }

    /// Returns the message used for substring matching.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api(ApiError::Service { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl ApiError {
    /// Creates a service error.
    #[must_use]
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = LifecycleError::from(ApiError::not_found("DevEndpoint", "my-endpoint"));
        assert!(err.is_not_found());
        assert_eq!(err.error_code(), Some("EntityNotFoundException"));

        let err = LifecycleError::from(ApiError::network("connection reset"));
        assert!(!err.is_not_found());
        assert_eq!(err.error_code(), None);
    }

    #[test]
    fn test_service_message_is_raw() {
        let err = LifecycleError::from(ApiError::service(
            "InvalidInputException",
            "Role is not authorized to perform: glue:CreateDevEndpoint",
        ));
        assert_eq!(err.error_code(), Some("InvalidInputException"));
        assert_eq!(
            err.message(),
            "Role is not authorized to perform: glue:CreateDevEndpoint"
        );
    }

    #[test]
    fn test_unexpected_state_display() {
        let err = LifecycleError::UnexpectedState {
            id: String::from("ep"),
            state: String::from("FAILED"),
            reason: Some(String::from("subnet has no free addresses")),
        };
        assert_eq!(
            err.to_string(),
            "Resource ep reached unexpected state FAILED: subnet has no free addresses"
        );

        let err = LifecycleError::UnexpectedState {
            id: String::from("ep"),
            state: String::from("FAILED"),
            reason: None,
        };
        assert_eq!(err.to_string(), "Resource ep reached unexpected state FAILED");
    }
}
