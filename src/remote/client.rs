//! JSON control-plane client.
//!
//! Speaks a REST-style JSON protocol: resources are addressed by path,
//! reads are `GET`, mutations use the method of the operation. Error
//! bodies follow the AWS JSON convention (`__type` plus `message`).

use reqwest::{Client, Method, StatusCode, header};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::RemoteConfig;
use crate::error::{ApiError, LifecycleError, Result};

/// Error code the control plane uses for missing resources.
pub const ENTITY_NOT_FOUND: &str = "EntityNotFoundException";

/// HTTP client for the control plane.
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    /// HTTP client.
    client: Client,
    /// Base URL without trailing slash.
    endpoint: String,
}

impl ControlPlaneClient {
    /// Creates a client for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(remote: &RemoteConfig) -> Result<Self> {
        Self::new(&remote.endpoint, remote.request_timeout())
    }

    /// Base URL of the control plane.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Reads the resource at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the resource does not exist, or
    /// another API error for transport and service failures.
    pub async fn describe(&self, path: &str) -> Result<Value> {
        self.execute(Method::GET, path, None).await
    }

    /// Sends a mutating request to `path`.
    ///
    /// # Errors
    ///
    /// Returns an API error carrying the service error code and message.
    pub async fn mutate(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        self.execute(method, path, body).await
    }

    /// Executes a single request. Never retries; retrying belongs to the
    /// caller's retry policy.
    async fn execute(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}/{}", self.endpoint, path.trim_start_matches('/'));
        trace!("{method} {url}");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            LifecycleError::Api(ApiError::network(format!("Request failed: {e}")))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            LifecycleError::Api(ApiError::network(format!("Failed to read response: {e}")))
        })?;

        if !status.is_success() {
            debug!("{method} {url} returned {status}");
            return Err(error_from_response(status, path, &text).into());
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            LifecycleError::Api(ApiError::invalid_response(format!(
                "Failed to parse response from {path}: {e}"
            )))
        })
    }
}

/// Maps a non-success response to an API error.
fn error_from_response(status: StatusCode, path: &str, body: &str) -> ApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |names: &[&str]| {
        parsed.as_ref().and_then(|v| {
            names
                .iter()
                .find_map(|name| v.get(*name).and_then(Value::as_str))
                .map(str::to_string)
        })
    };

    let code = field(&["__type", "code", "Code"]).map(|c| strip_namespace(&c).to_string());
    let message = field(&["message", "Message"]).unwrap_or_else(|| body.trim().to_string());

    if status == StatusCode::NOT_FOUND || code.as_deref() == Some(ENTITY_NOT_FOUND) {
        return ApiError::not_found(path, message);
    }

    ApiError::Service {
        code: code.unwrap_or_else(|| format!("Http{}", status.as_u16())),
        message,
        status: Some(status.as_u16()),
    }
}

/// Strips a `namespace#` prefix from an error type.
fn strip_namespace(code: &str) -> &str {
    code.rsplit_once('#').map_or(code, |(_, name)| name)
}
