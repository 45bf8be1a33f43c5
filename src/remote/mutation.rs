//! Mutating request as a retryable operation.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::Result;
use crate::retry::MutationOp;

use super::client::ControlPlaneClient;

/// One create, update or delete request against the control plane.
#[derive(Debug, Clone)]
pub struct HttpMutation {
    client: ControlPlaneClient,
    method: Method,
    path: String,
    body: Option<Value>,
}

impl HttpMutation {
    /// Creates a mutation without a body.
    #[must_use]
    pub fn new(client: ControlPlaneClient, method: Method, path: impl Into<String>) -> Self {
        Self {
            client,
            method,
            path: path.into(),
            body: None,
        }
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[async_trait]
impl MutationOp for HttpMutation {
    type Output = Value;

    async fn call(&self) -> Result<Value> {
        self.client
            .mutate(self.method.clone(), &self.path, self.body.as_ref())
            .await
    }
}
