//! Status fetcher capability.
//!
//! A fetcher performs one remote read for a resource and extracts the
//! status label the waiter matches against its pending and target sets.

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// One status read of a remote resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation<T> {
    /// Extracted lifecycle state label.
    pub state: String,
    /// The full fetched resource.
    pub value: T,
    /// Failure reason reported alongside the state, if any.
    pub reason: Option<String>,
}

impl<T> Observation<T> {
    /// Creates an observation without a failure reason.
    #[must_use]
    pub fn new(state: impl Into<String>, value: T) -> Self {
        Self {
            state: state.into(),
            value,
            reason: None,
        }
    }

    /// Attaches a failure reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Trait for reading the current lifecycle state of a remote resource.
///
/// Implementations perform exactly one read per call. A resource that no
/// longer exists must be reported as [`crate::error::ApiError::NotFound`] so
/// that deletion waits can recognise it.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    /// Key identifying the resource, usually a composite identifier.
    type Key: ?Sized + fmt::Display + Sync;

    /// The fetched resource.
    type Value: Send;

    /// Reads the resource once.
    async fn fetch(&self, key: &Self::Key) -> Result<Observation<Self::Value>>;
}

#[async_trait]
impl<F: StatusFetcher + ?Sized> StatusFetcher for Box<F> {
    type Key = F::Key;
    type Value = F::Value;

    async fn fetch(&self, key: &Self::Key) -> Result<Observation<Self::Value>> {
        (**self).fetch(key).await
    }
}
