//! Status fetcher backed by the control-plane client.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::profiles::ResourceKind;
use crate::waiter::{Observation, StatusFetcher};

use super::client::ControlPlaneClient;

/// Picks one named entry out of a list in the describe response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySelector {
    /// JSON pointer to the list.
    pub list_pointer: String,
    /// Field of each entry holding its name.
    pub name_field: String,
    /// Name of the wanted entry.
    pub name: String,
}

impl EntrySelector {
    /// Creates a selector.
    #[must_use]
    pub fn new(
        list_pointer: impl Into<String>,
        name_field: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            list_pointer: list_pointer.into(),
            name_field: name_field.into(),
            name: name.into(),
        }
    }

    /// Returns the matching entry. A missing or null list has no entries.
    fn select<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        value
            .pointer(&self.list_pointer)
            .and_then(Value::as_array)?
            .iter()
            .find(|entry| {
                entry.get(&self.name_field).and_then(Value::as_str) == Some(self.name.as_str())
            })
    }
}

/// Reads a resource by path and extracts its state with JSON pointers.
#[derive(Debug, Clone)]
pub struct HttpStatusFetcher {
    client: ControlPlaneClient,
    status_pointer: String,
    reason_pointer: Option<String>,
    entry: Option<EntrySelector>,
}

impl HttpStatusFetcher {
    /// Creates a fetcher reading the state at `status_pointer`.
    #[must_use]
    pub fn new(client: ControlPlaneClient, status_pointer: impl Into<String>) -> Self {
        Self {
            client,
            status_pointer: status_pointer.into(),
            reason_pointer: None,
            entry: None,
        }
    }

    /// Creates a fetcher using the default pointers of a resource kind.
    ///
    /// Kinds that live in a list on their parent also need
    /// [`with_entry`](Self::with_entry); see [`Self::for_entry`].
    #[must_use]
    pub fn for_kind(client: ControlPlaneClient, kind: ResourceKind) -> Self {
        let fetcher = Self::new(client, kind.status_pointer());
        match kind.reason_pointer() {
            Some(pointer) => fetcher.with_reason_pointer(pointer),
            None => fetcher,
        }
    }

    /// Creates a fetcher for the entry called `name`, for kinds described
    /// through their parent's list. Other kinds ignore `name`.
    #[must_use]
    pub fn for_entry(client: ControlPlaneClient, kind: ResourceKind, name: impl Into<String>) -> Self {
        let fetcher = Self::for_kind(client, kind);
        match kind.entry_list() {
            Some((list, field)) => fetcher.with_entry(EntrySelector::new(list, field, name)),
            None => fetcher,
        }
    }

    /// Also extracts a failure reason at `pointer`.
    #[must_use]
    pub fn with_reason_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.reason_pointer = Some(pointer.into());
        self
    }

    /// Reads the state from one list entry. Both pointers then apply to
    /// that entry, and a missing entry is reported as not found.
    #[must_use]
    pub fn with_entry(mut self, selector: EntrySelector) -> Self {
        self.entry = Some(selector);
        self
    }
}

#[async_trait]
impl StatusFetcher for HttpStatusFetcher {
    type Key = str;
    type Value = Value;

    async fn fetch(&self, key: &str) -> Result<Observation<Value>> {
        let mut value = self.client.describe(key).await?;

        if let Some(selector) = &self.entry {
            value = selector
                .select(&value)
                .cloned()
                .ok_or_else(|| ApiError::not_found(key, &selector.name))?;
        }

        let state = value
            .pointer(&self.status_pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::invalid_response(format!(
                    "No status at {} in response for {key}",
                    self.status_pointer
                ))
            })?;

        let reason = self
            .reason_pointer
            .as_deref()
            .and_then(|pointer| value.pointer(pointer))
            .and_then(Value::as_str)
            .filter(|reason| !reason.is_empty())
            .map(str::to_string);

        let observation = Observation::new(state, value);
        Ok(match reason {
            Some(reason) => observation.with_reason(reason),
            None => observation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waiter::{WaitOutcome, WaitSpec, Waiter};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn fetcher_for(server: &MockServer, kind: ResourceKind) -> HttpStatusFetcher {
        let client =
            ControlPlaneClient::new(&server.uri(), Duration::from_secs(5)).expect("client builds");
        HttpStatusFetcher::for_kind(client, kind)
    }

    #[tokio::test]
    async fn test_extracts_state_and_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/devEndpoints/dev1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "DevEndpoint": {"Status": "FAILED", "FailureReason": "bad subnet"}
            })))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, ResourceKind::DevEndpoint).await;
        let observation = fetcher.fetch("devEndpoints/dev1").await.expect("ok");

        assert_eq!(observation.state, "FAILED");
        assert_eq!(observation.reason.as_deref(), Some("bad subnet"));
    }

    #[tokio::test]
    async fn test_missing_status_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/triggers/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Trigger": {}})))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, ResourceKind::Trigger).await;
        let err = fetcher.fetch("triggers/t1").await.unwrap_err();
        assert!(err.to_string().contains("/Trigger/State"));
    }

    #[tokio::test]
    async fn test_waits_for_deletion_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/registries/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": "DELETING"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/registries/r1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, ResourceKind::Registry).await;
        let spec = WaitSpec::deletion(["DELETING"])
            .with_poll_interval(Duration::from_millis(10))
            .with_timeout(Duration::from_secs(5));

        let outcome = Waiter::new(spec)
            .wait(&fetcher, "registries/r1")
            .await
            .expect("gone");
        assert_eq!(outcome, WaitOutcome::Gone);
    }

    async fn mount_indexes(server: &MockServer, body: Value) {
        Mock::given(method("GET"))
            .and(path("/tables/db/events/partitionIndexes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn index_fetcher(server: &MockServer, name: &str) -> HttpStatusFetcher {
        let client =
            ControlPlaneClient::new(&server.uri(), Duration::from_secs(5)).expect("client builds");
        HttpStatusFetcher::for_entry(client, ResourceKind::PartitionIndex, name)
    }

    #[tokio::test]
    async fn test_reads_the_named_index_entry() {
        let server = MockServer::start().await;
        mount_indexes(
            &server,
            json!({"PartitionIndexDescriptorList": [
                {"IndexName": "other", "IndexStatus": "ACTIVE"},
                {"IndexName": "by_day", "IndexStatus": "CREATING"},
            ]}),
        )
        .await;

        let fetcher = index_fetcher(&server, "by_day").await;
        let observation = fetcher
            .fetch("tables/db/events/partitionIndexes")
            .await
            .expect("entry present");

        assert_eq!(observation.state, "CREATING");
        assert_eq!(observation.value["IndexName"], "by_day");
    }

    #[tokio::test]
    async fn test_missing_index_entry_is_not_found() {
        let server = MockServer::start().await;
        mount_indexes(
            &server,
            json!({"PartitionIndexDescriptorList": [{"IndexName": "other", "IndexStatus": "ACTIVE"}]}),
        )
        .await;

        let fetcher = index_fetcher(&server, "by_day").await;
        let err = fetcher
            .fetch("tables/db/events/partitionIndexes")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_index_deletion_ends_gone_on_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tables/db/events/partitionIndexes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "PartitionIndexDescriptorList": [{"IndexName": "by_day", "IndexStatus": "DELETING"}]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_indexes(&server, json!({"PartitionIndexDescriptorList": []})).await;

        let fetcher = index_fetcher(&server, "by_day").await;
        let spec = WaitSpec::deletion(["DELETING"])
            .with_poll_interval(Duration::from_millis(10))
            .with_timeout(Duration::from_secs(5));

        let outcome = Waiter::new(spec)
            .wait(&fetcher, "tables/db/events/partitionIndexes")
            .await
            .expect("gone");
        assert_eq!(outcome, WaitOutcome::Gone);
    }
}
