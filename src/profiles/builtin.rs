//! Built-in wait specs and retry tables for each resource kind.

use std::time::Duration;

use crate::retry::{IAM_PROPAGATION_TIMEOUT, RetryPolicy, RetryTable};
use crate::waiter::WaitSpec;

use super::kind::ResourceKind;
use super::registry::{OperationProfile, ResourceProfile};

const INVALID_INPUT: &str = "InvalidInputException";
const CONCURRENT_MODIFICATION: &str = "ConcurrentModificationException";

const DEV_ENDPOINT_TIMEOUT: Duration = Duration::from_secs(15 * 60);
const DEV_ENDPOINT_POLL: Duration = Duration::from_secs(15);
const TRIGGER_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const REGISTRY_TIMEOUT: Duration = Duration::from_secs(2 * 60);
const SCHEMA_TIMEOUT: Duration = Duration::from_secs(2 * 60);
const PARTITION_INDEX_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const ML_TRANSFORM_TIMEOUT: Duration = Duration::from_secs(2 * 60);
const SHORT_POLL: Duration = Duration::from_secs(2);
const CONCURRENCY_WINDOW: Duration = Duration::from_secs(2 * 60);

/// Returns the built-in profile for a kind.
#[must_use]
pub fn builtin_profile(kind: ResourceKind) -> ResourceProfile {
    match kind {
        ResourceKind::DevEndpoint => dev_endpoint(),
        ResourceKind::Trigger => trigger(),
        ResourceKind::Registry => registry(),
        ResourceKind::Schema => schema(),
        ResourceKind::SchemaVersion => schema_version(),
        ResourceKind::PartitionIndex => partition_index(),
        ResourceKind::MlTransform => ml_transform(),
        ResourceKind::Crawler => crawler(),
    }
}

fn iam_retry(messages: &[&str]) -> RetryPolicy {
    let table = messages
        .iter()
        .fold(RetryTable::new(), |table, message| {
            table.retry_on_message(INVALID_INPUT, message)
        });
    RetryPolicy::new(IAM_PROPAGATION_TIMEOUT, table)
}

fn concurrency_retry() -> RetryPolicy {
    RetryPolicy::new(
        CONCURRENCY_WINDOW,
        RetryTable::new().retry_on_code(CONCURRENT_MODIFICATION),
    )
}

fn dev_endpoint() -> ResourceProfile {
    let retry = iam_retry(&[
        "should be given assume role permissions for Glue Service",
        "is not authorized to perform",
        "S3 endpoint and NAT validation has failed for subnetId",
    ]);

    ResourceProfile::new(ResourceKind::DevEndpoint)
        .with_create(OperationProfile::new(
            Some(
                WaitSpec::new(["PROVISIONING"], ["READY"])
                    .with_poll_interval(DEV_ENDPOINT_POLL)
                    .with_timeout(DEV_ENDPOINT_TIMEOUT),
            ),
            retry.clone(),
        ))
        .with_update(OperationProfile::new(None, retry))
        .with_delete(OperationProfile::new(
            Some(
                WaitSpec::deletion(["TERMINATING"])
                    .with_poll_interval(DEV_ENDPOINT_POLL)
                    .with_timeout(DEV_ENDPOINT_TIMEOUT),
            ),
            RetryPolicy::never(),
        ))
}

fn trigger() -> ResourceProfile {
    ResourceProfile::new(ResourceKind::Trigger)
        .with_create(OperationProfile::new(
            Some(
                WaitSpec::new(["CREATING", "ACTIVATING", "UPDATING"], ["CREATED", "ACTIVATED"])
                    .with_timeout(TRIGGER_TIMEOUT),
            ),
            iam_retry(&["Service is unable to assume provided role"]),
        ))
        .with_update(OperationProfile::new(
            Some(
                WaitSpec::new(
                    ["UPDATING", "ACTIVATING", "DEACTIVATING"],
                    ["CREATED", "ACTIVATED", "DEACTIVATED"],
                )
                .with_timeout(TRIGGER_TIMEOUT),
            ),
            concurrency_retry(),
        ))
        .with_delete(OperationProfile::new(
            Some(WaitSpec::deletion(["DELETING"]).with_timeout(TRIGGER_TIMEOUT)),
            concurrency_retry(),
        ))
}

fn registry() -> ResourceProfile {
    ResourceProfile::new(ResourceKind::Registry).with_delete(OperationProfile::new(
        Some(
            WaitSpec::deletion(["DELETING"])
                .with_poll_interval(SHORT_POLL)
                .with_timeout(REGISTRY_TIMEOUT),
        ),
        RetryPolicy::never(),
    ))
}

fn schema_available() -> WaitSpec {
    WaitSpec::new(["PENDING"], ["AVAILABLE"])
        .with_poll_interval(SHORT_POLL)
        .with_timeout(SCHEMA_TIMEOUT)
}

fn schema() -> ResourceProfile {
    ResourceProfile::new(ResourceKind::Schema)
        .with_create(OperationProfile::new(
            Some(schema_available()),
            RetryPolicy::never(),
        ))
        .with_update(OperationProfile::new(
            Some(schema_available()),
            RetryPolicy::never(),
        ))
        .with_delete(OperationProfile::new(
            Some(
                WaitSpec::deletion(["DELETING"])
                    .with_poll_interval(SHORT_POLL)
                    .with_timeout(SCHEMA_TIMEOUT),
            ),
            RetryPolicy::never(),
        ))
}

fn schema_version() -> ResourceProfile {
    ResourceProfile::new(ResourceKind::SchemaVersion).with_create(OperationProfile::new(
        Some(schema_available()),
        RetryPolicy::never(),
    ))
}

fn partition_index() -> ResourceProfile {
    ResourceProfile::new(ResourceKind::PartitionIndex)
        .with_create(OperationProfile::new(
            Some(WaitSpec::new(["CREATING"], ["ACTIVE"]).with_timeout(PARTITION_INDEX_TIMEOUT)),
            concurrency_retry(),
        ))
        .with_delete(OperationProfile::new(
            Some(WaitSpec::deletion(["DELETING"]).with_timeout(PARTITION_INDEX_TIMEOUT)),
            RetryPolicy::never(),
        ))
}

fn ml_transform() -> ResourceProfile {
    ResourceProfile::new(ResourceKind::MlTransform)
        .with_create(OperationProfile::new(
            None,
            iam_retry(&["Unable to assume role"]),
        ))
        .with_delete(OperationProfile::new(
            Some(
                WaitSpec::deletion(["NOT_READY", "READY", "DELETING"])
                    .with_poll_interval(SHORT_POLL)
                    .with_timeout(ML_TRANSFORM_TIMEOUT),
            ),
            RetryPolicy::never(),
        ))
}

fn crawler() -> ResourceProfile {
    let retry = iam_retry(&[
        "Service is unable to assume role",
        "Please ensure that your IAM role has",
        "Insufficient Lake Formation permission",
        "SQS queue arn",
    ]);

    ResourceProfile::new(ResourceKind::Crawler)
        .with_create(OperationProfile::new(None, retry.clone()))
        .with_update(OperationProfile::new(None, retry))
}
