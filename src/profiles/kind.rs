//! Resource kinds and lifecycle operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Catalog resource kinds with asynchronous lifecycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Development endpoint.
    DevEndpoint,
    /// Job trigger.
    Trigger,
    /// Schema registry.
    Registry,
    /// Registry schema.
    Schema,
    /// Schema version.
    SchemaVersion,
    /// Table partition index.
    PartitionIndex,
    /// Machine learning transform.
    MlTransform,
    /// Crawler.
    Crawler,
}

impl ResourceKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 8] = [
        Self::DevEndpoint,
        Self::Trigger,
        Self::Registry,
        Self::Schema,
        Self::SchemaVersion,
        Self::PartitionIndex,
        Self::MlTransform,
        Self::Crawler,
    ];

    /// Configuration key of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DevEndpoint => "dev_endpoint",
            Self::Trigger => "trigger",
            Self::Registry => "registry",
            Self::Schema => "schema",
            Self::SchemaVersion => "schema_version",
            Self::PartitionIndex => "partition_index",
            Self::MlTransform => "ml_transform",
            Self::Crawler => "crawler",
        }
    }

    /// Name used by the control plane in error messages.
    #[must_use]
    pub const fn api_name(self) -> &'static str {
        match self {
            Self::DevEndpoint => "DevEndpoint",
            Self::Trigger => "Trigger",
            Self::Registry => "Registry",
            Self::Schema => "Schema",
            Self::SchemaVersion => "SchemaVersion",
            Self::PartitionIndex => "PartitionIndex",
            Self::MlTransform => "MLTransform",
            Self::Crawler => "Crawler",
        }
    }

    /// JSON pointer to the lifecycle state in a describe response. For
    /// kinds with an [`entry_list`](Self::entry_list) the pointer is
    /// relative to the selected entry.
    #[must_use]
    pub const fn status_pointer(self) -> &'static str {
        match self {
            Self::DevEndpoint => "/DevEndpoint/Status",
            Self::Trigger => "/Trigger/State",
            Self::Registry | Self::SchemaVersion | Self::MlTransform => "/Status",
            Self::Schema => "/SchemaStatus",
            Self::PartitionIndex => "/IndexStatus",
            Self::Crawler => "/Crawler/State",
        }
    }

    /// JSON pointer to the failure reason, for kinds that report one.
    #[must_use]
    pub const fn reason_pointer(self) -> Option<&'static str> {
        match self {
            Self::DevEndpoint => Some("/DevEndpoint/FailureReason"),
            Self::Crawler => Some("/Crawler/LastCrawl/ErrorMessage"),
            _ => None,
        }
    }

    /// List pointer and name field for kinds described as one entry of a
    /// list on their parent.
    #[must_use]
    pub const fn entry_list(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::PartitionIndex => Some(("/PartitionIndexDescriptorList", "IndexName")),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownKind {
                name: s.to_string(),
            })
    }
}

/// Lifecycle operation on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Create the resource.
    Create,
    /// Update the resource in place.
    Update,
    /// Delete the resource.
    Delete,
}

impl Operation {
    /// All operations.
    pub const ALL: [Self; 3] = [Self::Create, Self::Update, Self::Delete];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for Operation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" | "destroy" => Ok(Self::Delete),
            _ => Err(ConfigError::UnknownOperation {
                name: s.to_string(),
            }),
        }
    }
}
