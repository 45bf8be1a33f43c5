//! Resource-kind profiles.
//!
//! Each resource kind differs only in its states, timeouts and transient
//! error tables. Profiles carry those as data so the waiter and the
//! retrying mutator stay free of resource-specific knowledge.

mod builtin;
mod kind;
mod registry;

pub use builtin::builtin_profile;
pub use kind::{Operation, ResourceKind};
pub use registry::{OperationProfile, ProfileRegistry, ResourceProfile};
