//! Retrying mutations.
//!
//! Mutating calls against the control plane can be rejected for reasons
//! unrelated to the request (IAM propagation, concurrent modification).
//! [`RetryTable`] classifies those errors and [`RetryingMutator`] retries
//! them within a bounded window.

mod mutator;
mod predicate;

pub use mutator::{
    DEFAULT_RETRY_DELAY, IAM_PROPAGATION_TIMEOUT, MutationOp, RetryPolicy, RetryingMutator,
    retrying_call,
};
pub use predicate::{ErrorMatcher, RetryRule, RetryTable, Verdict};
