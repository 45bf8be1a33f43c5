// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Glue Lifecycle
//!
//! Operation waiters and retryable mutations for eventually-consistent
//! catalog control planes.
//!
//! ## Overview
//!
//! Creating, updating or deleting a catalog resource returns before the
//! change is applied. This crate provides the pieces to drive such an
//! operation to a settled state:
//!
//! - Poll a resource until it leaves its transitional states
//! - Retry mutations rejected for transient reasons, such as IAM
//!   propagation or concurrent modification, within a bounded window
//! - Pack multi-part keys into opaque identifiers and back
//!
//! ## Architecture
//!
//! 1. **Waiter**: polls a [`waiter::StatusFetcher`] against a [`waiter::WaitSpec`]
//! 2. **Retrying mutator**: classifies errors with a [`retry::RetryTable`]
//! 3. **Profiles**: per-kind wait specs and retry tables, overridable in
//!    `glue-lifecycle.yaml`
//! 4. **Converger**: a retried mutation followed by the matching wait
//!
//! ## Modules
//!
//! - [`waiter`]: Polling loop and wait specs
//! - [`retry`]: Error classification and retrying calls
//! - [`identifier`]: Composite identifier codec
//! - [`profiles`]: Built-in resource profiles
//! - [`config`]: Configuration parsing and validation
//! - [`remote`]: HTTP control-plane adapters
//! - [`converge`]: Mutation plus wait orchestration
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! remote:
//!   endpoint: https://glue.eu-west-1.amazonaws.com
//!
//! profiles:
//!   dev_endpoint:
//!     create:
//!       wait:
//!         pending: [PROVISIONING]
//!         target: [READY]
//!         poll_interval_secs: 15
//!         timeout_secs: 1200
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod converge;
pub mod error;
pub mod identifier;
pub mod profiles;
pub mod remote;
pub mod retry;
pub mod waiter;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{ConfigParser, ConfigValidator, LifecycleConfig};
pub use converge::{ConvergeReport, Converger};
pub use error::{LifecycleError, Result};
pub use identifier::{CompositeId, DatabaseId, PartitionId, PartitionIndexId, TableId};
pub use profiles::{Operation, ProfileRegistry, ResourceKind, ResourceProfile};
pub use retry::{MutationOp, RetryPolicy, RetryTable, retrying_call};
pub use waiter::{StatusFetcher, WaitOutcome, WaitSpec, Waiter};
