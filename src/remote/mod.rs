//! HTTP adapters for the control plane.
//!
//! Provides the concrete [`crate::waiter::StatusFetcher`] and
//! [`crate::retry::MutationOp`] used by the command line.

mod client;
mod fetcher;
mod mutation;

pub use client::{ControlPlaneClient, ENTITY_NOT_FOUND};
pub use fetcher::{EntrySelector, HttpStatusFetcher};
pub use mutation::HttpMutation;
