//! # projectmesh-storage
//!
//! Object store abstraction for the ProjectMesh controller.
//!
//! This crate defines the traits and types the convergence engine runs
//! against. It does not contain any implementations - those are provided
//! by separate crates.
//!
//! ## Overview
//!
//! The main trait is [`ObjectStore`], which defines the contract for:
//! - keyed reads with distinguished absence
//! - label-selector list queries
//! - create with duplicate detection
//! - update conditioned on an optimistic-concurrency token
//!
//! Change notifications are surfaced as [`WatchEvent`] values by backends
//! that support watching; the engine's event filter consumes them.

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StoreError};
pub use traits::ObjectStore;
pub use types::{LabelSelector, ObjectKey, WatchEvent};

/// Type alias for a store result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Type alias for a shared store trait object.
pub type DynStore = std::sync::Arc<dyn ObjectStore>;
