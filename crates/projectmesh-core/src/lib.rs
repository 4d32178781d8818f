//! # projectmesh-core
//!
//! Core domain model for the ProjectMesh controller.
//!
//! This crate holds the stored-object envelope shared by the storage layer
//! and the convergence engine, the managed annotation/label key constants
//! other systems rely on, and the pure string predicates (host
//! normalization, reserved-namespace check) used across pipelines.
//!
//! It performs no I/O and has no async surface.

pub mod error;
pub mod host;
pub mod metadata;
pub mod object;
pub mod reserved;

pub use error::{CoreError, Result};
pub use host::normalize_host;
pub use object::{ObjectKind, ObjectMeta, StoredObject, mesh_enabled};
pub use reserved::is_reserved_namespace;
