//! # projectmesh-db-memory
//!
//! In-memory [`projectmesh_storage::ObjectStore`] backend.
//!
//! Objects live in a lock-free papaya map keyed by `Kind/namespace/name`;
//! a monotonic counter stamps revision tokens on every write, and updates
//! are compare-and-swap on that token. Every mutation is broadcast as a
//! [`projectmesh_storage::WatchEvent`] to subscribers.

mod store;

pub use store::InMemoryStore;
