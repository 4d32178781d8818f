//! Store traits for the object store abstraction layer.

use async_trait::async_trait;
use projectmesh_core::{ObjectKind, StoredObject};

use crate::error::StoreError;
use crate::types::{LabelSelector, ObjectKey};

/// The object store all convergence pipelines run against.
///
/// Backends must be thread-safe (`Send + Sync`). The store owns the
/// optimistic-concurrency tokens: `create` and `update` return the stored
/// object with its fresh `resource_version`, and `update` is conditioned
/// on the token carried by the submitted object.
///
/// # Example
///
/// ```ignore
/// use projectmesh_storage::{ObjectStore, ObjectKey, StoreError};
/// use projectmesh_core::{ObjectKind, StoredObject};
///
/// async fn load_member(store: &dyn ObjectStore, ns: &str) -> Result<StoredObject, StoreError> {
///     let key = ObjectKey::namespaced(ObjectKind::MeshMember, ns, "default");
///     store
///         .get(&key)
///         .await?
///         .ok_or_else(|| StoreError::not_found(ObjectKind::MeshMember, "default"))
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads an object by key.
    ///
    /// Returns `None` if the object does not exist. Absence is a
    /// distinguished result, not an error; errors are reserved for
    /// infrastructure failures.
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StoreError>;

    /// Lists objects of a kind within a namespace matching the selector.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues; an empty result is
    /// a successful empty `Vec`.
    async fn list(
        &self,
        kind: ObjectKind,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<StoredObject>, StoreError>;

    /// Creates a new object.
    ///
    /// The returned object carries the revision token assigned by the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if an object with the same key
    /// exists.
    async fn create(&self, object: &StoredObject) -> Result<StoredObject, StoreError>;

    /// Updates an existing object, conditioned on its revision token.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the object does not exist.
    /// Returns `StoreError::VersionConflict` if the submitted token does
    /// not match the stored one.
    async fn update(&self, object: &StoredObject) -> Result<StoredObject, StoreError>;

    /// Returns the name of this store backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
