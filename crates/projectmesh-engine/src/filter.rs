//! Event filter deciding which namespace changes schedule a pass.
//!
//! Evaluated synchronously on the store's notification stream, before any
//! work is enqueued. Pure predicates, no I/O.

use projectmesh_core::metadata::ANNOTATION_SERVICE_MESH;
use projectmesh_core::{StoredObject, is_reserved_namespace};
use projectmesh_storage::WatchEvent;

/// Whether a namespace change event warrants a reconciliation pass.
///
/// True for non-reserved namespaces carrying the opt-in annotation, and
/// additionally for updates where the annotation was just removed - the
/// engine gets one more pass to react to the opt-out.
pub fn should_enqueue(event: &WatchEvent) -> bool {
    match event {
        WatchEvent::Updated { old, new } => {
            if annotation_removed(old, new, ANNOTATION_SERVICE_MESH) {
                return true;
            }
            mesh_relevant(new)
        }
        WatchEvent::Created(obj) | WatchEvent::Deleted(obj) => mesh_relevant(obj),
    }
}

fn mesh_relevant(obj: &StoredObject) -> bool {
    !is_reserved_namespace(&obj.meta.name)
        && obj
            .annotation(ANNOTATION_SERVICE_MESH)
            .is_some_and(|value| !value.is_empty())
}

/// Whether the given annotation existed on the old version and is gone
/// from the new one.
pub fn annotation_removed(old: &StoredObject, new: &StoredObject, key: &str) -> bool {
    old.annotation(key).is_some() && new.annotation(key).is_none()
}
