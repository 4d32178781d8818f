//! Data types used by the object store traits.

use projectmesh_core::{CoreError, ObjectKind, StoredObject};
use serde::{Deserialize, Serialize};

/// Stable address of an object in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    pub kind: ObjectKind,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: None,
            name: name.into(),
        }
    }

    pub fn namespaced(
        kind: ObjectKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// The key of an already stored object.
    pub fn of(object: &StoredObject) -> Self {
        Self {
            kind: object.kind,
            namespace: object.meta.namespace.clone(),
            name: object.meta.name.clone(),
        }
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind, ns, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

/// Single-equality label selector, the only query form list operations
/// support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelector {
    pub key: String,
    pub value: String,
}

impl LabelSelector {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parses a `key=value` selector. Anything other than exactly one `=`
    /// is rejected.
    pub fn parse(selector: &str) -> Result<Self, CoreError> {
        let mut parts = selector.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) if !key.is_empty() => Ok(Self::new(key, value)),
            _ => Err(CoreError::configuration(format!(
                "expected label selector in key=value format, got [{selector}]"
            ))),
        }
    }

    /// Whether the given object carries this label.
    pub fn matches(&self, object: &StoredObject) -> bool {
        object.label(&self.key) == Some(self.value.as_str())
    }
}

impl std::fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// A change notification from the store, driving the event filter.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// Object was created.
    Created(StoredObject),
    /// Object was updated; both versions are carried so predicates can
    /// compare annotations across the transition.
    Updated {
        old: StoredObject,
        new: StoredObject,
    },
    /// Object was deleted; carries the last known state.
    Deleted(StoredObject),
}

impl WatchEvent {
    /// The current (or last known) object this event refers to.
    pub fn object(&self) -> &StoredObject {
        match self {
            WatchEvent::Created(obj) | WatchEvent::Deleted(obj) => obj,
            WatchEvent::Updated { new, .. } => new,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.object().kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projectmesh_core::ObjectMeta;

    #[test]
    fn test_object_key_display() {
        let key = ObjectKey::namespaced(ObjectKind::MeshMember, "project-a", "default");
        assert_eq!(key.to_string(), "MeshMember/project-a/default");

        let key = ObjectKey::new(ObjectKind::Namespace, "project-a");
        assert_eq!(key.to_string(), "Namespace/project-a");
    }

    #[test]
    fn test_object_key_of() {
        let obj = StoredObject::new(
            ObjectKind::AuthPolicy,
            ObjectMeta::new("project-a-protection").with_namespace("project-a"),
        );
        let key = ObjectKey::of(&obj);
        assert_eq!(key.kind, ObjectKind::AuthPolicy);
        assert_eq!(key.namespace.as_deref(), Some("project-a"));
        assert_eq!(key.name, "project-a-protection");
    }

    #[test]
    fn test_selector_parse() {
        let selector = LabelSelector::parse("authorino/topic=odh").expect("valid selector");
        assert_eq!(selector.key, "authorino/topic");
        assert_eq!(selector.value, "odh");
    }

    #[test]
    fn test_selector_parse_rejects_malformed() {
        assert!(LabelSelector::parse("no-equals").is_err());
        assert!(LabelSelector::parse("a=b=c").is_err());
        assert!(LabelSelector::parse("=value").is_err());
    }

    #[test]
    fn test_selector_matches() {
        let selector = LabelSelector::new("app", "odh-dashboard");
        let matching = StoredObject::new(
            ObjectKind::Route,
            ObjectMeta::new("gw").with_label("app", "odh-dashboard"),
        );
        let other = StoredObject::new(
            ObjectKind::Route,
            ObjectMeta::new("gw").with_label("app", "something-else"),
        );

        assert!(selector.matches(&matching));
        assert!(!selector.matches(&other));
    }

    #[test]
    fn test_watch_event_object() {
        let old = StoredObject::new(ObjectKind::Namespace, ObjectMeta::new("ns"));
        let new = old
            .clone()
            .next_version("2");

        let event = WatchEvent::Updated {
            old,
            new: new.clone(),
        };
        assert_eq!(
            event.object().meta.resource_version,
            new.meta.resource_version
        );
        assert_eq!(event.kind(), ObjectKind::Namespace);
    }
}
