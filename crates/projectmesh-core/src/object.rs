use crate::metadata::ANNOTATION_SERVICE_MESH;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Kinds of objects the controller reads or manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// The parent organizational resource carrying opt-in intent.
    Namespace,
    /// Mesh membership child, one per enrolled namespace.
    MeshMember,
    /// Perimeter authorization child, one per enrolled namespace.
    AuthPolicy,
    /// External routing resource consumed by annotation propagation.
    Route,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Namespace => "Namespace",
            ObjectKind::MeshMember => "MeshMember",
            ObjectKind::AuthPolicy => "AuthPolicy",
            ObjectKind::Route => "Route",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Object metadata shared by every stored object.
///
/// `resource_version` is the optimistic-concurrency token. It is owned by
/// the store: the engine carries it through read-modify-write cycles but
/// never fabricates or mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(rename = "resourceVersion", skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

/// An object as held in the store: kind, metadata, and a kind-specific
/// spec payload. The engine is the sole writer of the spec and of the
/// labels it manages; timestamps and the revision token belong to the
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub meta: ObjectMeta,
    #[serde(default)]
    pub spec: Value,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "lastUpdated", with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, meta: ObjectMeta) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            kind,
            meta,
            spec: Value::Null,
            created_at: now,
            last_updated: now,
        }
    }

    pub fn with_spec(mut self, spec: Value) -> Self {
        self.spec = spec;
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.meta.annotations.get(key).map(String::as_str)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.meta.labels.get(key).map(String::as_str)
    }

    pub fn set_annotation(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.annotations.insert(key.into(), value.into());
    }

    /// Creates the next version of this object with a fresh revision token
    /// and updated timestamp. Used by store backends on write.
    pub fn next_version(&self, resource_version: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.meta.resource_version = Some(resource_version.into());
        next.last_updated = OffsetDateTime::now_utc();
        next
    }
}

/// Returns `true` when the mesh opt-in annotation is present and parses as
/// boolean true. Absent, empty, or unparsable values count as disabled.
pub fn mesh_enabled(annotations: &BTreeMap<String, String>) -> bool {
    annotations
        .get(ANNOTATION_SERVICE_MESH)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "t" | "true"))
        .unwrap_or(false)
}
