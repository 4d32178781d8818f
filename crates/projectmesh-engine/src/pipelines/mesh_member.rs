//! Mesh membership pipeline.

use projectmesh_core::metadata::LABEL_PROJECT;
use projectmesh_core::{ObjectKind, ObjectMeta, StoredObject};
use serde_json::json;

use crate::config::MeshEnvConfig;
use crate::error::EngineError;
use crate::pipelines::ChildKind;

/// Singleton membership child enrolling the namespace in the mesh.
pub struct MeshMemberKind;

impl ChildKind for MeshMemberKind {
    fn pipeline_name(&self) -> &'static str {
        "mesh-member"
    }

    fn compute(
        &self,
        parent: &StoredObject,
        config: &MeshEnvConfig,
    ) -> Result<Option<StoredObject>, EngineError> {
        let project = &parent.meta.name;
        // The member name must be "default", per the mesh membership
        // convention; one member per enrolled namespace.
        let member = StoredObject::new(
            ObjectKind::MeshMember,
            ObjectMeta::new("default")
                .with_namespace(project)
                .with_label(LABEL_PROJECT, project),
        )
        .with_spec(json!({
            "controlPlaneRef": {
                "name": config.control_plane,
                "namespace": config.mesh_namespace,
            }
        }));

        Ok(Some(member))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MeshEnvConfig {
        MeshEnvConfig::from_lookup(|_| None).expect("defaults are valid")
    }

    fn parent(name: &str) -> StoredObject {
        StoredObject::new(ObjectKind::Namespace, ObjectMeta::new(name))
    }

    #[test]
    fn test_compute_is_deterministic() {
        let kind = MeshMemberKind;
        let first = kind.compute(&parent("project-a"), &config()).unwrap().unwrap();
        let second = kind.compute(&parent("project-a"), &config()).unwrap().unwrap();

        assert_eq!(first.meta, second.meta);
        assert_eq!(first.spec, second.spec);
    }

    #[test]
    fn test_desired_member_shape() {
        let member = MeshMemberKind
            .compute(&parent("project-a"), &config())
            .unwrap()
            .unwrap();

        assert_eq!(member.kind, ObjectKind::MeshMember);
        assert_eq!(member.meta.name, "default");
        assert_eq!(member.meta.namespace.as_deref(), Some("project-a"));
        assert_eq!(member.label(LABEL_PROJECT), Some("project-a"));
        assert_eq!(member.spec["controlPlaneRef"]["name"], "basic");
        assert_eq!(member.spec["controlPlaneRef"]["namespace"], "istio-system");
    }

    #[test]
    fn test_control_plane_comes_from_config() {
        let config = MeshEnvConfig::from_lookup(|key| match key {
            crate::config::CONTROL_PLANE_ENV => Some("prod-plane".to_string()),
            crate::config::MESH_NAMESPACE_ENV => Some("mesh-system".to_string()),
            _ => None,
        })
        .expect("valid");

        let member = MeshMemberKind
            .compute(&parent("project-a"), &config)
            .unwrap()
            .unwrap();
        assert_eq!(member.spec["controlPlaneRef"]["name"], "prod-plane");
        assert_eq!(member.spec["controlPlaneRef"]["namespace"], "mesh-system");
    }
}
