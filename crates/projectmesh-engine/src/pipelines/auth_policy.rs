//! Perimeter authorization pipeline.

use projectmesh_core::metadata::ANNOTATION_PUBLIC_GATEWAY_EXTERNAL_HOST;
use projectmesh_core::{ObjectKind, ObjectMeta, StoredObject, normalize_host};
use serde_json::json;

use crate::config::MeshEnvConfig;
use crate::error::EngineError;
use crate::pipelines::ChildKind;

/// Auth-policy child protecting the namespace's public endpoints.
///
/// Depends on the gateway-host annotation populated by the annotation
/// propagation pipeline; until that has run, the kind is not applicable.
pub struct AuthPolicyKind;

impl ChildKind for AuthPolicyKind {
    fn pipeline_name(&self) -> &'static str {
        "auth-policy"
    }

    fn compute(
        &self,
        parent: &StoredObject,
        config: &MeshEnvConfig,
    ) -> Result<Option<StoredObject>, EngineError> {
        let raw_host = match parent.annotation(ANNOTATION_PUBLIC_GATEWAY_EXTERNAL_HOST) {
            None | Some("") => return Ok(None),
            Some(host) => host,
        };

        let host = normalize_host(raw_host);
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(EngineError::malformed_input(format!(
                "gateway host annotation is not a valid host: [{raw_host}]"
            )));
        }

        let mut hosts = vec![host];
        hosts.sort();

        let project = &parent.meta.name;
        let policy = StoredObject::new(
            ObjectKind::AuthPolicy,
            ObjectMeta::new(format!("{project}-protection"))
                .with_namespace(project)
                .with_label(&config.auth_label.key, &config.auth_label.value),
        )
        .with_spec(json!({
            "hosts": hosts,
            "identity": [{
                "name": "authorized-service-accounts",
                "kubernetesAuth": {
                    "audiences": config.auth_audiences,
                }
            }],
            "authorization": [{
                "name": "k8s-rbac",
                "kubernetesAuthz": {
                    "user": {
                        "valueFrom": {"authJSON": "auth.identity.username"}
                    }
                }
            }],
            "response": [{
                "name": "x-auth-data",
                "json": {
                    "properties": [{
                        "name": "username",
                        "valueFrom": {"authJSON": "auth.identity.username"}
                    }]
                }
            }],
            "denyWith": {
                "unauthorized": {
                    "message": {"value": "Authorino Denied"}
                }
            }
        }));

        Ok(Some(policy))
    }
}
