//! Gateway annotation propagation.
//!
//! Runs before the child-resource pipelines: it resolves the public
//! gateway route and records its identity and hosts as annotations on the
//! parent namespace, which the auth-policy pipeline then consumes within
//! the same pass.

use async_trait::async_trait;
use projectmesh_core::metadata::{
    ANNOTATION_PUBLIC_GATEWAY_EXTERNAL_HOST, ANNOTATION_PUBLIC_GATEWAY_INTERNAL_HOST,
    ANNOTATION_PUBLIC_GATEWAY_NAME, LABEL_GATEWAY_NAME, LABEL_GATEWAY_NAMESPACE,
};
use projectmesh_core::{ObjectKind, StoredObject, normalize_host};
use projectmesh_storage::{LabelSelector, ObjectKey, ObjectStore};
use tracing::info;

use crate::applier::{RetryPolicy, update_with_retry};
use crate::config::MeshEnvConfig;
use crate::error::EngineError;
use crate::outcome::PipelineOutcome;
use crate::pipelines::Pipeline;

/// Fixed selector identifying the public gateway route in the mesh
/// namespace.
const GATEWAY_ROUTE_LABEL: (&str, &str) = ("app", "odh-dashboard");

/// Derives gateway facts from the routing layer and writes them back onto
/// the parent's annotations, idempotently.
pub struct GatewayAnnotationsPipeline {
    retry: RetryPolicy,
}

impl GatewayAnnotationsPipeline {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }
}

#[async_trait]
impl Pipeline for GatewayAnnotationsPipeline {
    fn name(&self) -> &'static str {
        "gateway-annotations"
    }

    async fn run(
        &self,
        store: &dyn ObjectStore,
        parent: &StoredObject,
        config: &MeshEnvConfig,
    ) -> Result<PipelineOutcome, EngineError> {
        if annotations_populated(parent) {
            return Ok(PipelineOutcome::Unchanged);
        }

        let selector = LabelSelector::new(GATEWAY_ROUTE_LABEL.0, GATEWAY_ROUTE_LABEL.1);
        let routes = store
            .list(ObjectKind::Route, &config.mesh_namespace, &selector)
            .await?;
        let route = routes.first().ok_or_else(|| EngineError::GatewayNotFound {
            namespace: config.mesh_namespace.clone(),
            selector: selector.to_string(),
        })?;

        let external_host = route
            .spec
            .get("host")
            .and_then(|host| host.as_str())
            .filter(|host| !host.is_empty())
            .map(normalize_host)
            .ok_or_else(|| {
                EngineError::malformed_input(format!(
                    "gateway route {} has no spec.host",
                    route.meta.name
                ))
            })?;

        let service = route
            .spec
            .pointer("/to/name")
            .and_then(|name| name.as_str())
            .ok_or_else(|| {
                EngineError::malformed_input(format!(
                    "gateway route {} has no spec.to.name",
                    route.meta.name
                ))
            })?;
        let internal_host = format!("{service}.{}.svc.cluster.local", config.mesh_namespace);

        let gateway_identity = extract_gateway_identity(route);

        // A route without the identity labels never satisfies the
        // all-populated fast path; compare the merged values instead so
        // repeated passes stay write-free.
        let already_converged = parent.annotation(ANNOTATION_PUBLIC_GATEWAY_EXTERNAL_HOST)
            == Some(external_host.as_str())
            && parent.annotation(ANNOTATION_PUBLIC_GATEWAY_INTERNAL_HOST)
                == Some(internal_host.as_str())
            && gateway_identity
                .as_deref()
                .is_none_or(|id| parent.annotation(ANNOTATION_PUBLIC_GATEWAY_NAME) == Some(id));
        if already_converged {
            return Ok(PipelineOutcome::Unchanged);
        }

        info!(
            namespace = %parent.meta.name,
            external_host = %external_host,
            "propagating gateway annotations"
        );

        let parent_key = ObjectKey::new(ObjectKind::Namespace, parent.meta.name.clone());
        update_with_retry(
            store,
            &parent_key,
            |ns| {
                ns.set_annotation(ANNOTATION_PUBLIC_GATEWAY_EXTERNAL_HOST, &external_host);
                ns.set_annotation(ANNOTATION_PUBLIC_GATEWAY_INTERNAL_HOST, &internal_host);
                if let Some(identity) = &gateway_identity {
                    ns.set_annotation(ANNOTATION_PUBLIC_GATEWAY_NAME, identity);
                }
            },
            &self.retry,
        )
        .await?;

        Ok(PipelineOutcome::Updated)
    }
}

fn annotations_populated(parent: &StoredObject) -> bool {
    [
        ANNOTATION_PUBLIC_GATEWAY_EXTERNAL_HOST,
        ANNOTATION_PUBLIC_GATEWAY_INTERNAL_HOST,
        ANNOTATION_PUBLIC_GATEWAY_NAME,
    ]
    .iter()
    .all(|key| parent.annotation(key).is_some_and(|value| !value.is_empty()))
}

/// Gateway identity in `name` or `namespace/name` form, from the labels
/// on the route. Absent name label means no identity to record.
fn extract_gateway_identity(route: &StoredObject) -> Option<String> {
    let name = route.label(LABEL_GATEWAY_NAME).filter(|n| !n.is_empty())?;
    match route.label(LABEL_GATEWAY_NAMESPACE).filter(|ns| !ns.is_empty()) {
        Some(namespace) => Some(format!("{namespace}/{name}")),
        None => Some(name.to_string()),
    }
}
