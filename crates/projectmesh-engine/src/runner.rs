//! Pipeline runner: one reconciliation pass for one parent namespace.

use projectmesh_core::{ObjectKind, StoredObject, is_reserved_namespace, mesh_enabled};
use projectmesh_storage::{DynStore, ObjectKey};
use tracing::{info, warn};

use crate::applier::RetryPolicy;
use crate::config::MeshEnvConfig;
use crate::error::EngineError;
use crate::outcome::{PipelineOutcome, ReconcileResult};
use crate::pipelines::{
    AuthPolicyKind, ChildResourcePipeline, GatewayAnnotationsPipeline, MeshMemberKind, Pipeline,
};

/// Runs the ordered pipeline list for a parent namespace and aggregates
/// their outcomes.
///
/// The external scheduler guarantees that no two passes for the same
/// namespace run concurrently; within a pass, pipelines run sequentially
/// so the gateway annotation writes are visible to later pipelines.
pub struct Reconciler {
    store: DynStore,
    config: MeshEnvConfig,
    pipelines: Vec<Box<dyn Pipeline>>,
}

impl Reconciler {
    pub fn new(store: DynStore, config: MeshEnvConfig) -> Self {
        Self::with_retry(store, config, RetryPolicy::default())
    }

    /// Builds the runner with an explicit retry policy, shared by every
    /// pipeline's conditioned writes.
    pub fn with_retry(store: DynStore, config: MeshEnvConfig, retry: RetryPolicy) -> Self {
        // Annotation propagation first: auth-policy reads what it writes.
        let pipelines: Vec<Box<dyn Pipeline>> = vec![
            Box::new(GatewayAnnotationsPipeline::new(retry.clone())),
            Box::new(ChildResourcePipeline::new(MeshMemberKind, retry.clone())),
            Box::new(ChildResourcePipeline::new(AuthPolicyKind, retry)),
        ];
        Self {
            store,
            config,
            pipelines,
        }
    }

    /// Executes one pass for the named namespace.
    ///
    /// A missing parent is an empty success - it was deleted between
    /// notification and processing. A failure to load the parent aborts
    /// the pass with an error (nothing ran; the scheduler retries).
    /// Pipeline failures never abort siblings: they are folded into the
    /// result, and the scheduler reschedules when the aggregate reports
    /// failures.
    pub async fn reconcile(&self, namespace: &str) -> Result<ReconcileResult, EngineError> {
        let key = ObjectKey::new(ObjectKind::Namespace, namespace);
        let Some(parent) = self.store.get(&key).await? else {
            info!(namespace, "namespace gone, stopping reconciliation");
            return Ok(ReconcileResult::empty());
        };

        if !self.eligible(&parent) {
            let mut result = ReconcileResult::empty();
            for pipeline in &self.pipelines {
                result.push(
                    pipeline.name(),
                    PipelineOutcome::Skipped("namespace not enrolled in the mesh"),
                );
            }
            return Ok(result);
        }

        let mut result = ReconcileResult::empty();
        for pipeline in &self.pipelines {
            // Re-load so later pipelines see annotations written earlier
            // in the same pass. A re-load failure costs only this
            // pipeline; already-collected outcomes are kept.
            let outcome = match self.store.get(&key).await {
                Ok(Some(parent)) => {
                    match pipeline
                        .run(self.store.as_ref(), &parent, &self.config)
                        .await
                    {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            warn!(namespace, pipeline = pipeline.name(), error = %err, "pipeline failed");
                            PipelineOutcome::Failed(err)
                        }
                    }
                }
                Ok(None) => {
                    info!(namespace, "namespace gone mid-pass, stopping reconciliation");
                    return Ok(result);
                }
                Err(err) => {
                    warn!(namespace, pipeline = pipeline.name(), error = %err, "parent re-load failed");
                    PipelineOutcome::Failed(err.into())
                }
            };
            info!(namespace, pipeline = pipeline.name(), outcome = outcome.as_str(), "pipeline done");
            result.push(pipeline.name(), outcome);
        }

        Ok(result)
    }

    fn eligible(&self, parent: &StoredObject) -> bool {
        !is_reserved_namespace(&parent.meta.name) && mesh_enabled(&parent.meta.annotations)
    }
}
