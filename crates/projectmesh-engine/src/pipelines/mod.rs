//! Convergence pipelines, one per managed capability.
//!
//! Child-resource pipelines share the {compute, fetch, equivalent, apply}
//! shape through [`ChildKind`] and the generic [`ChildResourcePipeline`]
//! adapter; the gateway annotation pipeline mutates the parent itself and
//! implements [`Pipeline`] directly.

mod auth_policy;
mod gateway_annotations;
mod mesh_member;

pub use auth_policy::AuthPolicyKind;
pub use gateway_annotations::GatewayAnnotationsPipeline;
pub use mesh_member::MeshMemberKind;

use async_trait::async_trait;
use projectmesh_core::StoredObject;
use projectmesh_storage::ObjectStore;

use crate::applier::{RetryPolicy, apply, managed_fields_equal};
use crate::config::MeshEnvConfig;
use crate::error::EngineError;
use crate::outcome::PipelineOutcome;

/// One independent convergence pipeline run per pass.
///
/// Pipelines never abort siblings: the runner catches their errors and
/// folds them into `Failed` outcomes.
#[async_trait]
pub trait Pipeline: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        store: &dyn ObjectStore,
        parent: &StoredObject,
        config: &MeshEnvConfig,
    ) -> Result<PipelineOutcome, EngineError>;
}

/// A child resource kind the engine manages.
///
/// `compute` must be a pure function of the parent and the process
/// configuration: identical inputs yield identical output, list-valued
/// fields normalized. `None` means the kind is not applicable to this
/// parent yet (a precondition annotation is absent), which the pipeline
/// reports as `Skipped`.
pub trait ChildKind: Send + Sync {
    fn pipeline_name(&self) -> &'static str;

    fn compute(
        &self,
        parent: &StoredObject,
        config: &MeshEnvConfig,
    ) -> Result<Option<StoredObject>, EngineError>;

    /// Whether observed state already satisfies desired state. The default
    /// compares the managed fields only.
    fn equivalent(&self, observed: &StoredObject, desired: &StoredObject) -> bool {
        managed_fields_equal(observed, desired)
    }
}

/// Adapts any [`ChildKind`] to a [`Pipeline`] through the conflict-safe
/// applier.
pub struct ChildResourcePipeline<K: ChildKind> {
    kind: K,
    retry: RetryPolicy,
}

impl<K: ChildKind> ChildResourcePipeline<K> {
    pub fn new(kind: K, retry: RetryPolicy) -> Self {
        Self { kind, retry }
    }
}

#[async_trait]
impl<K: ChildKind> Pipeline for ChildResourcePipeline<K> {
    fn name(&self) -> &'static str {
        self.kind.pipeline_name()
    }

    async fn run(
        &self,
        store: &dyn ObjectStore,
        parent: &StoredObject,
        config: &MeshEnvConfig,
    ) -> Result<PipelineOutcome, EngineError> {
        let Some(desired) = self.kind.compute(parent, config)? else {
            return Ok(PipelineOutcome::Skipped("precondition annotation absent"));
        };

        let equivalent = |observed: &StoredObject, desired: &StoredObject| {
            self.kind.equivalent(observed, desired)
        };
        apply(store, &desired, &equivalent, &self.retry).await
    }
}
