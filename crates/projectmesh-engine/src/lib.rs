//! # projectmesh-engine
//!
//! The convergence engine of the ProjectMesh controller.
//!
//! For every namespace that opts into the mesh (via its capability
//! annotation), the engine computes desired child state - mesh
//! membership, perimeter auth policy, propagated gateway annotations -
//! compares it against observed state in the store, and applies the
//! minimal mutation under optimistic-concurrency contention.
//!
//! ## Guarantees
//!
//! - **Idempotence**: re-running a pass with unchanged inputs is a no-op.
//! - **Conflict safety**: every conditioned write re-reads the latest
//!   revision token and merges only the fields the engine manages, so
//!   concurrent unrelated edits are never lost.
//! - **Partial-failure isolation**: pipelines are independent; a failure
//!   in one never prevents the others from running in the same pass, and
//!   the aggregated result carries every error.
//!
//! The engine does not schedule itself: an external scheduler feeds it
//! namespace keys (pre-filtered through [`filter::should_enqueue`]) and
//! reschedules with backoff when a pass reports failures.

pub mod applier;
pub mod config;
pub mod error;
pub mod filter;
pub mod outcome;
pub mod pipelines;
pub mod runner;

pub use applier::{RetryPolicy, apply, managed_fields_equal, update_with_retry};
pub use config::{ConfigError, MeshEnvConfig};
pub use error::EngineError;
pub use filter::should_enqueue;
pub use outcome::{PipelineOutcome, PipelineReport, ReconcileResult};
pub use pipelines::{
    AuthPolicyKind, ChildKind, ChildResourcePipeline, GatewayAnnotationsPipeline, MeshMemberKind,
    Pipeline,
};
pub use runner::Reconciler;
