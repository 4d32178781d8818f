//! Error taxonomy of the convergence engine.

use projectmesh_storage::StoreError;
use thiserror::Error;

/// Errors a pipeline can surface during one reconciliation pass.
///
/// Store failures are transient: the pass reports them and the scheduler
/// re-invokes the whole pass later. Malformed input is not retried locally
/// either - it resolves once the parent resource is corrected.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A read, list, or write against the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The parent resource carries data the desired-state computation
    /// cannot parse.
    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    /// The conflict retry budget was spent without a successful write.
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: StoreError,
    },

    /// The gateway route the annotation pipeline depends on could not be
    /// resolved.
    #[error("No gateway route found in {namespace} matching {selector}")]
    GatewayNotFound { namespace: String, selector: String },
}

impl EngineError {
    /// Create a new MalformedInput error
    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Returns `true` when the error came out of the conflict retry loop.
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
