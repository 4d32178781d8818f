//! Conflict-safe application of desired state.
//!
//! The read-merge-write loop here is the engine's central correctness
//! mechanism: it never overwrites metadata it does not manage, and it
//! survives concurrent writers by re-reading the latest revision token
//! before every conditioned write.

use std::time::Duration;

use projectmesh_core::StoredObject;
use projectmesh_storage::{ObjectKey, ObjectStore, StoreError};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::outcome::PipelineOutcome;

/// Bounded retry discipline for conditioned writes.
///
/// Defaults mirror the platform client's conflict retry: five attempts,
/// ten milliseconds apart, no growth.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of write attempts before giving up.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each conflict.
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            factor: 1.0,
        }
    }
}

impl RetryPolicy {
    /// A policy with no delay between attempts, for deterministic tests.
    pub fn no_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            factor: 1.0,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.mul_f64(self.factor.powi(attempt as i32))
    }
}

/// Whether observed state already satisfies desired state on the fields
/// the engine manages: the spec payload and the managed label set. Store
/// metadata (revision token, timestamps) is ignored.
pub fn managed_fields_equal(observed: &StoredObject, desired: &StoredObject) -> bool {
    observed.meta.labels == desired.meta.labels && observed.spec == desired.spec
}

/// Creates the child if absent, or converges it on the managed fields if
/// it drifted. See the crate docs for the full contract.
///
/// A create that loses the race to another writer falls through to the
/// update path instead of failing - the child exists either way.
pub async fn apply(
    store: &dyn ObjectStore,
    desired: &StoredObject,
    equivalent: &(dyn Fn(&StoredObject, &StoredObject) -> bool + Send + Sync),
    retry: &RetryPolicy,
) -> Result<PipelineOutcome, EngineError> {
    let key = ObjectKey::of(desired);

    let observed = match store.get(&key).await? {
        Some(observed) => Some(observed),
        None => {
            debug!(key = %key, "creating child resource");
            match store.create(desired).await {
                Ok(_) => return Ok(PipelineOutcome::Created),
                Err(err) if err.is_already_exists() => store.get(&key).await?,
                Err(err) => return Err(err.into()),
            }
        }
    };

    if let Some(observed) = &observed
        && equivalent(observed, desired)
    {
        return Ok(PipelineOutcome::Unchanged);
    }

    debug!(key = %key, "converging drifted child resource");
    update_with_retry(
        store,
        &key,
        |current| {
            current.spec = desired.spec.clone();
            current.meta.labels = desired.meta.labels.clone();
        },
        retry,
    )
    .await?;

    Ok(PipelineOutcome::Updated)
}

/// Read-merge-write loop against version conflicts.
///
/// Every attempt re-fetches the object to pick up the latest revision
/// token, applies `mutate` to the fresh copy, and submits a conditioned
/// write. Conflicts consume budget; any other failure aborts immediately.
pub async fn update_with_retry(
    store: &dyn ObjectStore,
    key: &ObjectKey,
    mutate: impl Fn(&mut StoredObject),
    retry: &RetryPolicy,
) -> Result<StoredObject, EngineError> {
    let mut last_conflict: Option<StoreError> = None;

    for attempt in 0..retry.max_attempts {
        let mut current = store
            .get(key)
            .await?
            .ok_or_else(|| StoreError::not_found(key.kind, key.name.clone()))?;

        mutate(&mut current);

        match store.update(&current).await {
            Ok(updated) => return Ok(updated),
            Err(err) if err.is_version_conflict() => {
                debug!(key = %key, attempt, "conditioned write conflicted, retrying");
                last_conflict = Some(err);
                let delay = retry.delay(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(err) => return Err(err.into()),
        }
    }

    let last = last_conflict
        .unwrap_or_else(|| StoreError::internal("retry budget of zero attempts"));
    warn!(key = %key, attempts = retry.max_attempts, "giving up on conditioned write");
    Err(EngineError::RetriesExhausted {
        attempts: retry.max_attempts,
        last,
    })
}
