//! Process configuration, sourced from the environment once at startup.
//!
//! Every desired-state computation receives this value explicitly; nothing
//! in the engine reads the ambient environment after startup.

use projectmesh_core::CoreError;
use projectmesh_storage::LabelSelector;
use thiserror::Error;

pub const CONTROL_PLANE_ENV: &str = "CONTROL_PLANE_NAME";
pub const MESH_NAMESPACE_ENV: &str = "MESH_NAMESPACE";
pub const AUTHORINO_LABEL_ENV: &str = "AUTHORINO_LABEL";
pub const AUTH_AUDIENCE_ENV: &str = "AUTH_AUDIENCE";

const DEFAULT_CONTROL_PLANE: &str = "basic";
const DEFAULT_MESH_NAMESPACE: &str = "istio-system";
const DEFAULT_AUTHORINO_LABEL: &str = "authorino/topic=odh";
const DEFAULT_AUTH_AUDIENCE: &str = "https://kubernetes.default.svc";

/// Fatal configuration errors, surfaced at startup rather than per pass.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {var}: {source}")]
    InvalidLabelSelector {
        var: &'static str,
        #[source]
        source: CoreError,
    },
}

/// Immutable process-wide configuration of the convergence engine.
#[derive(Debug, Clone)]
pub struct MeshEnvConfig {
    /// Name of the mesh control plane referenced by membership children.
    pub control_plane: String,
    /// Namespace hosting the control plane and the public gateway routes.
    pub mesh_namespace: String,
    /// Label stamped on auth-policy children and used by the auth stack
    /// to discover them.
    pub auth_label: LabelSelector,
    /// Token audiences accepted by auth-policy children.
    pub auth_audiences: Vec<String>,
}

impl MeshEnvConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary lookup, falling back to
    /// the documented defaults for unset keys. Testable without touching
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let raw_label = get_or(AUTHORINO_LABEL_ENV, DEFAULT_AUTHORINO_LABEL);
        let auth_label = LabelSelector::parse(&raw_label).map_err(|source| {
            ConfigError::InvalidLabelSelector {
                var: AUTHORINO_LABEL_ENV,
                source,
            }
        })?;

        let auth_audiences = get_or(AUTH_AUDIENCE_ENV, DEFAULT_AUTH_AUDIENCE)
            .split(',')
            .map(|aud| aud.trim().to_string())
            .filter(|aud| !aud.is_empty())
            .collect();

        Ok(Self {
            control_plane: get_or(CONTROL_PLANE_ENV, DEFAULT_CONTROL_PLANE),
            mesh_namespace: get_or(MESH_NAMESPACE_ENV, DEFAULT_MESH_NAMESPACE),
            auth_label,
            auth_audiences,
        })
    }
}
