//! Managed annotation and label keys.
//!
//! These keys form the contract surface between the controller and other
//! platform components. Changing any of them is a breaking change for
//! everything that reads the annotations off a namespace.

/// Opt-in annotation on a namespace. The namespace joins the mesh when the
/// value parses as boolean true.
pub const ANNOTATION_SERVICE_MESH: &str = "opendatahub.io/service-mesh";

/// Resolved gateway identity, in `name` or `namespace/name` form.
pub const ANNOTATION_PUBLIC_GATEWAY_NAME: &str =
    "service-mesh.opendatahub.io/public-gateway-name";

/// Externally reachable host of the public gateway, host-only (no scheme).
pub const ANNOTATION_PUBLIC_GATEWAY_EXTERNAL_HOST: &str =
    "service-mesh.opendatahub.io/public-gateway-host-external";

/// Cluster-internal service host of the public gateway.
pub const ANNOTATION_PUBLIC_GATEWAY_INTERNAL_HOST: &str =
    "service-mesh.opendatahub.io/public-gateway-host-internal";

/// Label on the gateway route carrying the gateway name.
pub const LABEL_GATEWAY_NAME: &str = "maistra.io/gateway-name";

/// Label on the gateway route carrying the gateway namespace.
pub const LABEL_GATEWAY_NAMESPACE: &str = "maistra.io/gateway-namespace";

/// Label stamped on mesh-member children to link them back to the project.
pub const LABEL_PROJECT: &str = "opendatahub.io/project";
