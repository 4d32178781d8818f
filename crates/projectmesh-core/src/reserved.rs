//! Platform-reserved namespace detection.

use regex::Regex;
use std::sync::LazyLock;

static RESERVED_NAMESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(openshift|istio-system)$|^(kube|openshift)-.*$")
        .expect("reserved namespace pattern is valid")
});

/// Returns `true` when the given namespace name belongs to the platform:
/// either one of the fixed reserved names or a `kube-`/`openshift-`
/// prefixed namespace. Reserved namespaces are never enrolled in the mesh.
pub fn is_reserved_namespace(name: &str) -> bool {
    RESERVED_NAMESPACE.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_namespaces() {
        for ns in [
            "kube-system",
            "kube-public",
            "kube-node-lease",
            "openshift",
            "openshift-build",
            "openshift-infra",
            "openshift-authentication",
            "openshift-apiserver",
            "istio-system",
        ] {
            assert!(is_reserved_namespace(ns), "{ns} should be reserved");
        }
    }

    #[test]
    fn user_namespaces() {
        for ns in [
            "mynamespace",
            "openshiftmynamespace",
            "kubemynamespace",
            "istio-system-openshift",
        ] {
            assert!(!is_reserved_namespace(ns), "{ns} should not be reserved");
        }
    }
}
