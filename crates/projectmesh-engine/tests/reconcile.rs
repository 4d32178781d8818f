//! End-to-end convergence scenarios against the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use projectmesh_core::metadata::{
    ANNOTATION_PUBLIC_GATEWAY_EXTERNAL_HOST, ANNOTATION_PUBLIC_GATEWAY_INTERNAL_HOST,
    ANNOTATION_PUBLIC_GATEWAY_NAME, ANNOTATION_SERVICE_MESH, LABEL_GATEWAY_NAME,
    LABEL_GATEWAY_NAMESPACE,
};
use projectmesh_core::{ObjectKind, ObjectMeta, StoredObject};
use projectmesh_db_memory::InMemoryStore;
use projectmesh_engine::{MeshEnvConfig, PipelineOutcome, Reconciler, RetryPolicy};
use projectmesh_storage::{LabelSelector, ObjectKey, ObjectStore, StoreError};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn config() -> MeshEnvConfig {
    MeshEnvConfig::from_lookup(|_| None).expect("defaults are valid")
}

fn reconciler(store: Arc<InMemoryStore>) -> Reconciler {
    Reconciler::with_retry(store, config(), RetryPolicy::no_delay(3))
}

fn namespace(name: &str, mesh_annotation: Option<&str>) -> StoredObject {
    let mut meta = ObjectMeta::new(name);
    if let Some(value) = mesh_annotation {
        meta = meta.with_annotation(ANNOTATION_SERVICE_MESH, value);
    }
    StoredObject::new(ObjectKind::Namespace, meta)
}

fn gateway_route() -> StoredObject {
    StoredObject::new(
        ObjectKind::Route,
        ObjectMeta::new("dashboard")
            .with_namespace("istio-system")
            .with_label("app", "odh-dashboard")
            .with_label(LABEL_GATEWAY_NAME, "odh-gateway")
            .with_label(LABEL_GATEWAY_NAMESPACE, "istio-system"),
    )
    .with_spec(json!({
        "host": "https://gateway.apps.cluster.dev/console",
        "to": {"name": "istio-ingressgateway"},
    }))
}

fn member_key(ns: &str) -> ObjectKey {
    ObjectKey::namespaced(ObjectKind::MeshMember, ns, "default")
}

fn policy_key(ns: &str) -> ObjectKey {
    ObjectKey::namespaced(ObjectKind::AuthPolicy, ns, format!("{ns}-protection"))
}

#[tokio::test]
async fn unenrolled_namespace_skips_everything() {
    let store = Arc::new(InMemoryStore::new());
    store.seed(namespace("project-a", None));
    store.seed(gateway_route());

    let result = reconciler(store.clone())
        .reconcile("project-a")
        .await
        .unwrap();

    assert!(!result.has_failures());
    assert_eq!(result.reports.len(), 3);
    for report in &result.reports {
        assert!(report.outcome.is_skipped(), "{} should skip", report.pipeline);
    }
    assert!(store.get(&member_key("project-a")).await.unwrap().is_none());
    assert!(store.get(&policy_key("project-a")).await.unwrap().is_none());
}

#[tokio::test]
async fn disabled_annotation_value_skips_everything() {
    let store = Arc::new(InMemoryStore::new());
    store.seed(namespace("project-a", Some("false")));

    let result = reconciler(store.clone())
        .reconcile("project-a")
        .await
        .unwrap();

    assert!(result.reports.iter().all(|r| r.outcome.is_skipped()));
}

#[tokio::test]
async fn reserved_namespace_skips_even_when_enrolled() {
    let store = Arc::new(InMemoryStore::new());
    store.seed(namespace("openshift-build", Some("true")));

    let result = reconciler(store.clone())
        .reconcile("openshift-build")
        .await
        .unwrap();

    assert!(result.reports.iter().all(|r| r.outcome.is_skipped()));
    assert!(
        store
            .get(&member_key("openshift-build"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn deleted_namespace_is_empty_success() {
    let store = Arc::new(InMemoryStore::new());

    let result = reconciler(store).reconcile("vanished").await.unwrap();

    assert!(result.reports.is_empty());
    assert!(!result.has_failures());
}

#[tokio::test]
async fn enrollment_creates_children_and_converges() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    store.seed(namespace("project-a", Some("true")));
    store.seed(gateway_route());
    let reconciler = reconciler(store.clone());

    // First pass: annotations propagated, children created.
    let result = reconciler.reconcile("project-a").await.unwrap();
    assert!(!result.has_failures(), "{:?}", result.error_summary());
    assert!(matches!(
        result.outcome_of("gateway-annotations").unwrap(),
        PipelineOutcome::Updated
    ));
    assert!(matches!(
        result.outcome_of("mesh-member").unwrap(),
        PipelineOutcome::Created
    ));
    assert!(matches!(
        result.outcome_of("auth-policy").unwrap(),
        PipelineOutcome::Created
    ));

    let parent = store
        .get(&ObjectKey::new(ObjectKind::Namespace, "project-a"))
        .await
        .unwrap()
        .expect("parent present");
    assert_eq!(
        parent.annotation(ANNOTATION_PUBLIC_GATEWAY_EXTERNAL_HOST),
        Some("gateway.apps.cluster.dev")
    );
    assert_eq!(
        parent.annotation(ANNOTATION_PUBLIC_GATEWAY_INTERNAL_HOST),
        Some("istio-ingressgateway.istio-system.svc.cluster.local")
    );
    assert_eq!(
        parent.annotation(ANNOTATION_PUBLIC_GATEWAY_NAME),
        Some("istio-system/odh-gateway")
    );

    let member = store
        .get(&member_key("project-a"))
        .await
        .unwrap()
        .expect("member created");
    assert_eq!(member.spec["controlPlaneRef"]["name"], "basic");

    let policy = store
        .get(&policy_key("project-a"))
        .await
        .unwrap()
        .expect("policy created");
    assert_eq!(policy.spec["hosts"], json!(["gateway.apps.cluster.dev"]));

    // Second pass with unchanged inputs: everything unchanged.
    let result = reconciler.reconcile("project-a").await.unwrap();
    assert!(!result.has_failures());
    for report in &result.reports {
        assert!(
            matches!(report.outcome, PipelineOutcome::Unchanged),
            "{} should be unchanged, was {}",
            report.pipeline,
            report.outcome
        );
    }
}

#[tokio::test]
async fn manual_edit_is_repaired_without_touching_unmanaged_fields() {
    let store = Arc::new(InMemoryStore::new());
    store.seed(namespace("project-a", Some("true")));
    store.seed(gateway_route());
    let reconciler = reconciler(store.clone());

    reconciler.reconcile("project-a").await.unwrap();

    // Another writer tampers with the member spec and adds an annotation
    // the engine does not manage.
    let mut tampered = store
        .get(&member_key("project-a"))
        .await
        .unwrap()
        .expect("member present");
    let original_spec = tampered.spec.clone();
    tampered.spec = json!({"controlPlaneRef": {"name": "rogue-plane"}});
    tampered.set_annotation("audit/edited-by", "someone-else");
    store.update(&tampered).await.unwrap();

    let result = reconciler.reconcile("project-a").await.unwrap();
    assert!(matches!(
        result.outcome_of("mesh-member").unwrap(),
        PipelineOutcome::Updated
    ));

    let repaired = store
        .get(&member_key("project-a"))
        .await
        .unwrap()
        .expect("member present");
    assert_eq!(repaired.spec, original_spec);
    assert_eq!(repaired.annotation("audit/edited-by"), Some("someone-else"));
}

/// Store wrapper whose reads start failing after a budget, simulating the
/// backend dropping out mid-pass.
struct FlakyReadStore {
    inner: InMemoryStore,
    reads_left: std::sync::atomic::AtomicU32,
}

#[async_trait]
impl ObjectStore for FlakyReadStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StoreError> {
        use std::sync::atomic::Ordering;
        let left = self.reads_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(StoreError::connection("store went away"));
        }
        self.reads_left.store(left - 1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn list(
        &self,
        kind: ObjectKind,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<StoredObject>, StoreError> {
        self.inner.list(kind, namespace, selector).await
    }

    async fn create(&self, object: &StoredObject) -> Result<StoredObject, StoreError> {
        self.inner.create(object).await
    }

    async fn update(&self, object: &StoredObject) -> Result<StoredObject, StoreError> {
        self.inner.update(object).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky-read-memory"
    }
}

#[tokio::test]
async fn mid_pass_parent_reload_failure_keeps_collected_outcomes() {
    let inner = InMemoryStore::new();
    inner.seed(namespace("project-a", Some("true")));
    inner.seed(gateway_route());
    // Budget covers the eligibility load plus the reads of the first
    // pipeline (its re-load and the conditioned write's re-fetch); every
    // later read fails.
    let store = Arc::new(FlakyReadStore {
        inner,
        reads_left: std::sync::atomic::AtomicU32::new(3),
    });
    let reconciler = Reconciler::with_retry(store, config(), RetryPolicy::no_delay(3));

    let result = reconciler.reconcile("project-a").await.unwrap();

    // The pass still reports every pipeline; the first pipeline's success
    // is kept, and re-load failures cost only the pipelines they precede.
    assert_eq!(result.reports.len(), 3);
    assert!(matches!(
        result.outcome_of("gateway-annotations").unwrap(),
        PipelineOutcome::Updated
    ));
    assert!(result.has_failures());
    assert!(result.outcome_of("mesh-member").unwrap().is_failed());
    assert!(result.outcome_of("auth-policy").unwrap().is_failed());
}

#[tokio::test(flavor = "multi_thread")]
async fn reconcile_can_run_on_a_spawned_task() {
    let store = Arc::new(InMemoryStore::new());
    store.seed(namespace("project-a", Some("true")));
    store.seed(gateway_route());
    let reconciler = Arc::new(reconciler(store));

    // The pass future must be Send so the scheduler's worker pool can
    // move it across threads.
    let handle = tokio::spawn({
        let reconciler = Arc::clone(&reconciler);
        async move { reconciler.reconcile("project-a").await }
    });

    let result = handle.await.unwrap().unwrap();
    assert!(!result.has_failures());
    assert_eq!(result.reports.len(), 3);
}

/// Store wrapper whose list calls always fail, starving the gateway
/// pipeline while leaving the others functional.
struct ListlessStore {
    inner: InMemoryStore,
}

#[async_trait]
impl ObjectStore for ListlessStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StoreError> {
        self.inner.get(key).await
    }

    async fn list(
        &self,
        _kind: ObjectKind,
        _namespace: &str,
        _selector: &LabelSelector,
    ) -> Result<Vec<StoredObject>, StoreError> {
        Err(StoreError::connection("route listing unavailable"))
    }

    async fn create(&self, object: &StoredObject) -> Result<StoredObject, StoreError> {
        self.inner.create(object).await
    }

    async fn update(&self, object: &StoredObject) -> Result<StoredObject, StoreError> {
        self.inner.update(object).await
    }

    fn backend_name(&self) -> &'static str {
        "listless-memory"
    }
}

#[tokio::test]
async fn failing_pipeline_does_not_stop_siblings() {
    init_tracing();
    let inner = InMemoryStore::new();
    inner.seed(namespace("project-a", Some("true")));
    let store = Arc::new(ListlessStore { inner });
    let reconciler = Reconciler::with_retry(store.clone(), config(), RetryPolicy::no_delay(3));

    let result = reconciler.reconcile("project-a").await.unwrap();

    assert!(result.has_failures());
    assert!(matches!(
        result.outcome_of("gateway-annotations").unwrap(),
        PipelineOutcome::Failed(_)
    ));
    // The sibling still converged in the same pass.
    assert!(matches!(
        result.outcome_of("mesh-member").unwrap(),
        PipelineOutcome::Created
    ));
    // No gateway host annotation, so auth-policy is not applicable yet.
    assert!(result.outcome_of("auth-policy").unwrap().is_skipped());

    let errors = result.errors();
    assert_eq!(errors.len(), 1);
    let summary = result.error_summary().expect("failures present");
    assert!(summary.contains("gateway-annotations"));
    assert!(summary.contains("route listing unavailable"));

    assert!(
        store
            .get(&member_key("project-a"))
            .await
            .unwrap()
            .is_some()
    );
}
