use papaya::HashMap as PapayaHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use projectmesh_core::{ObjectKind, StoredObject};
use projectmesh_storage::{LabelSelector, ObjectKey, ObjectStore, StoreError, WatchEvent};

/// Default buffer size for the watch broadcast channel. Slow receivers
/// beyond this limit lose the oldest events.
const DEFAULT_WATCH_BUFFER: usize = 1024;

pub type StorageKey = String; // Format: "Kind/namespace/name"

pub(crate) fn make_storage_key(key: &ObjectKey) -> StorageKey {
    key.to_string()
}

/// In-memory object store using a papaya lock-free HashMap.
///
/// This backend provides:
/// - Lock-free concurrent access via papaya::HashMap
/// - Optimistic concurrency via a monotonic revision counter
/// - Watch notifications over a tokio broadcast channel
///
/// It backs the engine's test suites and local runs; production deploys
/// use a real cluster store behind the same trait.
#[derive(Debug)]
pub struct InMemoryStore {
    data: Arc<PapayaHashMap<StorageKey, StoredObject>>,
    revision_counter: AtomicU64,
    events: broadcast::Sender<WatchEvent>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(DEFAULT_WATCH_BUFFER);
        Self {
            data: Arc::new(PapayaHashMap::new()),
            revision_counter: AtomicU64::new(1),
            events,
        }
    }

    /// Subscribes to change notifications. Events sent before subscription
    /// are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.events.subscribe()
    }

    /// Seeds the store with an object, bypassing conflict checks. Intended
    /// for test fixtures; assigns a revision token like a real write.
    pub fn seed(&self, object: StoredObject) -> StoredObject {
        let stamped = object.next_version(self.next_revision());
        let key = make_storage_key(&ObjectKey::of(&stamped));
        let guard = self.data.pin();
        guard.insert(key, stamped.clone());
        stamped
    }

    /// Number of objects currently held.
    pub fn count(&self) -> usize {
        let guard = self.data.pin();
        guard.len()
    }

    fn next_revision(&self) -> String {
        self.revision_counter
            .fetch_add(1, Ordering::SeqCst)
            .to_string()
    }

    fn notify(&self, event: WatchEvent) {
        // A send error only means there are no subscribers.
        let _ = self.events.send(event);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StoreError> {
        let guard = self.data.pin();
        Ok(guard.get(&make_storage_key(key)).cloned())
    }

    async fn list(
        &self,
        kind: ObjectKind,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<StoredObject>, StoreError> {
        let guard = self.data.pin();
        let mut matches: Vec<StoredObject> = guard
            .iter()
            .filter(|(_, obj)| {
                obj.kind == kind
                    && obj.meta.namespace.as_deref() == Some(namespace)
                    && selector.matches(obj)
            })
            .map(|(_, obj)| obj.clone())
            .collect();
        // papaya iteration order is unspecified; keep results stable.
        matches.sort_by(|a, b| a.meta.name.cmp(&b.meta.name));
        Ok(matches)
    }

    async fn create(&self, object: &StoredObject) -> Result<StoredObject, StoreError> {
        let key = make_storage_key(&ObjectKey::of(object));
        let stamped = object.next_version(self.next_revision());

        let guard = self.data.pin();
        if guard.get(&key).is_some() {
            return Err(StoreError::already_exists(
                object.kind,
                object.meta.name.clone(),
            ));
        }
        guard.insert(key, stamped.clone());
        drop(guard);

        self.notify(WatchEvent::Created(stamped.clone()));
        Ok(stamped)
    }

    async fn update(&self, object: &StoredObject) -> Result<StoredObject, StoreError> {
        let key = make_storage_key(&ObjectKey::of(object));

        let guard = self.data.pin();
        let current = guard
            .get(&key)
            .ok_or_else(|| StoreError::not_found(object.kind, object.meta.name.clone()))?
            .clone();

        let current_version = current.meta.resource_version.clone().unwrap_or_default();
        let submitted_version = object.meta.resource_version.clone().unwrap_or_default();
        if submitted_version != current_version {
            return Err(StoreError::version_conflict(
                submitted_version,
                current_version,
            ));
        }

        let stamped = object.next_version(self.next_revision());
        guard.insert(key, stamped.clone());
        drop(guard);

        self.notify(WatchEvent::Updated {
            old: current,
            new: stamped.clone(),
        });
        Ok(stamped)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
