// In-process cloud document store.
//
// Backs tests and offline development sessions with the same CloudBackend
// contract as the REST transport, with push-based listeners instead of
// polling.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::common::{
    ChangeKind, ChangeReceiver, CloudBackend, CloudError, RemoteChange, RemoteDoc, Subscription,
};

struct Listener {
    id: u64,
    tx: mpsc::UnboundedSender<RemoteChange>,
}

#[derive(Default)]
struct Inner {
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    collection_listeners: Mutex<HashMap<String, Vec<Listener>>>,
    doc_listeners: Mutex<HashMap<String, Vec<Listener>>>,
    next_listener_id: AtomicU64,
}

impl Inner {
    fn notify(&self, collection: &str, doc_key: &str, change: RemoteChange) {
        if let Ok(mut listeners) = self.collection_listeners.lock() {
            if let Some(list) = listeners.get_mut(collection) {
                list.retain(|l| l.tx.send(change.clone()).is_ok());
            }
        }
        if let Ok(mut listeners) = self.doc_listeners.lock() {
            if let Some(list) = listeners.get_mut(doc_key) {
                list.retain(|l| l.tx.send(change.clone()).is_ok());
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(
        &self,
        registry: &Mutex<HashMap<String, Vec<Listener>>>,
        key: &str,
    ) -> (ChangeReceiver, u64) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = registry.lock() {
            listeners
                .entry(key.to_string())
                .or_default()
                .push(Listener { id, tx });
        }
        (rx, id)
    }

    fn doc_key(collection: &str, id: &str) -> String {
        format!("{}/{}", collection, id)
    }
}

#[async_trait]
impl CloudBackend for MemoryBackend {
    async fn get_doc(&self, collection: &str, id: &str) -> Result<Option<Value>, CloudError> {
        let collections = self
            .inner
            .collections
            .lock()
            .map_err(|_| CloudError::RequestFailed("store lock poisoned".to_string()))?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn list_docs(&self, collection: &str) -> Result<Vec<RemoteDoc>, CloudError> {
        let collections = self
            .inner
            .collections
            .lock()
            .map_err(|_| CloudError::RequestFailed("store lock poisoned".to_string()))?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| RemoteDoc {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put_doc(&self, collection: &str, id: &str, data: Value) -> Result<(), CloudError> {
        let kind = {
            let mut collections = self
                .inner
                .collections
                .lock()
                .map_err(|_| CloudError::RequestFailed("store lock poisoned".to_string()))?;
            let docs = collections.entry(collection.to_string()).or_default();
            match docs.insert(id.to_string(), data.clone()) {
                None => ChangeKind::Added,
                Some(_) => ChangeKind::Modified,
            }
        };
        self.inner.notify(
            collection,
            &Self::doc_key(collection, id),
            RemoteChange {
                kind,
                id: id.to_string(),
                doc: Some(data),
            },
        );
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), CloudError> {
        let existed = {
            let mut collections = self
                .inner
                .collections
                .lock()
                .map_err(|_| CloudError::RequestFailed("store lock poisoned".to_string()))?;
            collections
                .get_mut(collection)
                .map(|docs| docs.remove(id).is_some())
                .unwrap_or(false)
        };
        if existed {
            self.inner.notify(
                collection,
                &Self::doc_key(collection, id),
                RemoteChange {
                    kind: ChangeKind::Removed,
                    id: id.to_string(),
                    doc: None,
                },
            );
        }
        Ok(())
    }

    fn listen_collection(&self, collection: &str) -> (ChangeReceiver, Subscription) {
        let (rx, id) = self.register(&self.inner.collection_listeners, collection);
        let inner = Arc::clone(&self.inner);
        let key = collection.to_string();
        let sub = Subscription::new(move || {
            if let Ok(mut listeners) = inner.collection_listeners.lock() {
                if let Some(list) = listeners.get_mut(&key) {
                    list.retain(|l| l.id != id);
                }
            }
        });
        (rx, sub)
    }

    fn listen_doc(&self, collection: &str, doc_id: &str) -> (ChangeReceiver, Subscription) {
        let key = Self::doc_key(collection, doc_id);
        let (rx, id) = self.register(&self.inner.doc_listeners, &key);
        let inner = Arc::clone(&self.inner);
        let sub = Subscription::new(move || {
            if let Ok(mut listeners) = inner.doc_listeners.lock() {
                if let Some(list) = listeners.get_mut(&key) {
                    list.retain(|l| l.id != id);
                }
            }
        });
        (rx, sub)
    }
}
