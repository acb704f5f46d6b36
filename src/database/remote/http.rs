// REST transport for the cloud document store.
//
// The dialect is plain resource paths under the API root:
//   GET    {base}/v1/{collection}        -> [{ "id": ..., "data": {...} }]
//   GET    {base}/v1/{collection}/{id}   -> {...}            (404 = absent)
//   PUT    {base}/v1/{collection}/{id}   full-document replace
//   DELETE {base}/v1/{collection}/{id}
//
// The REST dialect has no push channel, so listeners poll the collection
// and diff snapshots. The in-memory backend pushes instead; both honor the
// same CloudBackend contract.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use super::common::{
    ChangeKind, ChangeReceiver, CloudBackend, CloudError, RemoteChange, RemoteDoc, Subscription,
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Deserialize)]
struct ListedDoc {
    id: String,
    data: Value,
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/v1/{}", self.base_url, collection)
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/v1/{}/{}", self.base_url, collection, id)
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, CloudError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status().as_u16();
        let message = res.text().await.unwrap_or_default();
        Err(CloudError::ApiError { status, message })
    }
}

#[async_trait]
impl CloudBackend for HttpBackend {
    async fn get_doc(&self, collection: &str, id: &str) -> Result<Option<Value>, CloudError> {
        let res = self
            .client
            .get(self.doc_url(collection, id))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| CloudError::RequestFailed(e.to_string()))?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = Self::check(res).await?;
        res.json::<Value>()
            .await
            .map(Some)
            .map_err(|e| CloudError::ParseError(e.to_string()))
    }

    async fn list_docs(&self, collection: &str) -> Result<Vec<RemoteDoc>, CloudError> {
        let res = self
            .client
            .get(self.collection_url(collection))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| CloudError::RequestFailed(e.to_string()))?;

        let res = Self::check(res).await?;
        let docs: Vec<ListedDoc> = res
            .json()
            .await
            .map_err(|e| CloudError::ParseError(e.to_string()))?;
        Ok(docs
            .into_iter()
            .map(|d| RemoteDoc {
                id: d.id,
                data: d.data,
            })
            .collect())
    }

    async fn put_doc(&self, collection: &str, id: &str, data: Value) -> Result<(), CloudError> {
        let res = self
            .client
            .put(self.doc_url(collection, id))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&data)
            .send()
            .await
            .map_err(|e| CloudError::RequestFailed(e.to_string()))?;

        Self::check(res).await?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), CloudError> {
        let res = self
            .client
            .delete(self.doc_url(collection, id))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| CloudError::RequestFailed(e.to_string()))?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(res).await?;
        Ok(())
    }

    fn listen_collection(&self, collection: &str) -> (ChangeReceiver, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = self.clone();
        let collection = collection.to_string();

        let handle = tokio::spawn(async move {
            let mut known: HashMap<String, Value> = HashMap::new();
            loop {
                match backend.list_docs(&collection).await {
                    Ok(docs) => {
                        let mut current: HashMap<String, Value> = HashMap::new();
                        for doc in docs {
                            current.insert(doc.id, doc.data);
                        }
                        for (id, data) in &current {
                            let kind = match known.get(id) {
                                None => ChangeKind::Added,
                                Some(prev) if prev != data => ChangeKind::Modified,
                                Some(_) => continue,
                            };
                            let change = RemoteChange {
                                kind,
                                id: id.clone(),
                                doc: Some(data.clone()),
                            };
                            if tx.send(change).is_err() {
                                return;
                            }
                        }
                        for id in known.keys() {
                            if !current.contains_key(id) {
                                let change = RemoteChange {
                                    kind: ChangeKind::Removed,
                                    id: id.clone(),
                                    doc: None,
                                };
                                if tx.send(change).is_err() {
                                    return;
                                }
                            }
                        }
                        known = current;
                    }
                    Err(e) => {
                        // Keep the snapshot; transient failures resolve on
                        // the next poll.
                        log::warn!("[remote] poll of {} failed: {}", collection, e);
                    }
                }
                tokio::time::sleep(backend.poll_interval).await;
            }
        });

        (rx, Subscription::new(move || handle.abort()))
    }

    fn listen_doc(&self, collection: &str, id: &str) -> (ChangeReceiver, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = self.clone();
        let collection = collection.to_string();
        let id = id.to_string();

        let handle = tokio::spawn(async move {
            let mut known: Option<Value> = None;
            loop {
                match backend.get_doc(&collection, &id).await {
                    Ok(current) => {
                        let change = match (&known, &current) {
                            (None, Some(data)) => Some(RemoteChange {
                                kind: ChangeKind::Added,
                                id: id.clone(),
                                doc: Some(data.clone()),
                            }),
                            (Some(prev), Some(data)) if prev != data => Some(RemoteChange {
                                kind: ChangeKind::Modified,
                                id: id.clone(),
                                doc: Some(data.clone()),
                            }),
                            (Some(_), None) => Some(RemoteChange {
                                kind: ChangeKind::Removed,
                                id: id.clone(),
                                doc: None,
                            }),
                            _ => None,
                        };
                        if let Some(change) = change {
                            if tx.send(change).is_err() {
                                return;
                            }
                        }
                        known = current;
                    }
                    Err(e) => {
                        log::warn!("[remote] poll of {}/{} failed: {}", collection, id, e);
                    }
                }
                tokio::time::sleep(backend.poll_interval).await;
            }
        });

        (rx, Subscription::new(move || handle.abort()))
    }
}
