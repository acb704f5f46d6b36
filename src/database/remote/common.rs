// Shared types and utilities for remote document-store operations

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// Error type for cloud document operations
#[derive(Debug)]
pub enum CloudError {
    /// HTTP request failed
    RequestFailed(String),
    /// Cloud API returned an error
    ApiError { status: u16, message: String },
    /// Failed to parse a document payload
    ParseError(String),
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            CloudError::ApiError { status, message } => {
                write!(f, "Cloud API error {}: {}", status, message)
            }
            CloudError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for CloudError {}

// ============================================================================
// Document paths
// ============================================================================
//
// The cloud store is hierarchical:
//   organizations/{org}/tournaments/{tid}
//       /matches/{matchId}
//       /matchGroups/{groupId}
//       /matchGroups/{groupId}/teamMatches/{matchId}
//       /teams/{teamId}

pub fn tournaments_collection(organization_id: &str) -> String {
    format!("organizations/{}/tournaments", organization_id)
}

pub fn matches_collection(organization_id: &str, tournament_id: &str) -> String {
    format!(
        "organizations/{}/tournaments/{}/matches",
        organization_id, tournament_id
    )
}

pub fn match_groups_collection(organization_id: &str, tournament_id: &str) -> String {
    format!(
        "organizations/{}/tournaments/{}/matchGroups",
        organization_id, tournament_id
    )
}

pub fn team_matches_collection(
    organization_id: &str,
    tournament_id: &str,
    match_group_id: &str,
) -> String {
    format!(
        "organizations/{}/tournaments/{}/matchGroups/{}/teamMatches",
        organization_id, tournament_id, match_group_id
    )
}

pub fn teams_collection(organization_id: &str, tournament_id: &str) -> String {
    format!(
        "organizations/{}/tournaments/{}/teams",
        organization_id, tournament_id
    )
}

// ============================================================================
// Change stream
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One event from a live subscription.
#[derive(Debug, Clone)]
pub struct RemoteChange {
    pub kind: ChangeKind,
    pub id: String,
    /// The document payload; absent for removals.
    pub doc: Option<Value>,
}

pub type ChangeReceiver = mpsc::UnboundedReceiver<RemoteChange>;

/// Handle releasing a live subscription. Dropping the handle unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// A listed document with its id.
#[derive(Debug, Clone)]
pub struct RemoteDoc {
    pub id: String,
    pub data: Value,
}

// ============================================================================
// Backend contract
// ============================================================================

/// Transport for the hierarchical cloud document store.
///
/// `put_doc` is a full-record replace, never a patch-merge. Listeners may
/// replay the current snapshot as `Added` events before streaming further
/// changes; consumers must apply events idempotently.
#[async_trait]
pub trait CloudBackend: Send + Sync {
    async fn get_doc(&self, collection: &str, id: &str) -> Result<Option<Value>, CloudError>;
    async fn list_docs(&self, collection: &str) -> Result<Vec<RemoteDoc>, CloudError>;
    async fn put_doc(&self, collection: &str, id: &str, data: Value) -> Result<(), CloudError>;
    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), CloudError>;
    fn listen_collection(&self, collection: &str) -> (ChangeReceiver, Subscription);
    fn listen_doc(&self, collection: &str, id: &str) -> (ChangeReceiver, Subscription);
}

/// Cloud client handle shared across the sync services.
#[derive(Clone)]
pub struct CloudClient {
    backend: Arc<dyn CloudBackend>,
}

impl CloudClient {
    pub fn new(backend: Arc<dyn CloudBackend>) -> Self {
        Self { backend }
    }

    /// Client over the REST transport.
    pub fn http(base_url: &str, api_key: &str) -> Self {
        Self::new(Arc::new(super::http::HttpBackend::new(base_url, api_key)))
    }

    /// Client over the in-process store, for tests and offline development.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(super::memory::MemoryBackend::new()))
    }

    pub async fn get_doc(&self, collection: &str, id: &str) -> Result<Option<Value>, CloudError> {
        self.backend.get_doc(collection, id).await
    }

    pub async fn list_docs(&self, collection: &str) -> Result<Vec<RemoteDoc>, CloudError> {
        self.backend.list_docs(collection).await
    }

    pub async fn put_doc(&self, collection: &str, id: &str, data: Value) -> Result<(), CloudError> {
        self.backend.put_doc(collection, id, data).await
    }

    pub async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), CloudError> {
        self.backend.delete_doc(collection, id).await
    }

    pub fn listen_collection(&self, collection: &str) -> (ChangeReceiver, Subscription) {
        self.backend.listen_collection(collection)
    }

    pub fn listen_doc(&self, collection: &str, id: &str) -> (ChangeReceiver, Subscription) {
        self.backend.listen_doc(collection, id)
    }
}

/// Decode a document payload into a typed record.
pub fn decode<T: serde::de::DeserializeOwned>(doc: Value) -> Result<T, CloudError> {
    serde_json::from_value(doc).map_err(|e| CloudError::ParseError(e.to_string()))
}

/// Encode a typed record into a document payload.
pub fn encode<T: serde::Serialize>(record: &T) -> Result<Value, CloudError> {
    serde_json::to_value(record).map_err(|e| CloudError::ParseError(e.to_string()))
}
