use serde::{Deserialize, Serialize};

fn is_false(v: &bool) -> bool {
    !*v
}

/// Sync bookkeeping carried by every mirrored record.
///
/// `is_synced = false` marks the local copy as the most recent edit; inbound
/// replication must not overwrite its structural fields. `deleted` is a soft
/// tombstone kept until the delete has been pushed to the cloud.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMeta {
    pub organization_id: String,
    pub tournament_id: String,
    pub is_synced: bool,
    #[serde(rename = "_deleted", default, skip_serializing_if = "is_false")]
    pub deleted: bool,
}

/// A mirrored record: the remote document shape plus local sync metadata.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Local<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(flatten)]
    pub meta: SyncMeta,
}

