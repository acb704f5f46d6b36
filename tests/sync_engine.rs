mod common;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use shiai::database::local::{matches as local_matches, team_matches as local_team_matches};
use shiai::database::remote::common::{
    ChangeReceiver, CloudBackend, CloudClient, CloudError, RemoteDoc, Subscription,
};
use shiai::database::remote::memory::MemoryBackend;
use shiai::database::remote::{match_groups, matches, team_matches, teams, tournaments};
use shiai::models::match_groups::MatchGroup;
use shiai::models::tournaments::TournamentType;
use shiai::{CloudSync, SyncError};

use common::{
    mirror_pool, sample_match, sample_team, sample_team_match, sample_tournament, ORG,
};

#[tokio::test]
async fn test_download_fails_fast_when_offline() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();
    let sync = CloudSync::new(pool, client);

    let err = sync
        .download_tournament_data(ORG, "t1", false)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Offline));
}

#[tokio::test]
async fn test_download_missing_tournament_is_not_found() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();
    let sync = CloudSync::new(pool.clone(), client);

    let err = sync
        .download_tournament_data(ORG, "nope", true)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::TournamentNotFound { .. }));
    // no partial local mutation
    assert_eq!(
        local_matches::count_unsynced(&pool, ORG, "nope").await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_download_individual_tournament() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();

    let tournament = sample_tournament(TournamentType::Individual);
    let tid = tournament.tournament_id.clone();
    tournaments::upsert_tournament(&client, &tournament).await.unwrap();
    teams::upsert_team(&client, ORG, &tid, &sample_team("Seibukan")).await.unwrap();
    let m1 = sample_match("A", 1);
    let m2 = sample_match("B", 2);
    matches::upsert_match(&client, ORG, &tid, &m1).await.unwrap();
    matches::upsert_match(&client, ORG, &tid, &m2).await.unwrap();

    let sync = CloudSync::new(pool.clone(), client);
    sync.download_tournament_data(ORG, &tid, true).await.unwrap();

    let local = local_matches::list_by_tournament(&pool, ORG, &tid).await.unwrap();
    assert_eq!(local.len(), 2);
    assert!(local.iter().all(|l| l.meta.is_synced));
    assert_eq!(sync.get_unsynced_count(ORG, &tid).await.unwrap(), 0);
}

#[tokio::test]
async fn test_download_is_idempotent() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();

    let tournament = sample_tournament(TournamentType::Individual);
    let tid = tournament.tournament_id.clone();
    tournaments::upsert_tournament(&client, &tournament).await.unwrap();
    matches::upsert_match(&client, ORG, &tid, &sample_match("A", 1)).await.unwrap();

    let sync = CloudSync::new(pool.clone(), client);
    sync.download_tournament_data(ORG, &tid, true).await.unwrap();
    let first = local_matches::list_by_tournament(&pool, ORG, &tid).await.unwrap();
    sync.download_tournament_data(ORG, &tid, true).await.unwrap();
    let second = local_matches::list_by_tournament(&pool, ORG, &tid).await.unwrap();

    assert_eq!(first, second);
    assert!(second.iter().all(|l| l.meta.is_synced));
}

#[tokio::test]
async fn test_download_discards_unsynced_local_edits() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();

    let tournament = sample_tournament(TournamentType::Individual);
    let tid = tournament.tournament_id.clone();
    tournaments::upsert_tournament(&client, &tournament).await.unwrap();
    let remote_match = sample_match("A", 1);
    matches::upsert_match(&client, ORG, &tid, &remote_match).await.unwrap();

    let sync = CloudSync::new(pool.clone(), client);
    sync.download_tournament_data(ORG, &tid, true).await.unwrap();

    // Local edit that was never pushed.
    let mut edited = remote_match.clone();
    edited.court_id = "B".to_string();
    local_matches::save_match(&pool, ORG, &tid, &edited).await.unwrap();
    assert_eq!(sync.get_unsynced_count(ORG, &tid).await.unwrap(), 1);

    // The destructive re-download drops it.
    sync.download_tournament_data(ORG, &tid, true).await.unwrap();
    let local = local_matches::get_match(&pool, &remote_match.match_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(local.record.court_id, "A");
    assert!(local.meta.is_synced);
}

#[tokio::test]
async fn test_download_team_tournament_with_nested_bouts() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();

    let tournament = sample_tournament(TournamentType::Team);
    let tid = tournament.tournament_id.clone();
    tournaments::upsert_tournament(&client, &tournament).await.unwrap();

    let group = MatchGroup::new("A", "r1", "t1", "t2", 1);
    match_groups::upsert_match_group(&client, ORG, &tid, &group).await.unwrap();
    let bout = sample_team_match(&group.match_group_id, 1);
    team_matches::upsert_team_match(&client, ORG, &tid, &bout).await.unwrap();
    assert!(
        team_matches::get_team_match(&client, ORG, &tid, &group.match_group_id, &bout.match_id)
            .await
            .unwrap()
            .is_some()
    );

    let sync = CloudSync::new(pool.clone(), client);
    sync.download_tournament_data(ORG, &tid, true).await.unwrap();

    let bouts = local_team_matches::list_by_group(&pool, &group.match_group_id)
        .await
        .unwrap();
    assert_eq!(bouts.len(), 1);
    assert_eq!(bouts[0].record.match_id, bout.match_id);
    assert!(bouts[0].meta.is_synced);
}

#[tokio::test]
async fn test_upload_conservation() {
    let pool = mirror_pool().await;
    let backend = MemoryBackend::new();
    let client = CloudClient::new(Arc::new(backend));
    let sync = CloudSync::new(pool.clone(), client.clone());

    for i in 0..3 {
        local_matches::save_match(&pool, ORG, "t1", &sample_match("A", i))
            .await
            .unwrap();
    }
    assert_eq!(sync.get_unsynced_count(ORG, "t1").await.unwrap(), 3);

    let pushed = sync.upload_results(ORG, "t1", true).await.unwrap();
    assert_eq!(pushed, 3);
    assert_eq!(sync.get_unsynced_count(ORG, "t1").await.unwrap(), 0);
    assert_eq!(matches::list_matches(&client, ORG, "t1").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_upload_returns_zero_when_nothing_pending() {
    let pool = mirror_pool().await;
    let sync = CloudSync::new(pool, CloudClient::in_memory());
    assert_eq!(sync.upload_results(ORG, "t1", true).await.unwrap(), 0);
}

#[tokio::test]
async fn test_upload_fails_fast_when_offline() {
    let pool = mirror_pool().await;
    let sync = CloudSync::new(pool.clone(), CloudClient::in_memory());
    local_matches::save_match(&pool, ORG, "t1", &sample_match("A", 1))
        .await
        .unwrap();

    let err = sync.upload_results(ORG, "t1", false).await.unwrap_err();
    assert!(matches!(err, SyncError::Offline));
    assert_eq!(sync.get_unsynced_count(ORG, "t1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_upload_pushes_tombstone_as_remote_delete() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();
    let sync = CloudSync::new(pool.clone(), client.clone());

    let record = sample_match("A", 1);
    matches::upsert_match(&client, ORG, "t1", &record).await.unwrap();
    local_matches::put_synced(&pool, ORG, "t1", &record).await.unwrap();

    local_matches::mark_deleted(&pool, &record.match_id).await.unwrap();
    // tombstoned records disappear from listings but stay queryable
    assert!(local_matches::list_by_tournament(&pool, ORG, "t1")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(sync.get_unsynced_count(ORG, "t1").await.unwrap(), 1);

    let pushed = sync.upload_results(ORG, "t1", true).await.unwrap();
    assert_eq!(pushed, 1);
    assert!(matches::get_match(&client, ORG, "t1", &record.match_id)
        .await
        .unwrap()
        .is_none());
    assert!(local_matches::get_match(&pool, &record.match_id)
        .await
        .unwrap()
        .is_none());
}

// ============================================================================
// Per-record failure isolation
// ============================================================================

/// Delegates to the in-memory store but refuses writes for one document id.
#[derive(Clone)]
struct FailingPutBackend {
    inner: MemoryBackend,
    reject_id: String,
}

#[async_trait]
impl CloudBackend for FailingPutBackend {
    async fn get_doc(&self, collection: &str, id: &str) -> Result<Option<Value>, CloudError> {
        self.inner.get_doc(collection, id).await
    }

    async fn list_docs(&self, collection: &str) -> Result<Vec<RemoteDoc>, CloudError> {
        self.inner.list_docs(collection).await
    }

    async fn put_doc(&self, collection: &str, id: &str, data: Value) -> Result<(), CloudError> {
        if id == self.reject_id {
            return Err(CloudError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.inner.put_doc(collection, id, data).await
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), CloudError> {
        self.inner.delete_doc(collection, id).await
    }

    fn listen_collection(&self, collection: &str) -> (ChangeReceiver, Subscription) {
        self.inner.listen_collection(collection)
    }

    fn listen_doc(&self, collection: &str, id: &str) -> (ChangeReceiver, Subscription) {
        self.inner.listen_doc(collection, id)
    }
}

#[tokio::test]
async fn test_upload_isolates_per_record_failures() {
    let pool = mirror_pool().await;
    let good = sample_match("A", 1);
    let bad = sample_match("A", 2);
    let client = CloudClient::new(Arc::new(FailingPutBackend {
        inner: MemoryBackend::new(),
        reject_id: bad.match_id.clone(),
    }));
    let sync = CloudSync::new(pool.clone(), client);

    local_matches::save_match(&pool, ORG, "t1", &good).await.unwrap();
    local_matches::save_match(&pool, ORG, "t1", &bad).await.unwrap();

    let pushed = sync.upload_results(ORG, "t1", true).await.unwrap();
    assert_eq!(pushed, 1);

    // The failed record stays pending for the next pass.
    assert_eq!(sync.get_unsynced_count(ORG, "t1").await.unwrap(), 1);
    let still_pending = local_matches::get_match(&pool, &bad.match_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!still_pending.meta.is_synced);
}

// ============================================================================
// Full-tournament push
// ============================================================================

#[tokio::test]
async fn test_save_tournament_publishes_everything() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();
    let sync = CloudSync::new(pool.clone(), client.clone());

    let tournament = sample_tournament(TournamentType::Individual);
    let tid = tournament.tournament_id.clone();
    shiai::database::local::tournaments::save_tournament(&pool, &tournament)
        .await
        .unwrap();
    local_matches::save_match(&pool, ORG, &tid, &sample_match("A", 1))
        .await
        .unwrap();
    let team = sample_team("Seibukan");
    shiai::database::local::teams::save_team(&pool, ORG, &tid, &team)
        .await
        .unwrap();

    sync.save_tournament(&tournament, true).await.unwrap();

    assert!(tournaments::get_tournament(&client, ORG, &tid)
        .await
        .unwrap()
        .is_some());
    assert!(teams::get_team(&client, ORG, &tid, &team.team_id)
        .await
        .unwrap()
        .is_some());
    assert_eq!(matches::list_matches(&client, ORG, &tid).await.unwrap().len(), 1);
    assert_eq!(sync.get_unsynced_count(ORG, &tid).await.unwrap(), 0);

    let stored = shiai::database::local::tournaments::get_tournament(&pool, &tid)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.meta.is_synced);
}

/// Never acknowledges a write; used to exercise the push deadline.
struct StalledBackend;

#[async_trait]
impl CloudBackend for StalledBackend {
    async fn get_doc(&self, _collection: &str, _id: &str) -> Result<Option<Value>, CloudError> {
        std::future::pending().await
    }

    async fn list_docs(&self, _collection: &str) -> Result<Vec<RemoteDoc>, CloudError> {
        std::future::pending().await
    }

    async fn put_doc(&self, _collection: &str, _id: &str, _data: Value) -> Result<(), CloudError> {
        std::future::pending().await
    }

    async fn delete_doc(&self, _collection: &str, _id: &str) -> Result<(), CloudError> {
        std::future::pending().await
    }

    fn listen_collection(&self, _collection: &str) -> (ChangeReceiver, Subscription) {
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (rx, Subscription::new(|| {}))
    }

    fn listen_doc(&self, _collection: &str, _id: &str) -> (ChangeReceiver, Subscription) {
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (rx, Subscription::new(|| {}))
    }
}

#[tokio::test(start_paused = true)]
async fn test_save_tournament_reports_timeout() {
    let pool = mirror_pool().await;
    let sync = CloudSync::new(pool, CloudClient::new(Arc::new(StalledBackend)));

    let tournament = sample_tournament(TournamentType::Individual);
    let err = sync.save_tournament(&tournament, true).await.unwrap_err();
    assert!(matches!(err, SyncError::Timeout));
}

#[tokio::test]
async fn test_clear_local_data_wipes_every_collection() {
    let pool = mirror_pool().await;
    let sync = CloudSync::new(pool.clone(), CloudClient::in_memory());

    local_matches::save_match(&pool, ORG, "t1", &sample_match("A", 1))
        .await
        .unwrap();
    local_team_matches::save_team_match(&pool, ORG, "t2", &sample_team_match("g1", 1))
        .await
        .unwrap();

    sync.clear_local_data().await.unwrap();
    assert_eq!(sync.get_unsynced_count(ORG, "t1").await.unwrap(), 0);
    assert_eq!(sync.get_unsynced_count(ORG, "t2").await.unwrap(), 0);
    assert!(local_matches::list_by_tournament(&pool, ORG, "t1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_unsynced_count_spans_entity_types() {
    let pool = mirror_pool().await;
    let sync = CloudSync::new(pool.clone(), CloudClient::in_memory());

    local_matches::save_match(&pool, ORG, "t1", &sample_match("A", 1))
        .await
        .unwrap();
    shiai::database::local::match_groups::save_match_group(
        &pool,
        ORG,
        "t1",
        &MatchGroup::new("A", "r1", "t1", "t2", 1),
    )
    .await
    .unwrap();
    local_team_matches::save_team_match(&pool, ORG, "t1", &sample_team_match("g1", 1))
        .await
        .unwrap();

    assert_eq!(sync.get_unsynced_count(ORG, "t1").await.unwrap(), 3);
}
