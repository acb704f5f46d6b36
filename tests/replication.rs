mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use shiai::database::local::{
    match_groups as local_match_groups, matches as local_matches,
    team_matches as local_team_matches, teams as local_teams,
};
use shiai::database::remote::common::CloudClient;
use shiai::database::remote::{match_groups, matches, team_matches, teams};
use shiai::models::match_groups::MatchGroup;
use shiai::services::sync::{AutoUploader, SyncGate};
use shiai::{CloudSync, ReplicationManager};

use common::{mirror_pool, sample_match, sample_team, sample_team_match, wait_until, ORG};

const TID: &str = "t1";

fn open_gate() -> SyncGate {
    SyncGate {
        online: true,
        is_editing: false,
        has_user: true,
        has_tournament: true,
    }
}

#[tokio::test]
async fn test_inbound_match_is_mirrored_as_synced() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();
    let manager = ReplicationManager::start(pool.clone(), client.clone(), ORG, TID);

    let record = sample_match("A", 1);
    matches::upsert_match(&client, ORG, TID, &record).await.unwrap();

    let pool2 = pool.clone();
    let id = record.match_id.clone();
    assert!(
        wait_until(|| {
            let pool = pool2.clone();
            let id = id.clone();
            async move {
                local_matches::get_match(&pool, &id)
                    .await
                    .ok()
                    .flatten()
                    .is_some()
            }
        })
        .await
    );

    let local = local_matches::get_match(&pool, &record.match_id)
        .await
        .unwrap()
        .unwrap();
    assert!(local.meta.is_synced);
    assert_eq!(local.record.court_id, "A");
    manager.shutdown();
}

#[tokio::test]
async fn test_local_priority_protects_structural_fields() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();

    // Pending local edit for the same record.
    let record = sample_match("A", 1);
    local_matches::save_match(&pool, ORG, TID, &record).await.unwrap();

    let manager = ReplicationManager::start(pool.clone(), client.clone(), ORG, TID);

    let mut remote = record.clone();
    remote.court_id = "B".to_string();
    remote.sort_order = 9;
    matches::upsert_match(&client, ORG, TID, &remote).await.unwrap();

    // Give the apply loop time to (not) clobber the record.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let local = local_matches::get_match(&pool, &record.match_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(local.record.court_id, "A");
    assert_eq!(local.record.sort_order, 1);
    assert!(!local.meta.is_synced);
    manager.shutdown();
}

#[tokio::test]
async fn test_live_tallies_merge_even_when_unsynced() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();

    let record = sample_match("A", 1);
    local_matches::save_match(&pool, ORG, TID, &record).await.unwrap();

    let manager = ReplicationManager::start(pool.clone(), client.clone(), ORG, TID);

    let mut remote = record.clone();
    remote.players.player_a.score = 2;
    remote.players.player_b.hansoku = 3;
    matches::upsert_match(&client, ORG, TID, &remote).await.unwrap();

    let pool2 = pool.clone();
    let id = record.match_id.clone();
    assert!(
        wait_until(|| {
            let pool = pool2.clone();
            let id = id.clone();
            async move {
                local_matches::get_match(&pool, &id)
                    .await
                    .ok()
                    .flatten()
                    .map(|l| l.record.players.player_a.score == 2)
                    .unwrap_or(false)
            }
        })
        .await
    );

    let local = local_matches::get_match(&pool, &record.match_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(local.record.players.player_b.hansoku, 3);
    // structure and pending state survive the tally merge
    assert_eq!(local.record.court_id, "A");
    assert!(!local.meta.is_synced);
    manager.shutdown();
}

#[tokio::test]
async fn test_inbound_removal_hard_deletes_local_copy() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();

    let record = sample_match("A", 1);
    matches::upsert_match(&client, ORG, TID, &record).await.unwrap();
    local_matches::put_synced(&pool, ORG, TID, &record).await.unwrap();

    let manager = ReplicationManager::start(pool.clone(), client.clone(), ORG, TID);
    matches::delete_match(&client, ORG, TID, &record.match_id)
        .await
        .unwrap();

    let pool2 = pool.clone();
    let id = record.match_id.clone();
    assert!(
        wait_until(|| {
            let pool = pool2.clone();
            let id = id.clone();
            async move {
                local_matches::get_match(&pool, &id)
                    .await
                    .ok()
                    .flatten()
                    .is_none()
            }
        })
        .await
    );
    manager.shutdown();
}

#[tokio::test]
async fn test_team_replication() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();
    let manager = ReplicationManager::start(pool.clone(), client.clone(), ORG, TID);

    let team = sample_team("Seibukan");
    teams::upsert_team(&client, ORG, TID, &team).await.unwrap();

    let pool2 = pool.clone();
    let id = team.team_id.clone();
    assert!(
        wait_until(|| {
            let pool = pool2.clone();
            let id = id.clone();
            async move {
                local_teams::get_team(&pool, &id)
                    .await
                    .ok()
                    .flatten()
                    .is_some()
            }
        })
        .await
    );
    manager.shutdown();
}

#[tokio::test]
async fn test_group_lifecycle_manages_nested_listeners() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();
    let manager = ReplicationManager::start(pool.clone(), client.clone(), ORG, TID);
    assert_eq!(manager.group_listener_count(), 0);

    // Group appears: mirrored locally, nested listener registered.
    let group = MatchGroup::new("A", "r1", "team-a", "team-b", 1);
    match_groups::upsert_match_group(&client, ORG, TID, &group)
        .await
        .unwrap();

    let manager_ref = &manager;
    assert!(
        wait_until(|| async move { manager_ref.group_listener_count() == 1 }).await
    );

    // A bout under the group flows through the nested listener.
    let bout = sample_team_match(&group.match_group_id, 1);
    team_matches::upsert_team_match(&client, ORG, TID, &bout)
        .await
        .unwrap();

    let pool2 = pool.clone();
    let id = bout.match_id.clone();
    assert!(
        wait_until(|| {
            let pool = pool2.clone();
            let id = id.clone();
            async move {
                local_team_matches::get_team_match(&pool, &id)
                    .await
                    .ok()
                    .flatten()
                    .is_some()
            }
        })
        .await
    );

    // Group removed: nested listener torn down, local bouts dropped.
    match_groups::delete_match_group(&client, ORG, TID, &group.match_group_id)
        .await
        .unwrap();

    let pool2 = pool.clone();
    let gid = group.match_group_id.clone();
    assert!(
        wait_until(|| {
            let pool = pool2.clone();
            let gid = gid.clone();
            async move {
                local_match_groups::get_match_group(&pool, &gid)
                    .await
                    .ok()
                    .flatten()
                    .is_none()
            }
        })
        .await
    );
    assert_eq!(manager.group_listener_count(), 0);
    assert!(local_team_matches::list_by_group(&pool, &group.match_group_id)
        .await
        .unwrap()
        .is_empty());
    manager.shutdown();
}

#[tokio::test]
async fn test_tournament_document_changes_are_mirrored() {
    use shiai::database::local::tournaments as local_tournaments;
    use shiai::database::remote::tournaments;
    use shiai::models::tournaments::TournamentType;

    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();

    let mut tournament = common::sample_tournament(TournamentType::Individual);
    tournament.tournament_id = TID.to_string();
    tournaments::upsert_tournament(&client, &tournament).await.unwrap();
    local_tournaments::put_synced(&pool, &tournament).await.unwrap();

    let manager = ReplicationManager::start(pool.clone(), client.clone(), ORG, TID);

    tournament.name = "Autumn Taikai".to_string();
    tournaments::upsert_tournament(&client, &tournament).await.unwrap();

    let pool2 = pool.clone();
    assert!(
        wait_until(|| {
            let pool = pool2.clone();
            async move {
                local_tournaments::get_tournament(&pool, TID)
                    .await
                    .ok()
                    .flatten()
                    .map(|l| l.record.name == "Autumn Taikai")
                    .unwrap_or(false)
            }
        })
        .await
    );
    manager.shutdown();
}

#[tokio::test]
async fn test_shutdown_releases_subscriptions() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();
    let manager = ReplicationManager::start(pool.clone(), client.clone(), ORG, TID);
    manager.shutdown();

    let record = sample_match("A", 1);
    matches::upsert_match(&client, ORG, TID, &record).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(local_matches::get_match(&pool, &record.match_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_auto_upload_triggers_on_pending_transition() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();
    let sync = Arc::new(CloudSync::new(pool.clone(), client.clone()));

    let (gate_tx, gate_rx) = watch::channel(open_gate());
    let (count_tx, count_rx) = watch::channel(0i64);
    let uploader = AutoUploader::spawn(Arc::clone(&sync), ORG, TID, gate_rx, count_rx);

    let record = sample_match("A", 1);
    local_matches::save_match(&pool, ORG, TID, &record).await.unwrap();
    count_tx.send(1).unwrap();

    let client2 = client.clone();
    assert!(
        wait_until(|| {
            let client = client2.clone();
            async move {
                matches::list_matches(&client, ORG, TID)
                    .await
                    .map(|m| m.len() == 1)
                    .unwrap_or(false)
            }
        })
        .await
    );
    assert_eq!(sync.get_unsynced_count(ORG, TID).await.unwrap(), 0);

    uploader.shutdown();
    drop(gate_tx);
}

#[tokio::test]
async fn test_auto_upload_respects_closed_gate() {
    let pool = mirror_pool().await;
    let client = CloudClient::in_memory();
    let sync = Arc::new(CloudSync::new(pool.clone(), client.clone()));

    let gate = SyncGate {
        is_editing: true,
        ..open_gate()
    };
    let (_gate_tx, gate_rx) = watch::channel(gate);
    let (count_tx, count_rx) = watch::channel(0i64);
    let uploader = AutoUploader::spawn(Arc::clone(&sync), ORG, TID, gate_rx, count_rx);

    local_matches::save_match(&pool, ORG, TID, &sample_match("A", 1))
        .await
        .unwrap();
    count_tx.send(1).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(matches::list_matches(&client, ORG, TID).await.unwrap().is_empty());
    assert_eq!(sync.get_unsynced_count(ORG, TID).await.unwrap(), 1);
    uploader.shutdown();
}
