//! Realtime inbound replication.
//!
//! While sync is enabled (see services/sync.rs), one listener per entity
//! collection mirrors remote changes into the local store, always through
//! the gatekeeper functions in database/local/ so the local-priority rule
//! holds. Team-match listeners are nested per match group and tracked in an
//! explicit registry: created lazily as groups appear, torn down when a
//! group is removed.
//!
//! Changes are applied in the order the remote store delivers them; there is
//! no reordering or batching.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sqlx::SqlitePool;
use tokio::task::JoinHandle;

use crate::database::local;
use crate::database::remote::common::{
    decode, ChangeKind, ChangeReceiver, CloudClient, RemoteChange, Subscription,
};
use crate::database::remote::{match_groups, matches, team_matches, teams, tournaments};
use crate::models::match_groups::MatchGroup;
use crate::models::matches::Match;
use crate::models::team_matches::TeamMatch;
use crate::models::teams::Team;
use crate::models::tournaments::Tournament;

struct GroupListener {
    // Held so dropping the listener releases the remote subscription.
    _subscription: Subscription,
    task: JoinHandle<()>,
}

impl Drop for GroupListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Active nested team-match listeners, keyed by match group id.
#[derive(Default)]
struct GroupRegistry {
    inner: Mutex<HashMap<String, GroupListener>>,
}

impl GroupRegistry {
    fn contains(&self, match_group_id: &str) -> bool {
        self.inner
            .lock()
            .map(|map| map.contains_key(match_group_id))
            .unwrap_or(false)
    }

    fn insert(&self, match_group_id: &str, listener: GroupListener) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(match_group_id.to_string(), listener);
        }
    }

    fn remove(&self, match_group_id: &str) {
        if let Ok(mut map) = self.inner.lock() {
            map.remove(match_group_id);
        }
    }

    fn clear(&self) {
        if let Ok(mut map) = self.inner.lock() {
            map.clear();
        }
    }

    fn len(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or(0)
    }
}

/// Owns every inbound subscription for one tournament scope.
///
/// Start it when the sync gate opens, shut it down when the gate closes or
/// the screen goes away; shutdown releases all subscriptions recursively.
pub struct ReplicationManager {
    subscriptions: Vec<Subscription>,
    tasks: Vec<JoinHandle<()>>,
    groups: Arc<GroupRegistry>,
}

impl ReplicationManager {
    pub fn start(
        pool: SqlitePool,
        client: CloudClient,
        organization_id: &str,
        tournament_id: &str,
    ) -> Self {
        let org = organization_id.to_string();
        let tid = tournament_id.to_string();
        let groups = Arc::new(GroupRegistry::default());
        let mut subscriptions = Vec::new();
        let mut tasks = Vec::new();

        let (rx, sub) = matches::listen_matches(&client, &org, &tid);
        subscriptions.push(sub);
        tasks.push(tokio::spawn(match_apply_loop(
            pool.clone(),
            org.clone(),
            tid.clone(),
            rx,
        )));

        let (rx, sub) = teams::listen_teams(&client, &org, &tid);
        subscriptions.push(sub);
        tasks.push(tokio::spawn(team_apply_loop(
            pool.clone(),
            org.clone(),
            tid.clone(),
            rx,
        )));

        let (rx, sub) = tournaments::listen_tournament(&client, &org, &tid);
        subscriptions.push(sub);
        tasks.push(tokio::spawn(tournament_apply_loop(pool.clone(), rx)));

        let (rx, sub) = match_groups::listen_match_groups(&client, &org, &tid);
        subscriptions.push(sub);
        tasks.push(tokio::spawn(group_apply_loop(
            pool,
            client,
            org,
            tid,
            Arc::clone(&groups),
            rx,
        )));

        Self {
            subscriptions,
            tasks,
            groups,
        }
    }

    /// Number of live nested team-match listeners.
    pub fn group_listener_count(&self) -> usize {
        self.groups.len()
    }

    /// Release every subscription, nested ones included.
    pub fn shutdown(self) {
        for sub in self.subscriptions {
            sub.unsubscribe();
        }
        for task in self.tasks {
            task.abort();
        }
        self.groups.clear();
    }
}

// ============================================================================
// Apply loops
// ============================================================================

async fn match_apply_loop(
    pool: SqlitePool,
    organization_id: String,
    tournament_id: String,
    mut rx: ChangeReceiver,
) {
    while let Some(change) = rx.recv().await {
        if let Err(e) = apply_match_change(&pool, &organization_id, &tournament_id, change).await {
            log::warn!("[replication] match change failed: {}", e);
        }
    }
}

async fn apply_match_change(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    change: RemoteChange,
) -> Result<(), String> {
    match change.kind {
        ChangeKind::Removed => local::apply_match_removed(pool, &change.id).await,
        ChangeKind::Added | ChangeKind::Modified => {
            let Some(doc) = change.doc else {
                return Ok(());
            };
            let record: Match = decode(doc).map_err(|e| e.to_string())?;
            local::apply_match_upsert(pool, organization_id, tournament_id, &record).await
        }
    }
}

async fn team_apply_loop(
    pool: SqlitePool,
    organization_id: String,
    tournament_id: String,
    mut rx: ChangeReceiver,
) {
    while let Some(change) = rx.recv().await {
        if let Err(e) = apply_team_change(&pool, &organization_id, &tournament_id, change).await {
            log::warn!("[replication] team change failed: {}", e);
        }
    }
}

async fn apply_team_change(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    change: RemoteChange,
) -> Result<(), String> {
    match change.kind {
        ChangeKind::Removed => local::apply_team_removed(pool, &change.id).await,
        ChangeKind::Added | ChangeKind::Modified => {
            let Some(doc) = change.doc else {
                return Ok(());
            };
            let record: Team = decode(doc).map_err(|e| e.to_string())?;
            local::apply_team_upsert(pool, organization_id, tournament_id, &record).await
        }
    }
}

async fn tournament_apply_loop(
    pool: SqlitePool,
    mut rx: ChangeReceiver,
) {
    while let Some(change) = rx.recv().await {
        let result = match change.kind {
            ChangeKind::Removed => local::apply_tournament_removed(&pool, &change.id).await,
            ChangeKind::Added | ChangeKind::Modified => match change.doc {
                Some(doc) => match decode::<Tournament>(doc) {
                    Ok(record) => local::apply_tournament_upsert(&pool, &record).await,
                    Err(e) => Err(e.to_string()),
                },
                None => Ok(()),
            },
        };
        if let Err(e) = result {
            log::warn!("[replication] tournament change failed: {}", e);
        }
    }
}

async fn group_apply_loop(
    pool: SqlitePool,
    client: CloudClient,
    organization_id: String,
    tournament_id: String,
    registry: Arc<GroupRegistry>,
    mut rx: ChangeReceiver,
) {
    while let Some(change) = rx.recv().await {
        match change.kind {
            ChangeKind::Removed => {
                // Tear down the nested listener before dropping the local
                // rows, so no late bout event resurrects them.
                registry.remove(&change.id);
                if let Err(e) = local::apply_match_group_removed(&pool, &change.id).await {
                    log::warn!("[replication] group removal failed: {}", e);
                }
            }
            ChangeKind::Added | ChangeKind::Modified => {
                let Some(doc) = change.doc else {
                    continue;
                };
                let record: MatchGroup = match decode(doc) {
                    Ok(record) => record,
                    Err(e) => {
                        log::warn!("[replication] group change failed: {}", e);
                        continue;
                    }
                };
                if let Err(e) = local::apply_match_group_upsert(
                    &pool,
                    &organization_id,
                    &tournament_id,
                    &record,
                )
                .await
                {
                    log::warn!("[replication] group change failed: {}", e);
                    continue;
                }
                ensure_group_listener(
                    &pool,
                    &client,
                    &organization_id,
                    &tournament_id,
                    &registry,
                    &record.match_group_id,
                );
            }
        }
    }
}

fn ensure_group_listener(
    pool: &SqlitePool,
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    registry: &Arc<GroupRegistry>,
    match_group_id: &str,
) {
    if registry.contains(match_group_id) {
        return;
    }
    let (rx, subscription) =
        team_matches::listen_team_matches(client, organization_id, tournament_id, match_group_id);
    let task = tokio::spawn(team_match_apply_loop(
        pool.clone(),
        organization_id.to_string(),
        tournament_id.to_string(),
        rx,
    ));
    registry.insert(
        match_group_id,
        GroupListener {
            _subscription: subscription,
            task,
        },
    );
}

async fn team_match_apply_loop(
    pool: SqlitePool,
    organization_id: String,
    tournament_id: String,
    mut rx: ChangeReceiver,
) {
    while let Some(change) = rx.recv().await {
        if let Err(e) =
            apply_team_match_change(&pool, &organization_id, &tournament_id, change).await
        {
            log::warn!("[replication] team match change failed: {}", e);
        }
    }
}

async fn apply_team_match_change(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    change: RemoteChange,
) -> Result<(), String> {
    match change.kind {
        ChangeKind::Removed => local::apply_team_match_removed(pool, &change.id).await,
        ChangeKind::Added | ChangeKind::Modified => {
            let Some(doc) = change.doc else {
                return Ok(());
            };
            let record: TeamMatch = decode(doc).map_err(|e| e.to_string())?;
            local::apply_team_match_upsert(pool, organization_id, tournament_id, &record).await
        }
    }
}
