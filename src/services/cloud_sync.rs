//! Cloud sync orchestration service
//!
//! Coordinates syncing between the local mirror store and the cloud
//! document store:
//! 1. Bootstrap download: destructive full replace of a tournament's local
//!    data from the cloud (via database/local/ + database/remote/)
//! 2. Incremental upload: pushes only unsynced/tombstoned local records
//! 3. Full-tournament push for publishing a locally created tournament,
//!    raced against a fixed deadline

use std::fmt;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::database::local::{
    match_groups as local_match_groups, matches as local_matches,
    team_matches as local_team_matches, teams as local_teams, tournaments as local_tournaments,
};
use crate::database::remote::common::{CloudClient, CloudError};
use crate::database::remote::{match_groups, matches, team_matches, teams, tournaments};
use crate::models::match_groups::MatchGroup;
use crate::models::matches::Match;
use crate::models::sync::Local;
use crate::models::team_matches::TeamMatch;
use crate::models::tournaments::{Tournament, TournamentType};

/// Deadline for the full-tournament push. When it elapses the caller is told
/// the push failed; the in-flight writes are not cancelled, so a late
/// completion simply goes unobserved (at-least-once).
pub const FULL_PUSH_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug)]
pub enum SyncError {
    /// Invoked while the device reports offline; nothing was attempted.
    Offline,
    /// The remote tournament document does not exist.
    TournamentNotFound { tournament_id: String },
    /// The full-tournament push did not settle within the deadline.
    Timeout,
    /// Error from a cloud document operation.
    Remote(CloudError),
    /// Error from a local mirror operation.
    LocalDb(String),
}

impl From<CloudError> for SyncError {
    fn from(e: CloudError) -> Self {
        SyncError::Remote(e)
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Offline => write!(f, "Device is offline"),
            SyncError::TournamentNotFound { tournament_id } => {
                write!(f, "Tournament {} was not found in the cloud", tournament_id)
            }
            SyncError::Timeout => write!(f, "Cloud sync timed out"),
            SyncError::Remote(e) => write!(f, "Cloud sync error: {}", e),
            SyncError::LocalDb(msg) => write!(f, "Local DB error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

// ============================================================================
// Sync Orchestrator
// ============================================================================

/// Sync orchestrator over the mirror pool and the cloud client.
///
/// Connectivity is passed explicitly by the caller on every operation; the
/// engine owns no ambient online flag.
pub struct CloudSync {
    pool: SqlitePool,
    client: CloudClient,
}

impl CloudSync {
    pub fn new(pool: SqlitePool, client: CloudClient) -> Self {
        Self { pool, client }
    }

    // ========================================================================
    // Bootstrap download
    // ========================================================================

    /// Replace the local copy of a tournament with the cloud state.
    ///
    /// Destructive: any unsynced local edits for this tournament are lost.
    /// Callers must warn the user before invoking. The local replace happens
    /// in one transaction, after every remote fetch has succeeded.
    pub async fn download_tournament_data(
        &self,
        organization_id: &str,
        tournament_id: &str,
        online: bool,
    ) -> Result<(), SyncError> {
        if !online {
            return Err(SyncError::Offline);
        }

        let tournament = tournaments::get_tournament(&self.client, organization_id, tournament_id)
            .await?
            .ok_or_else(|| SyncError::TournamentNotFound {
                tournament_id: tournament_id.to_string(),
            })?;

        let team_records = teams::list_teams(&self.client, organization_id, tournament_id).await?;

        let mut match_records: Vec<Match> = Vec::new();
        let mut group_records: Vec<MatchGroup> = Vec::new();
        let mut team_match_records: Vec<TeamMatch> = Vec::new();
        match tournament.tournament_type {
            TournamentType::Individual => {
                match_records =
                    matches::list_matches(&self.client, organization_id, tournament_id).await?;
            }
            TournamentType::Team => {
                group_records =
                    match_groups::list_match_groups(&self.client, organization_id, tournament_id)
                        .await?;
                for group in &group_records {
                    let bouts = team_matches::list_team_matches(
                        &self.client,
                        organization_id,
                        tournament_id,
                        &group.match_group_id,
                    )
                    .await?;
                    team_match_records.extend(bouts);
                }
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SyncError::LocalDb(format!("Failed to open transaction: {}", e)))?;

        local_tournaments::delete_by_tournament_tx(&mut tx, organization_id, tournament_id)
            .await
            .map_err(SyncError::LocalDb)?;
        local_matches::delete_by_tournament_tx(&mut tx, organization_id, tournament_id)
            .await
            .map_err(SyncError::LocalDb)?;
        local_match_groups::delete_by_tournament_tx(&mut tx, organization_id, tournament_id)
            .await
            .map_err(SyncError::LocalDb)?;
        local_team_matches::delete_by_tournament_tx(&mut tx, organization_id, tournament_id)
            .await
            .map_err(SyncError::LocalDb)?;
        local_teams::delete_by_tournament_tx(&mut tx, organization_id, tournament_id)
            .await
            .map_err(SyncError::LocalDb)?;

        local_tournaments::insert_synced_tx(&mut tx, &tournament)
            .await
            .map_err(SyncError::LocalDb)?;
        local_teams::bulk_put_tx(&mut tx, organization_id, tournament_id, &team_records)
            .await
            .map_err(SyncError::LocalDb)?;
        local_matches::bulk_put_tx(&mut tx, organization_id, tournament_id, &match_records)
            .await
            .map_err(SyncError::LocalDb)?;
        local_match_groups::bulk_put_tx(&mut tx, organization_id, tournament_id, &group_records)
            .await
            .map_err(SyncError::LocalDb)?;
        local_team_matches::bulk_put_tx(&mut tx, organization_id, tournament_id, &team_match_records)
            .await
            .map_err(SyncError::LocalDb)?;

        tx.commit()
            .await
            .map_err(|e| SyncError::LocalDb(format!("Failed to commit download: {}", e)))?;

        log::info!(
            "[sync] downloaded tournament {} ({} teams, {} matches, {} groups, {} team matches)",
            tournament_id,
            team_records.len(),
            match_records.len(),
            group_records.len(),
            team_match_records.len()
        );
        Ok(())
    }

    // ========================================================================
    // Incremental upload
    // ========================================================================

    /// Push every unsynced local record for the tournament. Returns the
    /// number of records successfully synced. Each record's push is
    /// isolated: one failure is logged and skipped, never fatal to the
    /// batch, and the record stays unsynced for the next pass.
    pub async fn upload_results(
        &self,
        organization_id: &str,
        tournament_id: &str,
        online: bool,
    ) -> Result<usize, SyncError> {
        if !online {
            return Err(SyncError::Offline);
        }

        let pending_matches =
            local_matches::get_unsynced(&self.pool, organization_id, tournament_id)
                .await
                .map_err(SyncError::LocalDb)?;
        let pending_groups =
            local_match_groups::get_unsynced(&self.pool, organization_id, tournament_id)
                .await
                .map_err(SyncError::LocalDb)?;
        let pending_team_matches =
            local_team_matches::get_unsynced(&self.pool, organization_id, tournament_id)
                .await
                .map_err(SyncError::LocalDb)?;

        if pending_matches.is_empty()
            && pending_groups.is_empty()
            && pending_team_matches.is_empty()
        {
            return Ok(0);
        }

        // Per-record pushes run concurrently; the spawn order (matches,
        // groups, team matches) is advisory since groups are pushed as full
        // documents.
        let mut set: JoinSet<bool> = JoinSet::new();
        for record in pending_matches {
            let pool = self.pool.clone();
            let client = self.client.clone();
            let org = organization_id.to_string();
            let tid = tournament_id.to_string();
            set.spawn(async move { push_match(&pool, &client, &org, &tid, record).await });
        }
        for record in pending_groups {
            let pool = self.pool.clone();
            let client = self.client.clone();
            let org = organization_id.to_string();
            let tid = tournament_id.to_string();
            set.spawn(async move { push_match_group(&pool, &client, &org, &tid, record).await });
        }
        for record in pending_team_matches {
            let pool = self.pool.clone();
            let client = self.client.clone();
            let org = organization_id.to_string();
            let tid = tournament_id.to_string();
            set.spawn(async move { push_team_match(&pool, &client, &org, &tid, record).await });
        }

        let mut synced = 0;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(true) => synced += 1,
                Ok(false) => {}
                Err(e) => log::warn!("[sync] upload task failed: {}", e),
            }
        }

        log::info!(
            "[sync] uploaded {} records for tournament {}",
            synced,
            tournament_id
        );
        Ok(synced)
    }

    // ========================================================================
    // Full-tournament push
    // ========================================================================

    /// Publish a locally created or edited tournament and all of its current
    /// records to the cloud, raced against [`FULL_PUSH_TIMEOUT`].
    pub async fn save_tournament(
        &self,
        tournament: &Tournament,
        online: bool,
    ) -> Result<(), SyncError> {
        if !online {
            return Err(SyncError::Offline);
        }

        match timeout(FULL_PUSH_TIMEOUT, self.push_tournament_snapshot(tournament)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout),
        }
    }

    async fn push_tournament_snapshot(&self, tournament: &Tournament) -> Result<(), SyncError> {
        let organization_id = tournament.organization_id.as_str();
        let tournament_id = tournament.tournament_id.as_str();

        tournaments::upsert_tournament(&self.client, tournament).await?;

        let team_records =
            local_teams::list_by_tournament(&self.pool, organization_id, tournament_id)
                .await
                .map_err(SyncError::LocalDb)?;
        for local in &team_records {
            teams::upsert_team(&self.client, organization_id, tournament_id, &local.record).await?;
            local_teams::mark_synced(&self.pool, &local.record.team_id)
                .await
                .map_err(SyncError::LocalDb)?;
        }

        match tournament.tournament_type {
            TournamentType::Individual => {
                let records =
                    local_matches::list_by_tournament(&self.pool, organization_id, tournament_id)
                        .await
                        .map_err(SyncError::LocalDb)?;
                for local in &records {
                    matches::upsert_match(
                        &self.client,
                        organization_id,
                        tournament_id,
                        &local.record,
                    )
                    .await?;
                    local_matches::mark_synced(&self.pool, &local.record.match_id)
                        .await
                        .map_err(SyncError::LocalDb)?;
                }
            }
            TournamentType::Team => {
                let groups = local_match_groups::list_by_tournament(
                    &self.pool,
                    organization_id,
                    tournament_id,
                )
                .await
                .map_err(SyncError::LocalDb)?;
                for local in &groups {
                    match_groups::upsert_match_group(
                        &self.client,
                        organization_id,
                        tournament_id,
                        &local.record,
                    )
                    .await?;
                    local_match_groups::mark_synced(&self.pool, &local.record.match_group_id)
                        .await
                        .map_err(SyncError::LocalDb)?;
                }
                let bouts = local_team_matches::list_by_tournament(
                    &self.pool,
                    organization_id,
                    tournament_id,
                )
                .await
                .map_err(SyncError::LocalDb)?;
                for local in &bouts {
                    team_matches::upsert_team_match(
                        &self.client,
                        organization_id,
                        tournament_id,
                        &local.record,
                    )
                    .await?;
                    local_team_matches::mark_synced(&self.pool, &local.record.match_id)
                        .await
                        .map_err(SyncError::LocalDb)?;
                }
            }
        }

        local_tournaments::put_synced(&self.pool, tournament)
            .await
            .map_err(SyncError::LocalDb)?;
        Ok(())
    }

    // ========================================================================
    // Bookkeeping
    // ========================================================================

    /// Records still waiting for a push, across matches, match groups and
    /// team matches.
    pub async fn get_unsynced_count(
        &self,
        organization_id: &str,
        tournament_id: &str,
    ) -> Result<i64, SyncError> {
        let matches = local_matches::count_unsynced(&self.pool, organization_id, tournament_id)
            .await
            .map_err(SyncError::LocalDb)?;
        let groups = local_match_groups::count_unsynced(&self.pool, organization_id, tournament_id)
            .await
            .map_err(SyncError::LocalDb)?;
        let team_matches =
            local_team_matches::count_unsynced(&self.pool, organization_id, tournament_id)
                .await
                .map_err(SyncError::LocalDb)?;
        Ok(matches + groups + team_matches)
    }

    /// Wipe every mirrored collection, any tournament. Local-only; the cloud
    /// is untouched.
    pub async fn clear_local_data(&self) -> Result<(), SyncError> {
        local_matches::clear_all(&self.pool)
            .await
            .map_err(SyncError::LocalDb)?;
        local_match_groups::clear_all(&self.pool)
            .await
            .map_err(SyncError::LocalDb)?;
        local_team_matches::clear_all(&self.pool)
            .await
            .map_err(SyncError::LocalDb)?;
        local_teams::clear_all(&self.pool)
            .await
            .map_err(SyncError::LocalDb)?;
        local_tournaments::clear_all(&self.pool)
            .await
            .map_err(SyncError::LocalDb)?;
        Ok(())
    }
}

// ============================================================================
// Per-record pushes
// ============================================================================
//
// Each push is strictly ordered internally: the local bookkeeping update
// only happens after the remote write acknowledges.

async fn push_match(
    pool: &SqlitePool,
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    record: Local<Match>,
) -> bool {
    let match_id = record.record.match_id.clone();
    let result = if record.meta.deleted {
        match matches::delete_match(client, organization_id, tournament_id, &match_id).await {
            Ok(()) => local_matches::hard_delete(pool, &match_id).await,
            Err(e) => Err(e.to_string()),
        }
    } else {
        match matches::upsert_match(client, organization_id, tournament_id, &record.record).await {
            Ok(()) => local_matches::mark_synced(pool, &match_id).await,
            Err(e) => Err(e.to_string()),
        }
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("[sync] match {} failed to sync: {}", match_id, e);
            false
        }
    }
}

async fn push_match_group(
    pool: &SqlitePool,
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    record: Local<MatchGroup>,
) -> bool {
    let group_id = record.record.match_group_id.clone();
    let result = if record.meta.deleted {
        match match_groups::delete_match_group(client, organization_id, tournament_id, &group_id)
            .await
        {
            Ok(()) => local_match_groups::hard_delete(pool, &group_id).await,
            Err(e) => Err(e.to_string()),
        }
    } else {
        match match_groups::upsert_match_group(
            client,
            organization_id,
            tournament_id,
            &record.record,
        )
        .await
        {
            Ok(()) => local_match_groups::mark_synced(pool, &group_id).await,
            Err(e) => Err(e.to_string()),
        }
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("[sync] match group {} failed to sync: {}", group_id, e);
            false
        }
    }
}

async fn push_team_match(
    pool: &SqlitePool,
    client: &CloudClient,
    organization_id: &str,
    tournament_id: &str,
    record: Local<TeamMatch>,
) -> bool {
    let match_id = record.record.match_id.clone();
    let group_id = record.record.match_group_id.clone();
    let result = if record.meta.deleted {
        match team_matches::delete_team_match(
            client,
            organization_id,
            tournament_id,
            &group_id,
            &match_id,
        )
        .await
        {
            Ok(()) => local_team_matches::hard_delete(pool, &match_id).await,
            Err(e) => Err(e.to_string()),
        }
    } else {
        match team_matches::upsert_team_match(
            client,
            organization_id,
            tournament_id,
            &record.record,
        )
        .await
        {
            Ok(()) => local_team_matches::mark_synced(pool, &match_id).await,
            Err(e) => Err(e.to_string()),
        }
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("[sync] team match {} failed to sync: {}", match_id, e);
            false
        }
    }
}
