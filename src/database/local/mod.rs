// Local mirror store: one SQLite-backed repository per entity plus the
// inbound-write gatekeeper.
//
// The mirror is the single shared mutable resource of the sync engine.
// Every write that originates from the cloud goes through `apply_*` below,
// which enforce the local-priority rule: a record with `is_synced = 0` is
// this device's pending edit and its structural fields are never
// overwritten by inbound replication. Score and hansoku tallies are the
// documented exception and are adopted from the remote copy.

pub mod database;
pub mod match_groups;
pub mod matches;
pub mod team_matches;
pub mod teams;
pub mod tournaments;

use sqlx::SqlitePool;

use crate::models::match_groups::MatchGroup;
use crate::models::matches::Match;
use crate::models::sync::SyncMeta;
use crate::models::team_matches::TeamMatch;
use crate::models::teams::Team;
use crate::models::tournaments::Tournament;

pub use database::{init_in_memory, init_mirror_db, MirrorDb};

/// What an inbound upsert is allowed to do to the mirrored copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundDecision {
    /// No local copy: store the remote record as synced.
    Insert,
    /// Local copy has no pending edit: full overwrite, marked synced.
    Overwrite,
    /// Local copy has pending edits: structural fields stay local.
    LocalWins,
}

pub fn decide_inbound(local: Option<&SyncMeta>) -> InboundDecision {
    match local {
        None => InboundDecision::Insert,
        Some(meta) if meta.is_synced => InboundDecision::Overwrite,
        Some(_) => InboundDecision::LocalWins,
    }
}

/// Inbound add/modify for an individual match.
pub async fn apply_match_upsert(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    remote: &Match,
) -> Result<(), String> {
    let local = matches::get_match(pool, &remote.match_id).await?;
    let decision = decide_inbound(local.as_ref().map(|l| &l.meta));
    if let (InboundDecision::LocalWins, Some(mut local)) = (decision, local) {
        // Tallies are always-live; everything else keeps the local edit.
        local.record.players.adopt_live_fields(&remote.players);
        return matches::update_players(pool, &remote.match_id, &local.record.players).await;
    }
    matches::put_synced(pool, organization_id, tournament_id, remote).await
}

/// Inbound removal for an individual match.
pub async fn apply_match_removed(pool: &SqlitePool, match_id: &str) -> Result<(), String> {
    matches::hard_delete(pool, match_id).await
}

/// Inbound add/modify for a team-match bout.
pub async fn apply_team_match_upsert(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    remote: &TeamMatch,
) -> Result<(), String> {
    let local = team_matches::get_team_match(pool, &remote.match_id).await?;
    let decision = decide_inbound(local.as_ref().map(|l| &l.meta));
    if let (InboundDecision::LocalWins, Some(mut local)) = (decision, local) {
        local.record.players.adopt_live_fields(&remote.players);
        return team_matches::update_players(pool, &remote.match_id, &local.record.players).await;
    }
    team_matches::put_synced(pool, organization_id, tournament_id, remote).await
}

pub async fn apply_team_match_removed(pool: &SqlitePool, match_id: &str) -> Result<(), String> {
    team_matches::hard_delete(pool, match_id).await
}

/// Inbound add/modify for a match group. Groups carry no live tallies, so
/// a pending local edit ignores the inbound value entirely.
pub async fn apply_match_group_upsert(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    remote: &MatchGroup,
) -> Result<(), String> {
    let local = match_groups::get_match_group(pool, &remote.match_group_id).await?;
    match decide_inbound(local.as_ref().map(|l| &l.meta)) {
        InboundDecision::Insert | InboundDecision::Overwrite => {
            match_groups::put_synced(pool, organization_id, tournament_id, remote).await
        }
        InboundDecision::LocalWins => Ok(()),
    }
}

/// Inbound removal for a match group, including its nested bouts.
pub async fn apply_match_group_removed(
    pool: &SqlitePool,
    match_group_id: &str,
) -> Result<(), String> {
    team_matches::delete_by_group(pool, match_group_id).await?;
    match_groups::hard_delete(pool, match_group_id).await
}

pub async fn apply_team_upsert(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    remote: &Team,
) -> Result<(), String> {
    let local = teams::get_team(pool, &remote.team_id).await?;
    match decide_inbound(local.as_ref().map(|l| &l.meta)) {
        InboundDecision::Insert | InboundDecision::Overwrite => {
            teams::put_synced(pool, organization_id, tournament_id, remote).await
        }
        InboundDecision::LocalWins => Ok(()),
    }
}

pub async fn apply_team_removed(pool: &SqlitePool, team_id: &str) -> Result<(), String> {
    teams::hard_delete(pool, team_id).await
}

/// Inbound change to the tournament document itself (name, courts, rounds,
/// settings). A locally edited tournament keeps its pending copy.
pub async fn apply_tournament_upsert(
    pool: &SqlitePool,
    remote: &Tournament,
) -> Result<(), String> {
    let local = tournaments::get_tournament(pool, &remote.tournament_id).await?;
    match decide_inbound(local.as_ref().map(|l| &l.meta)) {
        InboundDecision::Insert | InboundDecision::Overwrite => {
            tournaments::put_synced(pool, remote).await
        }
        InboundDecision::LocalWins => Ok(()),
    }
}

pub async fn apply_tournament_removed(pool: &SqlitePool, tournament_id: &str) -> Result<(), String> {
    tournaments::hard_delete(pool, tournament_id).await
}
