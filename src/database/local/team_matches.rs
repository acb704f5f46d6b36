use sqlx::sqlite::SqliteArguments;
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool};

use crate::models::matches::MatchPlayers;
use crate::models::sync::{Local, SyncMeta};
use crate::models::team_matches::{MatchWinner, TeamMatch, WinReason};

#[derive(FromRow)]
struct TeamMatchRow {
    match_id: String,
    match_group_id: String,
    organization_id: String,
    tournament_id: String,
    court_id: String,
    round_id: String,
    players_json: String,
    is_completed: bool,
    winner: Option<String>,
    win_reason: Option<String>,
    sort_order: i64,
    created_at: String,
    updated_at: String,
    is_synced: bool,
    deleted: bool,
}

const COLUMNS: &str = "match_id, match_group_id, organization_id, tournament_id, court_id, \
     round_id, players_json, is_completed, winner, win_reason, sort_order, created_at, \
     updated_at, is_synced, deleted";

fn enum_to_string<T: serde::Serialize>(value: &T) -> Option<String> {
    serde_json::to_string(value)
        .ok()
        .map(|s| s.trim_matches('"').to_string())
}

fn enum_from_string<T: serde::de::DeserializeOwned>(s: &str) -> Option<T> {
    serde_json::from_str(&format!("\"{}\"", s)).ok()
}

fn from_row(row: TeamMatchRow) -> Result<Local<TeamMatch>, String> {
    let players: MatchPlayers = serde_json::from_str(&row.players_json).map_err(|e| {
        format!(
            "Corrupt players payload for team match {}: {}",
            row.match_id, e
        )
    })?;
    Ok(Local {
        record: TeamMatch {
            match_id: row.match_id,
            match_group_id: row.match_group_id,
            court_id: row.court_id,
            round_id: row.round_id,
            players,
            is_completed: row.is_completed,
            winner: row.winner.as_deref().and_then(enum_from_string::<MatchWinner>),
            win_reason: row
                .win_reason
                .as_deref()
                .and_then(enum_from_string::<WinReason>),
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        },
        meta: SyncMeta {
            organization_id: row.organization_id,
            tournament_id: row.tournament_id,
            is_synced: row.is_synced,
            deleted: row.deleted,
        },
    })
}

fn upsert_query(
    organization_id: &str,
    tournament_id: &str,
    record: &TeamMatch,
    is_synced: bool,
) -> Result<sqlx::query::Query<'static, Sqlite, SqliteArguments>, String> {
    let players_json = serde_json::to_string(&record.players).map_err(|e| {
        format!(
            "Failed to encode players for team match {}: {}",
            record.match_id, e
        )
    })?;
    Ok(sqlx::query(
        "INSERT INTO local_team_matches (match_id, match_group_id, organization_id,
             tournament_id, court_id, round_id, players_json, is_completed, winner,
             win_reason, sort_order, created_at, updated_at, is_synced, deleted)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
         ON CONFLICT(match_id) DO UPDATE SET
             match_group_id = excluded.match_group_id,
             organization_id = excluded.organization_id,
             tournament_id = excluded.tournament_id,
             court_id = excluded.court_id,
             round_id = excluded.round_id,
             players_json = excluded.players_json,
             is_completed = excluded.is_completed,
             winner = excluded.winner,
             win_reason = excluded.win_reason,
             sort_order = excluded.sort_order,
             updated_at = excluded.updated_at,
             is_synced = excluded.is_synced,
             deleted = 0",
    )
    .bind(record.match_id.clone())
    .bind(record.match_group_id.clone())
    .bind(organization_id.to_string())
    .bind(tournament_id.to_string())
    .bind(record.court_id.clone())
    .bind(record.round_id.clone())
    .bind(players_json)
    .bind(record.is_completed)
    .bind(record.winner.as_ref().and_then(enum_to_string))
    .bind(record.win_reason.as_ref().and_then(enum_to_string))
    .bind(record.sort_order)
    .bind(record.created_at.clone())
    .bind(record.updated_at.clone())
    .bind(is_synced))
}

pub async fn get_team_match(
    pool: &SqlitePool,
    match_id: &str,
) -> Result<Option<Local<TeamMatch>>, String> {
    let row: Option<TeamMatchRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_team_matches WHERE match_id = ?",
        COLUMNS
    )))
    .bind(match_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| format!("Failed to fetch team match: {}", e))?;

    row.map(from_row).transpose()
}

pub async fn list_by_tournament(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
) -> Result<Vec<Local<TeamMatch>>, String> {
    let rows: Vec<TeamMatchRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_team_matches
         WHERE organization_id = ? AND tournament_id = ? AND deleted = 0
         ORDER BY sort_order ASC",
        COLUMNS
    )))
    .bind(organization_id)
    .bind(tournament_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to list team matches: {}", e))?;

    rows.into_iter().map(from_row).collect()
}

pub async fn list_by_group(
    pool: &SqlitePool,
    match_group_id: &str,
) -> Result<Vec<Local<TeamMatch>>, String> {
    let rows: Vec<TeamMatchRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_team_matches
         WHERE match_group_id = ? AND deleted = 0
         ORDER BY sort_order ASC",
        COLUMNS
    )))
    .bind(match_group_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to list team matches for group: {}", e))?;

    rows.into_iter().map(from_row).collect()
}

pub async fn save_team_match(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    record: &TeamMatch,
) -> Result<(), String> {
    let mut record = record.clone();
    record.sanitize();
    upsert_query(organization_id, tournament_id, &record, false)?
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to save team match: {}", e))?;
    Ok(())
}

pub async fn put_synced(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    record: &TeamMatch,
) -> Result<(), String> {
    let mut record = record.clone();
    record.sanitize();
    upsert_query(organization_id, tournament_id, &record, true)?
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to store team match: {}", e))?;
    Ok(())
}

pub async fn bulk_put_tx(
    conn: &mut SqliteConnection,
    organization_id: &str,
    tournament_id: &str,
    records: &[TeamMatch],
) -> Result<(), String> {
    for record in records {
        let mut record = record.clone();
        record.sanitize();
        upsert_query(organization_id, tournament_id, &record, true)?
            .execute(&mut *conn)
            .await
            .map_err(|e| format!("Failed to store team match: {}", e))?;
    }
    Ok(())
}

pub async fn update_players(
    pool: &SqlitePool,
    match_id: &str,
    players: &MatchPlayers,
) -> Result<(), String> {
    let players_json = serde_json::to_string(players)
        .map_err(|e| format!("Failed to encode players for team match {}: {}", match_id, e))?;
    sqlx::query("UPDATE local_team_matches SET players_json = ? WHERE match_id = ?")
        .bind(players_json)
        .bind(match_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to update team match tallies: {}", e))?;
    Ok(())
}

pub async fn get_unsynced(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
) -> Result<Vec<Local<TeamMatch>>, String> {
    let rows: Vec<TeamMatchRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_team_matches
         WHERE organization_id = ? AND tournament_id = ? AND is_synced = 0",
        COLUMNS
    )))
    .bind(organization_id)
    .bind(tournament_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to list unsynced team matches: {}", e))?;

    rows.into_iter().map(from_row).collect()
}

pub async fn count_unsynced(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
) -> Result<i64, String> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM local_team_matches
         WHERE organization_id = ? AND tournament_id = ? AND is_synced = 0",
    )
    .bind(organization_id)
    .bind(tournament_id)
    .fetch_one(pool)
    .await
    .map_err(|e| format!("Failed to count unsynced team matches: {}", e))
}

pub async fn mark_synced(pool: &SqlitePool, match_id: &str) -> Result<(), String> {
    sqlx::query("UPDATE local_team_matches SET is_synced = 1 WHERE match_id = ?")
        .bind(match_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to mark team match synced: {}", e))?;
    Ok(())
}

pub async fn mark_deleted(pool: &SqlitePool, match_id: &str) -> Result<(), String> {
    sqlx::query("UPDATE local_team_matches SET deleted = 1, is_synced = 0 WHERE match_id = ?")
        .bind(match_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to tombstone team match: {}", e))?;
    Ok(())
}

pub async fn hard_delete(pool: &SqlitePool, match_id: &str) -> Result<(), String> {
    sqlx::query("DELETE FROM local_team_matches WHERE match_id = ?")
        .bind(match_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to delete team match: {}", e))?;
    Ok(())
}

/// Drop every local bout under a match group. Used when the group itself
/// is removed remotely.
pub async fn delete_by_group(pool: &SqlitePool, match_group_id: &str) -> Result<(), String> {
    sqlx::query("DELETE FROM local_team_matches WHERE match_group_id = ?")
        .bind(match_group_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to delete team matches for group: {}", e))?;
    Ok(())
}

pub async fn delete_by_tournament_tx(
    conn: &mut SqliteConnection,
    organization_id: &str,
    tournament_id: &str,
) -> Result<(), String> {
    sqlx::query("DELETE FROM local_team_matches WHERE organization_id = ? AND tournament_id = ?")
        .bind(organization_id)
        .bind(tournament_id)
        .execute(conn)
        .await
        .map_err(|e| format!("Failed to clear team matches for tournament: {}", e))?;
    Ok(())
}

pub async fn clear_all(pool: &SqlitePool) -> Result<(), String> {
    sqlx::query("DELETE FROM local_team_matches")
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to clear team matches: {}", e))?;
    Ok(())
}
