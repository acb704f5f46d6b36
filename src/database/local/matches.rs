use sqlx::sqlite::SqliteArguments;
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool};

use crate::models::matches::{Match, MatchPlayers};
use crate::models::sync::{Local, SyncMeta};

#[derive(FromRow)]
struct MatchRow {
    match_id: String,
    organization_id: String,
    tournament_id: String,
    court_id: String,
    round_id: String,
    players_json: String,
    is_completed: bool,
    sort_order: i64,
    created_at: String,
    updated_at: String,
    is_synced: bool,
    deleted: bool,
}

const COLUMNS: &str = "match_id, organization_id, tournament_id, court_id, round_id, \
     players_json, is_completed, sort_order, created_at, updated_at, is_synced, deleted";

fn from_row(row: MatchRow) -> Result<Local<Match>, String> {
    let players: MatchPlayers = serde_json::from_str(&row.players_json)
        .map_err(|e| format!("Corrupt players payload for match {}: {}", row.match_id, e))?;
    Ok(Local {
        record: Match {
            match_id: row.match_id,
            court_id: row.court_id,
            round_id: row.round_id,
            players,
            is_completed: row.is_completed,
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
    record: &Match,
    is_synced: bool,
) -> Result<sqlx::query::Query<'static, Sqlite, SqliteArguments>, String> {
    let players_json = serde_json::to_string(&record.players)
        .map_err(|e| format!("Failed to encode players for match {}: {}", record.match_id, e))?;
    Ok(sqlx::query(
        "INSERT INTO local_matches (match_id, organization_id, tournament_id, court_id, round_id,
             players_json, is_completed, sort_order, created_at, updated_at, is_synced, deleted)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
         ON CONFLICT(match_id) DO UPDATE SET
             organization_id = excluded.organization_id,
             tournament_id = excluded.tournament_id,
             court_id = excluded.court_id,
             round_id = excluded.round_id,
             players_json = excluded.players_json,
             is_completed = excluded.is_completed,
             sort_order = excluded.sort_order,
             updated_at = excluded.updated_at,
             is_synced = excluded.is_synced,
             deleted = 0",
    )
    .bind(record.match_id.clone())
    .bind(organization_id.to_string())
    .bind(tournament_id.to_string())
    .bind(record.court_id.clone())
    .bind(record.round_id.clone())
    .bind(players_json)
    .bind(record.is_completed)
    .bind(record.sort_order)
    .bind(record.created_at.clone())
    .bind(record.updated_at.clone())
    .bind(is_synced))
}

pub async fn get_match(pool: &SqlitePool, match_id: &str) -> Result<Option<Local<Match>>, String> {
    let row: Option<MatchRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_matches WHERE match_id = ?",
        COLUMNS
    )))
    .bind(match_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| format!("Failed to fetch match: {}", e))?;

    row.map(from_row).transpose()
}

/// Visible matches for a tournament, tombstones excluded.
pub async fn list_by_tournament(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
) -> Result<Vec<Local<Match>>, String> {
    let rows: Vec<MatchRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_matches
         WHERE organization_id = ? AND tournament_id = ? AND deleted = 0
         ORDER BY sort_order ASC",
        COLUMNS
    )))
    .bind(organization_id)
    .bind(tournament_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to list matches: {}", e))?;

    rows.into_iter().map(from_row).collect()
}

/// Persist a local edit. The record becomes the pending copy for this device
/// and will be pushed by the next upload pass.
pub async fn save_match(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    record: &Match,
) -> Result<(), String> {
    let mut record = record.clone();
    record.sanitize();
    upsert_query(organization_id, tournament_id, &record, false)?
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to save match: {}", e))?;
    Ok(())
}

/// Trusted write from the cloud: full overwrite, marked synced.
pub async fn put_synced(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    record: &Match,
) -> Result<(), String> {
    let mut record = record.clone();
    record.sanitize();
    upsert_query(organization_id, tournament_id, &record, true)?
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to store match: {}", e))?;
    Ok(())
}

/// Bulk insert of trusted cloud records inside a caller-owned transaction,
/// used by the bootstrap download.
pub async fn bulk_put_tx(
    conn: &mut SqliteConnection,
    organization_id: &str,
    tournament_id: &str,
    records: &[Match],
) -> Result<(), String> {
    for record in records {
        let mut record = record.clone();
        record.sanitize();
        upsert_query(organization_id, tournament_id, &record, true)?
            .execute(&mut *conn)
            .await
            .map_err(|e| format!("Failed to store match: {}", e))?;
    }
    Ok(())
}

/// Adopt remote live tallies onto a record with pending local edits,
/// leaving every structural field and the unsynced flag untouched.
pub async fn update_players(
    pool: &SqlitePool,
    match_id: &str,
    players: &MatchPlayers,
) -> Result<(), String> {
    let players_json = serde_json::to_string(players)
        .map_err(|e| format!("Failed to encode players for match {}: {}", match_id, e))?;
    sqlx::query("UPDATE local_matches SET players_json = ? WHERE match_id = ?")
        .bind(players_json)
        .bind(match_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to update match tallies: {}", e))?;
    Ok(())
}

/// Pending records for the upload pass, tombstones included.
pub async fn get_unsynced(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
) -> Result<Vec<Local<Match>>, String> {
    let rows: Vec<MatchRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_matches
         WHERE organization_id = ? AND tournament_id = ? AND is_synced = 0",
        COLUMNS
    )))
    .bind(organization_id)
    .bind(tournament_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to list unsynced matches: {}", e))?;

    rows.into_iter().map(from_row).collect()
}

pub async fn count_unsynced(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
) -> Result<i64, String> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM local_matches
         WHERE organization_id = ? AND tournament_id = ? AND is_synced = 0",
    )
    .bind(organization_id)
    .bind(tournament_id)
    .fetch_one(pool)
    .await
    .map_err(|e| format!("Failed to count unsynced matches: {}", e))
}

pub async fn mark_synced(pool: &SqlitePool, match_id: &str) -> Result<(), String> {
    sqlx::query("UPDATE local_matches SET is_synced = 1 WHERE match_id = ?")
        .bind(match_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to mark match synced: {}", e))?;
    Ok(())
}

/// Soft-delete: the tombstone stays queryable until the delete is pushed.
pub async fn mark_deleted(pool: &SqlitePool, match_id: &str) -> Result<(), String> {
    sqlx::query("UPDATE local_matches SET deleted = 1, is_synced = 0 WHERE match_id = ?")
        .bind(match_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to tombstone match: {}", e))?;
    Ok(())
}

pub async fn hard_delete(pool: &SqlitePool, match_id: &str) -> Result<(), String> {
    sqlx::query("DELETE FROM local_matches WHERE match_id = ?")
        .bind(match_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to delete match: {}", e))?;
    Ok(())
}

pub async fn delete_by_tournament_tx(
    conn: &mut SqliteConnection,
    organization_id: &str,
    tournament_id: &str,
) -> Result<(), String> {
    sqlx::query("DELETE FROM local_matches WHERE organization_id = ? AND tournament_id = ?")
        .bind(organization_id)
        .bind(tournament_id)
        .execute(conn)
        .await
        .map_err(|e| format!("Failed to clear matches for tournament: {}", e))?;
    Ok(())
}

pub async fn clear_all(pool: &SqlitePool) -> Result<(), String> {
    sqlx::query("DELETE FROM local_matches")
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to clear matches: {}", e))?;
    Ok(())
}
