use sqlx::sqlite::SqliteArguments;
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool};

use crate::models::match_groups::MatchGroup;
use crate::models::sync::{Local, SyncMeta};

#[derive(FromRow)]
struct MatchGroupRow {
    match_group_id: String,
    organization_id: String,
    tournament_id: String,
    court_id: String,
    round_id: String,
    team_a_id: String,
    team_b_id: String,
    is_completed: bool,
    sort_order: i64,
    created_at: String,
    updated_at: String,
    is_synced: bool,
    deleted: bool,
}

const COLUMNS: &str = "match_group_id, organization_id, tournament_id, court_id, round_id, \
     team_a_id, team_b_id, is_completed, sort_order, created_at, updated_at, is_synced, deleted";

fn from_row(row: MatchGroupRow) -> Local<MatchGroup> {
    Local {
        record: MatchGroup {
            match_group_id: row.match_group_id,
            court_id: row.court_id,
            round_id: row.round_id,
            team_a_id: row.team_a_id,
            team_b_id: row.team_b_id,
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
    }
}

fn upsert_query(
    organization_id: &str,
    tournament_id: &str,
    record: &MatchGroup,
    is_synced: bool,
) -> sqlx::query::Query<'static, Sqlite, SqliteArguments> {
    sqlx::query(
        "INSERT INTO local_match_groups (match_group_id, organization_id, tournament_id,
             court_id, round_id, team_a_id, team_b_id, is_completed, sort_order,
             created_at, updated_at, is_synced, deleted)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
         ON CONFLICT(match_group_id) DO UPDATE SET
             organization_id = excluded.organization_id,
             tournament_id = excluded.tournament_id,
             court_id = excluded.court_id,
             round_id = excluded.round_id,
             team_a_id = excluded.team_a_id,
             team_b_id = excluded.team_b_id,
             is_completed = excluded.is_completed,
             sort_order = excluded.sort_order,
             updated_at = excluded.updated_at,
             is_synced = excluded.is_synced,
             deleted = 0",
    )
    .bind(record.match_group_id.clone())
    .bind(organization_id.to_string())
    .bind(tournament_id.to_string())
    .bind(record.court_id.clone())
    .bind(record.round_id.clone())
    .bind(record.team_a_id.clone())
    .bind(record.team_b_id.clone())
    .bind(record.is_completed)
    .bind(record.sort_order)
    .bind(record.created_at.clone())
    .bind(record.updated_at.clone())
    .bind(is_synced)
}

pub async fn get_match_group(
    pool: &SqlitePool,
    match_group_id: &str,
) -> Result<Option<Local<MatchGroup>>, String> {
    let row: Option<MatchGroupRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_match_groups WHERE match_group_id = ?",
        COLUMNS
    )))
    .bind(match_group_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| format!("Failed to fetch match group: {}", e))?;

    Ok(row.map(from_row))
}

pub async fn list_by_tournament(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
) -> Result<Vec<Local<MatchGroup>>, String> {
    let rows: Vec<MatchGroupRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_match_groups
         WHERE organization_id = ? AND tournament_id = ? AND deleted = 0
         ORDER BY sort_order ASC",
        COLUMNS
    )))
    .bind(organization_id)
    .bind(tournament_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to list match groups: {}", e))?;

    Ok(rows.into_iter().map(from_row).collect())
}

pub async fn save_match_group(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    record: &MatchGroup,
) -> Result<(), String> {
    upsert_query(organization_id, tournament_id, record, false)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to save match group: {}", e))?;
    Ok(())
}

pub async fn put_synced(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    record: &MatchGroup,
) -> Result<(), String> {
    upsert_query(organization_id, tournament_id, record, true)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to store match group: {}", e))?;
    Ok(())
}

pub async fn bulk_put_tx(
    conn: &mut SqliteConnection,
    organization_id: &str,
    tournament_id: &str,
    records: &[MatchGroup],
) -> Result<(), String> {
    for record in records {
        upsert_query(organization_id, tournament_id, record, true)
            .execute(&mut *conn)
            .await
            .map_err(|e| format!("Failed to store match group: {}", e))?;
    }
    Ok(())
}

pub async fn get_unsynced(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
) -> Result<Vec<Local<MatchGroup>>, String> {
    let rows: Vec<MatchGroupRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_match_groups
         WHERE organization_id = ? AND tournament_id = ? AND is_synced = 0",
        COLUMNS
    )))
    .bind(organization_id)
    .bind(tournament_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to list unsynced match groups: {}", e))?;

    Ok(rows.into_iter().map(from_row).collect())
}

pub async fn count_unsynced(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
) -> Result<i64, String> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM local_match_groups
         WHERE organization_id = ? AND tournament_id = ? AND is_synced = 0",
    )
    .bind(organization_id)
    .bind(tournament_id)
    .fetch_one(pool)
    .await
    .map_err(|e| format!("Failed to count unsynced match groups: {}", e))
}

pub async fn mark_synced(pool: &SqlitePool, match_group_id: &str) -> Result<(), String> {
    sqlx::query("UPDATE local_match_groups SET is_synced = 1 WHERE match_group_id = ?")
        .bind(match_group_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to mark match group synced: {}", e))?;
    Ok(())
}

pub async fn mark_deleted(pool: &SqlitePool, match_group_id: &str) -> Result<(), String> {
    sqlx::query("UPDATE local_match_groups SET deleted = 1, is_synced = 0 WHERE match_group_id = ?")
        .bind(match_group_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to tombstone match group: {}", e))?;
    Ok(())
}

pub async fn hard_delete(pool: &SqlitePool, match_group_id: &str) -> Result<(), String> {
    sqlx::query("DELETE FROM local_match_groups WHERE match_group_id = ?")
        .bind(match_group_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to delete match group: {}", e))?;
    Ok(())
}

pub async fn delete_by_tournament_tx(
    conn: &mut SqliteConnection,
    organization_id: &str,
    tournament_id: &str,
) -> Result<(), String> {
    sqlx::query("DELETE FROM local_match_groups WHERE organization_id = ? AND tournament_id = ?")
        .bind(organization_id)
        .bind(tournament_id)
        .execute(conn)
        .await
        .map_err(|e| format!("Failed to clear match groups for tournament: {}", e))?;
    Ok(())
}

pub async fn clear_all(pool: &SqlitePool) -> Result<(), String> {
    sqlx::query("DELETE FROM local_match_groups")
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to clear match groups: {}", e))?;
    Ok(())
}
