use sqlx::sqlite::SqliteArguments;
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool};

use crate::models::sync::{Local, SyncMeta};
use crate::models::teams::{Team, TeamPlayer};

#[derive(FromRow)]
struct TeamRow {
    team_id: String,
    organization_id: String,
    tournament_id: String,
    name: String,
    representative_name: String,
    representative_email: String,
    players_json: String,
    is_approved: bool,
    created_at: String,
    updated_at: String,
    is_synced: bool,
    deleted: bool,
}

const COLUMNS: &str = "team_id, organization_id, tournament_id, name, representative_name, \
     representative_email, players_json, is_approved, created_at, updated_at, is_synced, deleted";

fn from_row(row: TeamRow) -> Result<Local<Team>, String> {
    let players: Vec<TeamPlayer> = serde_json::from_str(&row.players_json)
        .map_err(|e| format!("Corrupt roster payload for team {}: {}", row.team_id, e))?;
    Ok(Local {
        record: Team {
            team_id: row.team_id,
            name: row.name,
            representative_name: row.representative_name,
            representative_email: row.representative_email,
            players,
            is_approved: row.is_approved,
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
    record: &Team,
    is_synced: bool,
) -> Result<sqlx::query::Query<'static, Sqlite, SqliteArguments>, String> {
    let players_json = serde_json::to_string(&record.players)
        .map_err(|e| format!("Failed to encode roster for team {}: {}", record.team_id, e))?;
    Ok(sqlx::query(
        "INSERT INTO local_teams (team_id, organization_id, tournament_id, name,
             representative_name, representative_email, players_json, is_approved,
             created_at, updated_at, is_synced, deleted)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
         ON CONFLICT(team_id) DO UPDATE SET
             organization_id = excluded.organization_id,
             tournament_id = excluded.tournament_id,
             name = excluded.name,
             representative_name = excluded.representative_name,
             representative_email = excluded.representative_email,
             players_json = excluded.players_json,
             is_approved = excluded.is_approved,
             updated_at = excluded.updated_at,
             is_synced = excluded.is_synced,
             deleted = 0",
    )
    .bind(record.team_id.clone())
    .bind(organization_id.to_string())
    .bind(tournament_id.to_string())
    .bind(record.name.clone())
    .bind(record.representative_name.clone())
    .bind(record.representative_email.clone())
    .bind(players_json)
    .bind(record.is_approved)
    .bind(record.created_at.clone())
    .bind(record.updated_at.clone())
    .bind(is_synced))
}

pub async fn get_team(pool: &SqlitePool, team_id: &str) -> Result<Option<Local<Team>>, String> {
    let row: Option<TeamRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_teams WHERE team_id = ?",
        COLUMNS
    )))
    .bind(team_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| format!("Failed to fetch team: {}", e))?;

    row.map(from_row).transpose()
}

pub async fn list_by_tournament(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
) -> Result<Vec<Local<Team>>, String> {
    let rows: Vec<TeamRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_teams
         WHERE organization_id = ? AND tournament_id = ? AND deleted = 0
         ORDER BY name ASC",
        COLUMNS
    )))
    .bind(organization_id)
    .bind(tournament_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to list teams: {}", e))?;

    rows.into_iter().map(from_row).collect()
}

pub async fn save_team(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    record: &Team,
) -> Result<(), String> {
    upsert_query(organization_id, tournament_id, record, false)?
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to save team: {}", e))?;
    Ok(())
}

pub async fn put_synced(
    pool: &SqlitePool,
    organization_id: &str,
    tournament_id: &str,
    record: &Team,
) -> Result<(), String> {
    upsert_query(organization_id, tournament_id, record, true)?
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to store team: {}", e))?;
    Ok(())
}

pub async fn bulk_put_tx(
    conn: &mut SqliteConnection,
    organization_id: &str,
    tournament_id: &str,
    records: &[Team],
) -> Result<(), String> {
    for record in records {
        upsert_query(organization_id, tournament_id, record, true)?
            .execute(&mut *conn)
            .await
            .map_err(|e| format!("Failed to store team: {}", e))?;
    }
    Ok(())
}

pub async fn mark_synced(pool: &SqlitePool, team_id: &str) -> Result<(), String> {
    sqlx::query("UPDATE local_teams SET is_synced = 1 WHERE team_id = ?")
        .bind(team_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to mark team synced: {}", e))?;
    Ok(())
}

pub async fn hard_delete(pool: &SqlitePool, team_id: &str) -> Result<(), String> {
    sqlx::query("DELETE FROM local_teams WHERE team_id = ?")
        .bind(team_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to delete team: {}", e))?;
    Ok(())
}

pub async fn delete_by_tournament_tx(
    conn: &mut SqliteConnection,
    organization_id: &str,
    tournament_id: &str,
) -> Result<(), String> {
    sqlx::query("DELETE FROM local_teams WHERE organization_id = ? AND tournament_id = ?")
        .bind(organization_id)
        .bind(tournament_id)
        .execute(conn)
        .await
        .map_err(|e| format!("Failed to clear teams for tournament: {}", e))?;
    Ok(())
}

pub async fn clear_all(pool: &SqlitePool) -> Result<(), String> {
    sqlx::query("DELETE FROM local_teams")
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to clear teams: {}", e))?;
    Ok(())
}
