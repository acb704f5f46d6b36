use sqlx::sqlite::SqliteArguments;
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool};

use crate::models::sync::{Local, SyncMeta};
use crate::models::tournaments::{Court, Round, Tournament, TournamentType};

#[derive(FromRow)]
struct TournamentRow {
    tournament_id: String,
    organization_id: String,
    name: String,
    date: String,
    location: String,
    default_match_duration_secs: i64,
    courts_json: String,
    rounds_json: String,
    tournament_type: String,
    created_at: String,
    updated_at: String,
    is_synced: bool,
    deleted: bool,
}

const COLUMNS: &str = "tournament_id, organization_id, name, date, location, \
     default_match_duration_secs, courts_json, rounds_json, tournament_type, \
     created_at, updated_at, is_synced, deleted";

fn type_to_string(t: TournamentType) -> String {
    match serde_json::to_string(&t) {
        Ok(s) => s.trim_matches('"').to_string(),
        Err(_) => "individual".to_string(),
    }
}

fn type_from_string(s: &str) -> TournamentType {
    serde_json::from_str(&format!("\"{}\"", s)).unwrap_or(TournamentType::Individual)
}

fn from_row(row: TournamentRow) -> Result<Local<Tournament>, String> {
    let courts: Vec<Court> = serde_json::from_str(&row.courts_json).map_err(|e| {
        format!(
            "Corrupt courts payload for tournament {}: {}",
            row.tournament_id, e
        )
    })?;
    let rounds: Vec<Round> = serde_json::from_str(&row.rounds_json).map_err(|e| {
        format!(
            "Corrupt rounds payload for tournament {}: {}",
            row.tournament_id, e
        )
    })?;
    let meta = SyncMeta {
        organization_id: row.organization_id.clone(),
        tournament_id: row.tournament_id.clone(),
        is_synced: row.is_synced,
        deleted: row.deleted,
    };
    Ok(Local {
        record: Tournament {
            tournament_id: row.tournament_id,
            organization_id: row.organization_id,
            name: row.name,
            date: row.date,
            location: row.location,
            default_match_duration_secs: row.default_match_duration_secs,
            courts,
            rounds,
            tournament_type: type_from_string(&row.tournament_type),
            created_at: row.created_at,
            updated_at: row.updated_at,
        },
        meta,
    })
}

fn upsert_query(
    record: &Tournament,
    is_synced: bool,
) -> Result<sqlx::query::Query<'static, Sqlite, SqliteArguments>, String> {
    let courts_json = serde_json::to_string(&record.courts).map_err(|e| {
        format!(
            "Failed to encode courts for tournament {}: {}",
            record.tournament_id, e
        )
    })?;
    let rounds_json = serde_json::to_string(&record.rounds).map_err(|e| {
        format!(
            "Failed to encode rounds for tournament {}: {}",
            record.tournament_id, e
        )
    })?;
    Ok(sqlx::query(
        "INSERT INTO local_tournaments (tournament_id, organization_id, name, date, location,
             default_match_duration_secs, courts_json, rounds_json, tournament_type,
             created_at, updated_at, is_synced, deleted)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
         ON CONFLICT(tournament_id) DO UPDATE SET
             organization_id = excluded.organization_id,
             name = excluded.name,
             date = excluded.date,
             location = excluded.location,
             default_match_duration_secs = excluded.default_match_duration_secs,
             courts_json = excluded.courts_json,
             rounds_json = excluded.rounds_json,
             tournament_type = excluded.tournament_type,
             updated_at = excluded.updated_at,
             is_synced = excluded.is_synced,
             deleted = 0",
    )
    .bind(record.tournament_id.clone())
    .bind(record.organization_id.clone())
    .bind(record.name.clone())
    .bind(record.date.clone())
    .bind(record.location.clone())
    .bind(record.default_match_duration_secs)
    .bind(courts_json)
    .bind(rounds_json)
    .bind(type_to_string(record.tournament_type))
    .bind(record.created_at.clone())
    .bind(record.updated_at.clone())
    .bind(is_synced))
}

pub async fn get_tournament(
    pool: &SqlitePool,
    tournament_id: &str,
) -> Result<Option<Local<Tournament>>, String> {
    let row: Option<TournamentRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_tournaments WHERE tournament_id = ?",
        COLUMNS
    )))
    .bind(tournament_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| format!("Failed to fetch tournament: {}", e))?;

    row.map(from_row).transpose()
}

pub async fn list_by_organization(
    pool: &SqlitePool,
    organization_id: &str,
) -> Result<Vec<Local<Tournament>>, String> {
    let rows: Vec<TournamentRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "SELECT {} FROM local_tournaments
         WHERE organization_id = ? AND deleted = 0
         ORDER BY date DESC",
        COLUMNS
    )))
    .bind(organization_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to list tournaments: {}", e))?;

    rows.into_iter().map(from_row).collect()
}

pub async fn save_tournament(pool: &SqlitePool, record: &Tournament) -> Result<(), String> {
    upsert_query(record, false)?
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to save tournament: {}", e))?;
    Ok(())
}

pub async fn put_synced(pool: &SqlitePool, record: &Tournament) -> Result<(), String> {
    upsert_query(record, true)?
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to store tournament: {}", e))?;
    Ok(())
}

pub async fn insert_synced_tx(
    conn: &mut SqliteConnection,
    record: &Tournament,
) -> Result<(), String> {
    upsert_query(record, true)?
        .execute(&mut *conn)
        .await
        .map_err(|e| format!("Failed to store tournament: {}", e))?;
    Ok(())
}

pub async fn mark_synced(pool: &SqlitePool, tournament_id: &str) -> Result<(), String> {
    sqlx::query("UPDATE local_tournaments SET is_synced = 1 WHERE tournament_id = ?")
        .bind(tournament_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to mark tournament synced: {}", e))?;
    Ok(())
}

pub async fn hard_delete(pool: &SqlitePool, tournament_id: &str) -> Result<(), String> {
    sqlx::query("DELETE FROM local_tournaments WHERE tournament_id = ?")
        .bind(tournament_id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to delete tournament: {}", e))?;
    Ok(())
}

pub async fn delete_by_tournament_tx(
    conn: &mut SqliteConnection,
    organization_id: &str,
    tournament_id: &str,
) -> Result<(), String> {
    sqlx::query("DELETE FROM local_tournaments WHERE organization_id = ? AND tournament_id = ?")
        .bind(organization_id)
        .bind(tournament_id)
        .execute(conn)
        .await
        .map_err(|e| format!("Failed to clear tournament record: {}", e))?;
    Ok(())
}

pub async fn clear_all(pool: &SqlitePool) -> Result<(), String> {
    sqlx::query("DELETE FROM local_tournaments")
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to clear tournaments: {}", e))?;
    Ok(())
}
