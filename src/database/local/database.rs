use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;

pub struct MirrorDb(pub SqlitePool);

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS local_tournaments (
        tournament_id TEXT PRIMARY KEY,
        organization_id TEXT NOT NULL,
        name TEXT NOT NULL,
        date TEXT NOT NULL,
        location TEXT NOT NULL,
        default_match_duration_secs INTEGER NOT NULL,
        courts_json TEXT NOT NULL,
        rounds_json TEXT NOT NULL,
        tournament_type TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        is_synced INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS local_matches (
        match_id TEXT PRIMARY KEY,
        organization_id TEXT NOT NULL,
        tournament_id TEXT NOT NULL,
        court_id TEXT NOT NULL,
        round_id TEXT NOT NULL,
        players_json TEXT NOT NULL,
        is_completed INTEGER NOT NULL DEFAULT 0,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        is_synced INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_local_matches_scope
        ON local_matches(organization_id, tournament_id)",
    "CREATE TABLE IF NOT EXISTS local_match_groups (
        match_group_id TEXT PRIMARY KEY,
        organization_id TEXT NOT NULL,
        tournament_id TEXT NOT NULL,
        court_id TEXT NOT NULL,
        round_id TEXT NOT NULL,
        team_a_id TEXT NOT NULL,
        team_b_id TEXT NOT NULL,
        is_completed INTEGER NOT NULL DEFAULT 0,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        is_synced INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_local_match_groups_scope
        ON local_match_groups(organization_id, tournament_id)",
    "CREATE TABLE IF NOT EXISTS local_team_matches (
        match_id TEXT PRIMARY KEY,
        match_group_id TEXT NOT NULL,
        organization_id TEXT NOT NULL,
        tournament_id TEXT NOT NULL,
        court_id TEXT NOT NULL,
        round_id TEXT NOT NULL,
        players_json TEXT NOT NULL,
        is_completed INTEGER NOT NULL DEFAULT 0,
        winner TEXT,
        win_reason TEXT,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        is_synced INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_local_team_matches_scope
        ON local_team_matches(organization_id, tournament_id)",
    "CREATE INDEX IF NOT EXISTS idx_local_team_matches_group
        ON local_team_matches(match_group_id)",
    "CREATE TABLE IF NOT EXISTS local_teams (
        team_id TEXT PRIMARY KEY,
        organization_id TEXT NOT NULL,
        tournament_id TEXT NOT NULL,
        name TEXT NOT NULL,
        representative_name TEXT NOT NULL,
        representative_email TEXT NOT NULL,
        players_json TEXT NOT NULL,
        is_approved INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        is_synced INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_local_teams_scope
        ON local_teams(organization_id, tournament_id)",
];

/*
 * Initializes the on-device mirror database, used to store the local copy
 * of tournament data plus per-record sync bookkeeping.
 */
pub async fn init_mirror_db(db_path: &Path) -> Result<MirrorDb, String> {
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create data dir {}: {}", dir.display(), e))?;
    }

    let connect_options = SqliteConnectOptions::new()
        .filename(db_path)
        .journal_mode(SqliteJournalMode::Wal)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(3)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            format!(
                "Failed to connect to mirror database at {}: {}",
                db_path.display(),
                e
            )
        })?;

    create_schema(&pool).await?;
    Ok(MirrorDb(pool))
}

/// In-memory mirror database for tests and ephemeral scoring sessions.
pub async fn init_in_memory() -> Result<MirrorDb, String> {
    let connect_options = SqliteConnectOptions::new().in_memory(true).foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .map_err(|e| format!("Failed to open in-memory mirror database: {}", e))?;

    create_schema(&pool).await?;
    Ok(MirrorDb(pool))
}

async fn create_schema(pool: &SqlitePool) -> Result<(), String> {
    for stmt in SCHEMA {
        sqlx::query(*stmt)
            .execute(pool)
            .await
            .map_err(|e| format!("Failed to initialize mirror schema: {}", e))?;
    }
    Ok(())
}
