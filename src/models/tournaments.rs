use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "tournaments.ts")]
#[ts(rename_all = "camelCase")]
pub enum TournamentType {
    Individual,
    Team,
}

/// A court (shiai-jo) matches are assigned to.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "tournaments.ts")]
#[ts(rename_all = "camelCase")]
pub struct Court {
    pub court_id: String,
    pub name: String,
}

#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "tournaments.ts")]
#[ts(rename_all = "camelCase")]
pub struct Round {
    pub round_id: String,
    pub name: String,
    #[ts(type = "number")]
    pub sort_order: i64,
}

#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "tournaments.ts")]
#[ts(rename_all = "camelCase")]
pub struct Tournament {
    pub tournament_id: String,
    pub organization_id: String,
    pub name: String,
    /// ISO-8601 date of the event day.
    pub date: String,
    pub location: String,
    #[ts(type = "number")]
    pub default_match_duration_secs: i64,
    pub courts: Vec<Court>,
    pub rounds: Vec<Round>,
    pub tournament_type: TournamentType,
    pub created_at: String,
    pub updated_at: String,
}

impl Tournament {
    pub fn new(
        organization_id: &str,
        name: &str,
        date: &str,
        location: &str,
        tournament_type: TournamentType,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            tournament_id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            name: name.to_string(),
            date: date.to_string(),
            location: location.to_string(),
            default_match_duration_secs: 180,
            courts: Vec::new(),
            rounds: Vec::new(),
            tournament_type,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
