use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "teams.ts")]
#[ts(rename_all = "camelCase")]
pub struct TeamPlayer {
    pub player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
}

impl TeamPlayer {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            player_id: Uuid::new_v4().to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            display_name: format!("{} {}", first_name, last_name),
        }
    }
}

#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "teams.ts")]
#[ts(rename_all = "camelCase")]
pub struct Team {
    pub team_id: String,
    pub name: String,
    pub representative_name: String,
    pub representative_email: String,
    pub players: Vec<TeamPlayer>,
    pub is_approved: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Team {
    pub fn new(name: &str, representative_name: &str, representative_email: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            team_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            representative_name: representative_name.to_string(),
            representative_email: representative_email.to_string(),
            players: Vec::new(),
            is_approved: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
