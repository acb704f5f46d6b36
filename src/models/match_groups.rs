use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// A team-vs-team encounter: the container for the bouts fought between
/// two teams on one court.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "match_groups.ts")]
#[ts(rename_all = "camelCase")]
pub struct MatchGroup {
    pub match_group_id: String,
    pub court_id: String,
    pub round_id: String,
    pub team_a_id: String,
    pub team_b_id: String,
    pub is_completed: bool,
    #[ts(type = "number")]
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl MatchGroup {
    pub fn new(
        court_id: &str,
        round_id: &str,
        team_a_id: &str,
        team_b_id: &str,
        sort_order: i64,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            match_group_id: Uuid::new_v4().to_string(),
            court_id: court_id.to_string(),
            round_id: round_id.to_string(),
            team_a_id: team_a_id.to_string(),
            team_b_id: team_b_id.to_string(),
            is_completed: false,
            sort_order,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
