use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::matches::{MatchPlayers, PlayerSlot};

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "team_matches.ts")]
#[ts(rename_all = "camelCase")]
pub enum MatchWinner {
    PlayerA,
    PlayerB,
    Draw,
}

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "team_matches.ts")]
#[ts(rename_all = "camelCase")]
pub enum WinReason {
    Ippon,
    Hansoku,
    Judgement,
    Forfeit,
}

/// One bout inside a team-vs-team match group.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "team_matches.ts")]
#[ts(rename_all = "camelCase")]
pub struct TeamMatch {
    pub match_id: String,
    pub match_group_id: String,
    pub court_id: String,
    pub round_id: String,
    pub players: MatchPlayers,
    pub is_completed: bool,
    pub winner: Option<MatchWinner>,
    pub win_reason: Option<WinReason>,
    #[ts(type = "number")]
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TeamMatch {
    pub fn new(
        match_group_id: &str,
        court_id: &str,
        round_id: &str,
        player_a: PlayerSlot,
        player_b: PlayerSlot,
        sort_order: i64,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            match_id: Uuid::new_v4().to_string(),
            match_group_id: match_group_id.to_string(),
            court_id: court_id.to_string(),
            round_id: round_id.to_string(),
            players: MatchPlayers { player_a, player_b },
            is_completed: false,
            winner: None,
            win_reason: None,
            sort_order,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn sanitize(&mut self) {
        self.players.clamp_tallies();
    }
}
