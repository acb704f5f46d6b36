use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Highest point score a player can hold in one bout (ippon counting).
pub const MAX_SCORE: u8 = 2;
/// Highest penalty count a player can accumulate in one bout.
pub const MAX_HANSOKU: u8 = 4;

/// One side of a bout: who is fighting and their live tallies.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "matches.ts")]
#[ts(rename_all = "camelCase")]
pub struct PlayerSlot {
    pub player_id: String,
    pub team_id: String,
    pub display_name: String,
    pub team_name: String,
    #[ts(type = "number")]
    pub score: u8,
    #[ts(type = "number")]
    pub hansoku: u8,
}

impl PlayerSlot {
    pub fn new(player_id: &str, team_id: &str, display_name: &str, team_name: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            team_id: team_id.to_string(),
            display_name: display_name.to_string(),
            team_name: team_name.to_string(),
            score: 0,
            hansoku: 0,
        }
    }

    /// Identity of the slot, ignoring live tallies.
    pub fn identity(&self) -> (&str, &str) {
        (&self.player_id, &self.team_id)
    }

    pub fn clamp_tallies(&mut self) {
        self.score = self.score.min(MAX_SCORE);
        self.hansoku = self.hansoku.min(MAX_HANSOKU);
    }

    /// Adopt the remote live tallies, keeping them in range.
    pub fn adopt_tallies(&mut self, remote: &PlayerSlot) {
        self.score = remote.score.min(MAX_SCORE);
        self.hansoku = remote.hansoku.min(MAX_HANSOKU);
    }
}

#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "matches.ts")]
#[ts(rename_all = "camelCase")]
pub struct MatchPlayers {
    pub player_a: PlayerSlot,
    pub player_b: PlayerSlot,
}

impl MatchPlayers {
    pub fn clamp_tallies(&mut self) {
        self.player_a.clamp_tallies();
        self.player_b.clamp_tallies();
    }

    /// Copy score/hansoku from the remote copy. These two fields are
    /// always-live: score-entry devices are authoritative for them in
    /// real time, so they bypass the local-priority rule.
    pub fn adopt_live_fields(&mut self, remote: &MatchPlayers) {
        self.player_a.adopt_tallies(&remote.player_a);
        self.player_b.adopt_tallies(&remote.player_b);
    }
}

/// An individual-tournament bout.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "matches.ts")]
#[ts(rename_all = "camelCase")]
pub struct Match {
    pub match_id: String,
    pub court_id: String,
    pub round_id: String,
    pub players: MatchPlayers,
    pub is_completed: bool,
    #[ts(type = "number")]
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Match {
    pub fn new(
        court_id: &str,
        round_id: &str,
        player_a: PlayerSlot,
        player_b: PlayerSlot,
        sort_order: i64,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            match_id: Uuid::new_v4().to_string(),
            court_id: court_id.to_string(),
            round_id: round_id.to_string(),
            players: MatchPlayers { player_a, player_b },
            is_completed: false,
            sort_order,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Re-establish the tally invariants after any edit or merge path.
    pub fn sanitize(&mut self) {
        self.players.clamp_tallies();
    }
}
