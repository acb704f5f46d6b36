//! Three-way conflict detection for the match setup screen.
//!
//! Compares {initial, draft, server} snapshots of a tournament's matches and
//! classifies divergence per field. Pure data-in/data-out: the caller decides
//! how to surface the result. Score and hansoku tallies are always-live and
//! are never compared here; the inbound replication path merges them
//! directly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::matches::{Match, PlayerSlot};
use crate::models::teams::Team;
use crate::models::tournaments::Round;

/// Server-side value shown when a record was deleted remotely.
pub const DELETED_MARKER: &str = "[deleted]";

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "conflicts.ts")]
#[ts(rename_all = "camelCase")]
pub enum ConflictField {
    Court,
    Round,
    PlayerA,
    PlayerB,
    SortOrder,
}

/// The fields subject to three-way comparison. Tallies (score, hansoku) are
/// deliberately absent; widening this set is a design decision, not a
/// one-line change.
fn compared_fields() -> [ConflictField; 5] {
    [
        ConflictField::Court,
        ConflictField::Round,
        ConflictField::PlayerA,
        ConflictField::PlayerB,
        ConflictField::SortOrder,
    ]
}

/// Both sides changed the same field to different values.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "conflicts.ts")]
#[ts(rename_all = "camelCase")]
pub struct FieldConflict {
    pub field: ConflictField,
    pub draft: String,
    pub server: String,
}

/// Only the server changed a field the user left alone.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "conflicts.ts")]
#[ts(rename_all = "camelCase")]
pub struct ServerFieldChange {
    pub field: ConflictField,
    pub initial: String,
    pub server: String,
}

/// Divergence report for one match.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "conflicts.ts")]
#[ts(rename_all = "camelCase")]
pub struct MatchConflict {
    pub match_id: String,
    /// Human-readable bout label for rendering ("Tanaka vs Suzuki").
    pub match_label: String,
    pub deleted_on_server: bool,
    /// Collisions with the user's own edits (force-overwrite decision).
    pub conflicts: Vec<FieldConflict>,
    /// Changes elsewhere the user should be told about (acknowledge-and-merge).
    pub server_changes: Vec<ServerFieldChange>,
}

/// Previously dismissed conflicts: match id -> field -> the raw server value
/// the user accepted. A dismissal suppresses re-surfacing that exact value.
pub type RejectedChanges = HashMap<String, HashMap<ConflictField, String>>;

fn is_rejected(
    rejected: &RejectedChanges,
    match_id: &str,
    field: ConflictField,
    server_value: &str,
) -> bool {
    rejected
        .get(match_id)
        .and_then(|fields| fields.get(&field))
        .is_some_and(|accepted| accepted == server_value)
}

/// Comparison value for a field: stable ids, not display labels.
fn raw_value(record: &Match, field: ConflictField) -> String {
    match field {
        ConflictField::Court => record.court_id.clone(),
        ConflictField::Round => record.round_id.clone(),
        ConflictField::PlayerA => slot_identity(&record.players.player_a),
        ConflictField::PlayerB => slot_identity(&record.players.player_b),
        ConflictField::SortOrder => record.sort_order.to_string(),
    }
}

fn slot_identity(slot: &PlayerSlot) -> String {
    format!("{}|{}", slot.player_id, slot.team_id)
}

/// Rendering value for a field, resolved through the lookup tables.
fn display_value(
    record: &Match,
    field: ConflictField,
    teams: &[Team],
    rounds: &[Round],
) -> String {
    match field {
        ConflictField::Court => record.court_id.clone(),
        ConflictField::Round => rounds
            .iter()
            .find(|r| r.round_id == record.round_id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| record.round_id.clone()),
        ConflictField::PlayerA => slot_label(&record.players.player_a, teams),
        ConflictField::PlayerB => slot_label(&record.players.player_b, teams),
        ConflictField::SortOrder => record.sort_order.to_string(),
    }
}

fn slot_label(slot: &PlayerSlot, teams: &[Team]) -> String {
    let team_name = teams
        .iter()
        .find(|t| t.team_id == slot.team_id)
        .map(|t| t.name.as_str())
        .unwrap_or(slot.team_name.as_str());
    format!("{} ({})", slot.display_name, team_name)
}

fn match_label(record: &Match) -> String {
    format!(
        "{} vs {}",
        record.players.player_a.display_name, record.players.player_b.display_name
    )
}

/// Classify divergence between what the user is about to save (`draft`), the
/// snapshot taken when editing began (`initial`) and the latest known remote
/// state (`server`).
///
/// Drafts with no initial counterpart are new records and cannot conflict.
/// A record missing from `server` but present initially is a deletion
/// conflict. Everything else is compared field by field.
pub fn detect_match_conflicts(
    draft: &[Match],
    initial: &[Match],
    server: &[Match],
    teams: &[Team],
    rounds: &[Round],
    rejected: &RejectedChanges,
) -> Vec<MatchConflict> {
    let initial_by_id: HashMap<&str, &Match> = initial
        .iter()
        .map(|m| (m.match_id.as_str(), m))
        .collect();
    let server_by_id: HashMap<&str, &Match> =
        server.iter().map(|m| (m.match_id.as_str(), m)).collect();

    let mut out = Vec::new();
    for draft_record in draft {
        let Some(initial_record) = initial_by_id.get(draft_record.match_id.as_str()) else {
            continue;
        };

        let Some(server_record) = server_by_id.get(draft_record.match_id.as_str()) else {
            if is_rejected(
                rejected,
                &draft_record.match_id,
                ConflictField::Court,
                DELETED_MARKER,
            ) {
                continue;
            }
            out.push(MatchConflict {
                match_id: draft_record.match_id.clone(),
                match_label: match_label(draft_record),
                deleted_on_server: true,
                conflicts: vec![FieldConflict {
                    field: ConflictField::Court,
                    draft: display_value(draft_record, ConflictField::Court, teams, rounds),
                    server: DELETED_MARKER.to_string(),
                }],
                server_changes: Vec::new(),
            });
            continue;
        };

        let mut conflicts = Vec::new();
        let mut server_changes = Vec::new();
        for field in compared_fields() {
            let draft_value = raw_value(draft_record, field);
            let initial_value = raw_value(initial_record, field);
            let server_value = raw_value(server_record, field);

            let user_changed = draft_value != initial_value;
            let server_changed = server_value != initial_value;
            if !server_changed {
                continue;
            }
            if is_rejected(rejected, &draft_record.match_id, field, &server_value) {
                continue;
            }

            if user_changed && draft_value != server_value {
                conflicts.push(FieldConflict {
                    field,
                    draft: display_value(draft_record, field, teams, rounds),
                    server: display_value(server_record, field, teams, rounds),
                });
            } else if !user_changed {
                server_changes.push(ServerFieldChange {
                    field,
                    initial: display_value(initial_record, field, teams, rounds),
                    server: display_value(server_record, field, teams, rounds),
                });
            }
            // user_changed && draft_value == server_value: both sides
            // converged on the same value, nothing to report.
        }

        if !conflicts.is_empty() || !server_changes.is_empty() {
            out.push(MatchConflict {
                match_id: draft_record.match_id.clone(),
                match_label: match_label(draft_record),
                deleted_on_server: false,
                conflicts,
                server_changes,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::matches::MatchPlayers;

    fn slot(player_id: &str, team_id: &str, name: &str) -> PlayerSlot {
        PlayerSlot::new(player_id, team_id, name, "Dojo")
    }

    fn base_match(id: &str) -> Match {
        Match {
            match_id: id.to_string(),
            court_id: "A".to_string(),
            round_id: "r1".to_string(),
            players: MatchPlayers {
                player_a: slot("p1", "t1", "Tanaka"),
                player_b: slot("p2", "t2", "Suzuki"),
            },
            is_completed: false,
            sort_order: 1,
            created_at: "2026-05-01T09:00:00Z".to_string(),
            updated_at: "2026-05-01T09:00:00Z".to_string(),
        }
    }

    fn detect(draft: &[Match], initial: &[Match], server: &[Match]) -> Vec<MatchConflict> {
        detect_match_conflicts(draft, initial, server, &[], &[], &RejectedChanges::new())
    }

    #[test]
    fn test_both_changed_to_different_values_is_direct_conflict() {
        let initial = base_match("m1");
        let mut draft = initial.clone();
        draft.court_id = "B".to_string();
        let mut server = initial.clone();
        server.court_id = "C".to_string();

        let result = detect(&[draft], &[initial], &[server]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].conflicts.len(), 1);
        assert!(result[0].server_changes.is_empty());
        let c = &result[0].conflicts[0];
        assert_eq!(c.field, ConflictField::Court);
        assert_eq!(c.draft, "B");
        assert_eq!(c.server, "C");
    }

    #[test]
    fn test_server_only_change_is_informational() {
        let initial = base_match("m1");
        let draft = initial.clone();
        let mut server = initial.clone();
        server.court_id = "C".to_string();

        let result = detect(&[draft], &[initial], &[server]);
        assert_eq!(result.len(), 1);
        assert!(result[0].conflicts.is_empty());
        let sc = &result[0].server_changes[0];
        assert_eq!(sc.field, ConflictField::Court);
        assert_eq!(sc.initial, "A");
        assert_eq!(sc.server, "C");
    }

    #[test]
    fn test_convergent_edits_are_silent() {
        let initial = base_match("m1");
        let mut draft = initial.clone();
        draft.court_id = "B".to_string();
        let mut server = initial.clone();
        server.court_id = "B".to_string();

        assert!(detect(&[draft], &[initial], &[server]).is_empty());
    }

    #[test]
    fn test_user_only_change_is_silent() {
        let initial = base_match("m1");
        let mut draft = initial.clone();
        draft.court_id = "B".to_string();
        let server = initial.clone();

        assert!(detect(&[draft], &[initial], &[server]).is_empty());
    }

    #[test]
    fn test_new_draft_is_skipped() {
        let draft = base_match("brand-new");
        assert!(detect(&[draft], &[], &[]).is_empty());
    }

    #[test]
    fn test_deletion_conflict_reports_deleted_marker() {
        let initial = base_match("m1");
        let draft = initial.clone();

        let result = detect(&[draft], &[initial], &[]);
        assert_eq!(result.len(), 1);
        assert!(result[0].deleted_on_server);
        let c = &result[0].conflicts[0];
        assert_eq!(c.field, ConflictField::Court);
        assert_eq!(c.draft, "A");
        assert_eq!(c.server, DELETED_MARKER);
    }

    #[test]
    fn test_rejected_server_value_is_suppressed() {
        let initial = base_match("m1");
        let mut draft = initial.clone();
        draft.court_id = "B".to_string();
        let mut server = initial.clone();
        server.court_id = "C".to_string();

        let mut rejected = RejectedChanges::new();
        rejected
            .entry("m1".to_string())
            .or_default()
            .insert(ConflictField::Court, "C".to_string());

        let result = detect_match_conflicts(
            &[draft.clone()],
            &[initial.clone()],
            &[server.clone()],
            &[],
            &[],
            &rejected,
        );
        assert!(result.is_empty());

        // A different server value surfaces again.
        server.court_id = "D".to_string();
        let result = detect_match_conflicts(&[draft], &[initial], &[server], &[], &[], &rejected);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_rejected_deletion_is_suppressed() {
        let initial = base_match("m1");
        let draft = initial.clone();

        let mut rejected = RejectedChanges::new();
        rejected
            .entry("m1".to_string())
            .or_default()
            .insert(ConflictField::Court, DELETED_MARKER.to_string());

        let result = detect_match_conflicts(&[draft], &[initial], &[], &[], &[], &rejected);
        assert!(result.is_empty());
    }

    #[test]
    fn test_tallies_are_never_compared() {
        let initial = base_match("m1");
        let mut draft = initial.clone();
        draft.players.player_a.score = 1;
        let mut server = initial.clone();
        server.players.player_a.score = 2;
        server.players.player_b.hansoku = 3;

        assert!(detect(&[draft], &[initial], &[server]).is_empty());
    }

    #[test]
    fn test_player_change_renders_team_label() {
        let initial = base_match("m1");
        let draft = initial.clone();
        let mut server = initial.clone();
        server.players.player_a = slot("p9", "t9", "Yamada");

        let mut team = Team::new("Seibukan", "Rep", "rep@example.com");
        team.team_id = "t9".to_string();

        let result = detect_match_conflicts(
            &[draft],
            &[initial],
            &[server],
            &[team],
            &[],
            &RejectedChanges::new(),
        );
        assert_eq!(result[0].server_changes[0].server, "Yamada (Seibukan)");
    }

    #[test]
    fn test_sort_order_and_round_compared_independently() {
        let initial = base_match("m1");
        let mut draft = initial.clone();
        draft.sort_order = 5;
        let mut server = initial.clone();
        server.round_id = "r2".to_string();
        server.sort_order = 9;

        let result = detect(&[draft], &[initial], &[server]);
        assert_eq!(result.len(), 1);
        // sort order collides, round is server-only
        assert_eq!(result[0].conflicts.len(), 1);
        assert_eq!(result[0].conflicts[0].field, ConflictField::SortOrder);
        assert_eq!(result[0].server_changes.len(), 1);
        assert_eq!(result[0].server_changes[0].field, ConflictField::Round);
    }
}
