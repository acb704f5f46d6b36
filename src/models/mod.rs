pub mod match_groups;
pub mod matches;
pub mod sync;
pub mod team_matches;
pub mod teams;
pub mod tournaments;

pub use match_groups::MatchGroup;
pub use matches::{Match, MatchPlayers, PlayerSlot, MAX_HANSOKU, MAX_SCORE};
pub use sync::{Local, SyncMeta};
pub use team_matches::{MatchWinner, TeamMatch, WinReason};
pub use teams::{Team, TeamPlayer};
pub use tournaments::{Court, Round, Tournament, TournamentType};
