#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use sqlx::SqlitePool;

use shiai::database::local::init_in_memory;
use shiai::models::matches::{Match, MatchPlayers, PlayerSlot};
use shiai::models::team_matches::TeamMatch;
use shiai::models::teams::Team;
use shiai::models::tournaments::{Court, Round, Tournament, TournamentType};

pub const ORG: &str = "org-1";

pub async fn mirror_pool() -> SqlitePool {
    init_in_memory().await.expect("mirror db").0
}

pub fn slot(player_id: &str, team_id: &str, name: &str) -> PlayerSlot {
    PlayerSlot::new(player_id, team_id, name, "Dojo")
}

pub fn sample_tournament(tournament_type: TournamentType) -> Tournament {
    let mut t = Tournament::new(ORG, "Spring Taikai", "2026-05-10", "Budokan", tournament_type);
    t.courts = vec![
        Court {
            court_id: "A".to_string(),
            name: "Court A".to_string(),
        },
        Court {
            court_id: "B".to_string(),
            name: "Court B".to_string(),
        },
    ];
    t.rounds = vec![Round {
        round_id: "r1".to_string(),
        name: "First Round".to_string(),
        sort_order: 1,
    }];
    t
}

pub fn sample_match(court_id: &str, sort_order: i64) -> Match {
    Match::new(
        court_id,
        "r1",
        slot("p1", "t1", "Tanaka"),
        slot("p2", "t2", "Suzuki"),
        sort_order,
    )
}

pub fn sample_team_match(match_group_id: &str, sort_order: i64) -> TeamMatch {
    TeamMatch::new(
        match_group_id,
        "A",
        "r1",
        slot("p1", "t1", "Tanaka"),
        slot("p2", "t2", "Suzuki"),
        sort_order,
    )
}

pub fn sample_team(name: &str) -> Team {
    Team::new(name, "Rep", "rep@example.com")
}

/// Poll an async condition until it holds or two seconds elapse.
pub async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
