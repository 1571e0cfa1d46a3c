mod common;

use common::*;

use engine::actions;
use engine::phase::{calculate_phase, Phase, RoundStatus};
use infra::repos::matches::{self, Round};
use infra::repos::tournaments::{TournamentRepo, TournamentStatus};

#[tokio::test]
async fn test_scheduled_tournament_is_setup() {
    let state = test_state();
    let tournament = create_tournament(&state, TournamentStatus::Scheduled).await;

    let info = calculate_phase(&tournament, &[]);

    assert_eq!(info.phase, Phase::Setup);
    assert_eq!(info.current_round, None);
    assert_eq!(info.round_status, RoundStatus::NotStarted);
    assert!(!info.can_advance);
}

#[tokio::test]
async fn test_open_tournament_is_registration() {
    let state = test_state();
    let tournament = create_tournament(&state, TournamentStatus::Open).await;

    let info = calculate_phase(&tournament, &[]);

    assert_eq!(info.phase, Phase::Registration);
    assert!(!info.can_advance);
}

#[tokio::test]
async fn test_active_without_roster_is_check_in() {
    let state = test_state();
    let tournament = create_tournament(&state, TournamentStatus::Active).await;

    let info = calculate_phase(&tournament, &[]);

    assert_eq!(info.phase, Phase::CheckIn);
    assert_eq!(info.current_round, None);
}

#[tokio::test]
async fn test_active_with_teams_waits_on_first_round() {
    let state = test_state();
    let tournament = active_tournament_with_teams(&state, 4).await;

    let info = calculate_phase(&tournament, &[]);

    assert_eq!(info.phase, Phase::RoundRobin);
    assert_eq!(info.current_round, Some(Round::RoundRobin1));
    assert_eq!(info.round_status, RoundStatus::NotStarted);
    assert!(!info.can_advance);
    assert_eq!(info.total_matches, 0);
}

#[tokio::test]
async fn test_round_robin_progress_counts() {
    let state = test_state();
    let tournament = active_tournament_with_teams(&state, 3).await;
    actions::dispatch_action(&state, tournament.id, "start_round_robin")
        .await
        .expect("start round robin");

    let games = matches::list_by_tournament(&state.store, tournament.id).await;
    assert_eq!(games.len(), 3);
    complete_match(&state, games[0].id, true).await;

    let tournament = TournamentRepo::new(state.store.clone())
        .find(tournament.id)
        .await
        .expect("tournament");
    let games = matches::list_by_tournament(&state.store, tournament.id).await;
    let info = calculate_phase(&tournament, &games);

    assert_eq!(info.phase, Phase::RoundRobin);
    assert_eq!(info.current_round, Some(Round::RoundRobin1));
    assert_eq!(info.round_status, RoundStatus::InProgress);
    assert_eq!(info.completed_matches, 1);
    assert_eq!(info.total_matches, 3);
    assert!(!info.can_advance);

    for game in matches::list_by_round(&state.store, tournament.id, Round::RoundRobin1).await {
        if game.winner.is_none() {
            complete_match(&state, game.id, false).await;
        }
    }
    let games = matches::list_by_tournament(&state.store, tournament.id).await;
    let info = calculate_phase(&tournament, &games);
    assert_eq!(info.round_status, RoundStatus::Completed);
    assert!(info.can_advance);
}

#[tokio::test]
async fn test_bracket_phase_tracks_deepest_round() {
    let state = test_state();
    let tournament = active_tournament_with_teams(&state, 4).await;
    actions::dispatch_action(&state, tournament.id, "start_bracket")
        .await
        .expect("start bracket");

    let repo = TournamentRepo::new(state.store.clone());
    let tournament = repo.find(tournament.id).await.expect("tournament");
    let games = matches::list_by_tournament(&state.store, tournament.id).await;
    let info = calculate_phase(&tournament, &games);
    assert_eq!(info.phase, Phase::Bracket);
    assert_eq!(info.current_round, Some(Round::Semifinal));
    assert_eq!(info.total_matches, 2);

    complete_round_favorites(&state, tournament.id, Round::Semifinal).await;
    actions::dispatch_action(&state, tournament.id, "advance_round")
        .await
        .expect("advance to final");

    let tournament = repo.find(tournament.id).await.expect("tournament");
    let games = matches::list_by_tournament(&state.store, tournament.id).await;
    let info = calculate_phase(&tournament, &games);
    assert_eq!(info.phase, Phase::Bracket);
    assert_eq!(info.current_round, Some(Round::Final));
    // Two finished semifinals plus the fresh final.
    assert_eq!(info.completed_matches, 2);
    assert_eq!(info.total_matches, 3);
    assert_eq!(info.round_status, RoundStatus::InProgress);
}

#[tokio::test]
async fn test_completed_tournament_phase() {
    let state = test_state();
    let mut tournament = active_tournament_with_teams(&state, 2).await;
    tournament.status = TournamentStatus::Completed;

    let info = calculate_phase(&tournament, &[]);

    assert_eq!(info.phase, Phase::Completed);
    assert_eq!(info.round_status, RoundStatus::Completed);
    assert!(!info.can_advance);
}
