mod common;

use common::*;

use engine::actions::dispatch_action;
use engine::config::EngineConfig;
use engine::deletion::{delete_tournament, DeletionSummary, StepName, StepStatus, StepSummary};
use engine::matchgen::generate_matches_for_round;
use engine::AppState;
use infra::repos::matches;
use infra::repos::results;
use infra::repos::tournaments::{TournamentRepo, TournamentStatus};
use uuid::Uuid;

fn step(summary: &DeletionSummary, name: StepName) -> &StepSummary {
    summary
        .steps
        .iter()
        .find(|s| s.name == name)
        .expect("step present")
}

#[tokio::test]
async fn test_delete_scheduled_tournament_without_documents() {
    let state = test_state();
    let tournament = create_tournament(&state, TournamentStatus::Scheduled).await;

    let summary = delete_tournament(&state, &tournament.id.to_string())
        .await
        .expect("deletion succeeds");

    assert_eq!(summary.steps.len(), 4);
    for entry in &summary.steps {
        assert_eq!(entry.status, StepStatus::Completed);
    }
    assert_eq!(step(&summary, StepName::DeleteMatches).expected, 0);
    assert_eq!(step(&summary, StepName::DeleteResults).expected, 0);
    assert_eq!(step(&summary, StepName::DeleteTournament).actual, 1);
    assert_eq!(summary.tournament.bod_number, tournament.bod_number);

    let repo = TournamentRepo::new(state.store.clone());
    assert!(repo.find(tournament.id).await.is_none());
}

#[tokio::test]
async fn test_correlation_id_shape() {
    let state = test_state();
    let tournament = create_tournament(&state, TournamentStatus::Scheduled).await;

    let summary = delete_tournament(&state, &tournament.id.to_string())
        .await
        .expect("deletion succeeds");

    let parts: Vec<&str> = summary.correlation_id.split('_').collect();
    assert_eq!(parts.len(), 3, "del_<timestamp>_<suffix>");
    assert_eq!(parts[0], "del");
    assert!(parts[1].parse::<i64>().is_ok(), "millisecond timestamp");
    assert_eq!(parts[2].len(), 9);
    assert!(parts[2]
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
}

#[tokio::test]
async fn test_delete_completed_tournament_and_its_documents() {
    let state = test_state();
    let tournament = active_tournament_with_teams(&state, 2).await;
    dispatch_action(&state, tournament.id, "start_bracket")
        .await
        .expect("start bracket");
    complete_round_favorites(&state, tournament.id, matches::Round::Final).await;
    dispatch_action(&state, tournament.id, "complete_tournament")
        .await
        .expect("complete");

    // A bystander tournament proves deletion stays scoped.
    let other = active_tournament_with_teams(&state, 2).await;
    dispatch_action(&state, other.id, "start_bracket")
        .await
        .expect("start other bracket");

    let summary = delete_tournament(&state, &tournament.id.to_string())
        .await
        .expect("deletion succeeds");

    let matches_step = step(&summary, StepName::DeleteMatches);
    assert_eq!(matches_step.expected, 1);
    assert_eq!(matches_step.actual, 1);
    let results_step = step(&summary, StepName::DeleteResults);
    assert_eq!(results_step.expected, 2);
    assert_eq!(results_step.actual, 2);

    assert_eq!(matches::count_by_tournament(&state.store, tournament.id).await, 0);
    assert_eq!(results::count_by_tournament(&state.store, tournament.id).await, 0);
    assert_eq!(
        matches::count_by_tournament(&state.store, other.id).await,
        1,
        "other tournaments keep their matches"
    );
}

#[tokio::test]
async fn test_delete_rejects_active_tournament() {
    let state = test_state();
    let tournament = create_tournament(&state, TournamentStatus::Active).await;

    let err = delete_tournament(&state, &tournament.id.to_string())
        .await
        .expect_err("active tournaments cannot be deleted");

    assert_eq!(err.code.as_str(), "INVALID_STATUS");
    assert_eq!(err.http_status(), 409);
    assert!(!err.is_retryable());
    assert!(err
        .to_string()
        .contains("Only scheduled or completed tournaments can be deleted"));

    let repo = TournamentRepo::new(state.store.clone());
    assert!(repo.find(tournament.id).await.is_some(), "nothing was deleted");
}

#[tokio::test]
async fn test_delete_rejects_malformed_id() {
    let state = test_state();

    let err = delete_tournament(&state, "not-a-uuid")
        .await
        .expect_err("malformed id");

    assert_eq!(err.code.as_str(), "INVALID_ID");
    assert_eq!(err.http_status(), 400);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_delete_missing_tournament() {
    let state = test_state();

    let err = delete_tournament(&state, &Uuid::new_v4().to_string())
        .await
        .expect_err("unknown tournament");

    assert_eq!(err.code.as_str(), "NOT_FOUND");
    assert_eq!(err.http_status(), 404);
}

#[tokio::test]
async fn test_deletion_batches_until_counts_match() {
    let state = AppState::with_config(EngineConfig {
        live_pulse_secs: 1,
        deletion_batch_size: 3,
    });
    let tournament = active_tournament_with_teams(&state, 4).await;
    let teams = tournament.generated_teams.clone();
    let games =
        generate_matches_for_round(&state, &tournament, &teams, matches::Round::RoundRobin1)
            .await
            .expect("generate round robin");
    assert_eq!(games.len(), 6, "four teams play six round robin matches");

    let repo = TournamentRepo::new(state.store.clone());
    let mut doc = repo.find(tournament.id).await.expect("tournament");
    doc.status = TournamentStatus::Completed;
    repo.save(doc).await.expect("mark completed");

    let summary = delete_tournament(&state, &tournament.id.to_string())
        .await
        .expect("deletion succeeds");

    let matches_step = step(&summary, StepName::DeleteMatches);
    assert_eq!(matches_step.expected, 6);
    assert_eq!(matches_step.actual, 6, "two batches of three");
    assert_eq!(matches::count_by_tournament(&state.store, tournament.id).await, 0);
}
