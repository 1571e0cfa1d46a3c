mod common;

use common::*;

use engine::seeding::{form_teams, generate_player_seeds, seeding_preview, setup_tournament};
use engine::EngineError;
use infra::models::{SeedingConfig, TeamFormationConfig};
use infra::repos::tournaments::{SeedingMethod, TeamFormationMethod, TournamentRepo, TournamentStatus};

#[tokio::test]
async fn test_historical_seeding_ranks_by_composite() {
    let state = test_state();
    let strong = create_player_with_stats(&state, "Strong", 20, 2.0, 0.8, 5).await;
    let middle = create_player_with_stats(&state, "Middle", 10, 5.0, 0.5, 1).await;
    let weak = create_player_with_stats(&state, "Weak", 4, 9.0, 0.2, 0).await;

    let seeds = generate_player_seeds(
        &[weak.clone(), strong.clone(), middle.clone()],
        &SeedingConfig::default(),
    );

    assert_eq!(seeds.len(), 3);
    assert_eq!(seeds[0].player_id, strong.id);
    assert_eq!(seeds[0].seed, 1);
    assert_eq!(seeds[1].player_id, middle.id);
    assert_eq!(seeds[2].player_id, weak.id);
    assert!(seeds[0].score > seeds[1].score);
    assert!(seeds[1].score > seeds[2].score);
}

#[tokio::test]
async fn test_manual_seeding_keeps_roster_order() {
    let state = test_state();
    let first = create_player_with_stats(&state, "First", 1, 8.0, 0.1, 0).await;
    let second = create_player_with_stats(&state, "Second", 15, 1.5, 0.9, 4).await;

    let config = SeedingConfig {
        method: SeedingMethod::Manual,
        ..SeedingConfig::default()
    };
    let seeds = generate_player_seeds(&[first.clone(), second.clone()], &config);

    assert_eq!(seeds[0].player_id, first.id);
    assert_eq!(seeds[0].seed, 1);
    assert_eq!(seeds[0].score, 0.0);
    assert_eq!(seeds[1].player_id, second.id);
    assert_eq!(seeds[1].seed, 2);
}

#[tokio::test]
async fn test_statistical_pairing_matches_best_with_worst() {
    let state = test_state();
    let best = create_player_with_stats(&state, "Best", 20, 1.5, 0.9, 6).await;
    let good = create_player_with_stats(&state, "Good", 15, 3.0, 0.7, 2).await;
    let fair = create_player_with_stats(&state, "Fair", 10, 5.0, 0.4, 0).await;
    let worst = create_player_with_stats(&state, "Worst", 5, 8.0, 0.1, 0).await;

    let config = TeamFormationConfig {
        method: TeamFormationMethod::StatisticalPairing,
    };
    let teams = form_teams(
        &[fair.clone(), best.clone(), worst.clone(), good.clone()],
        &config,
    );

    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].player_ids, vec![best.id, worst.id]);
    assert_eq!(teams[1].player_ids, vec![good.id, fair.id]);
    // Balanced pairs share the middle seed.
    assert_eq!(teams[0].combined_seed, 2);
    assert_eq!(teams[1].combined_seed, 2);
    assert_eq!(teams[0].stats.championships, 6);
    assert!((teams[0].stats.win_percentage - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_random_pairing_drops_odd_player() {
    let state = test_state();
    let mut roster = Vec::new();
    for i in 0..5 {
        roster.push(create_player(&state, &format!("Random {i}")).await);
    }

    let config = TeamFormationConfig {
        method: TeamFormationMethod::Random,
    };
    let teams = form_teams(&roster, &config);

    assert_eq!(teams.len(), 2);
    let mut used: Vec<_> = teams
        .iter()
        .flat_map(|t| t.player_ids.iter().copied())
        .collect();
    used.sort();
    used.dedup();
    assert_eq!(used.len(), 4, "each paired player appears exactly once");
    assert_eq!(teams[0].combined_seed, 1);
    assert_eq!(teams[1].combined_seed, 2);
}

#[tokio::test]
async fn test_setup_tournament_persists_seeds_and_teams() {
    let state = test_state();
    let repo = TournamentRepo::new(state.store.clone());
    let mut tournament = create_tournament(&state, TournamentStatus::Active).await;
    let mut roster = Vec::new();
    for i in 0..4 {
        let player =
            create_player_with_stats(&state, &format!("Setup {i}"), 5 + i, 4.0, 0.5, 0).await;
        roster.push(player.id);
    }
    tournament.players = roster;
    repo.save(tournament.clone()).await.expect("save roster");

    let updated = setup_tournament(&state, tournament.id).await.expect("setup");

    assert_eq!(updated.generated_seeds.len(), 4);
    assert_eq!(updated.generated_teams.len(), 2);
    let stored = repo.find(tournament.id).await.expect("tournament");
    assert_eq!(stored.generated_seeds.len(), 4);
    assert_eq!(stored.generated_teams.len(), 2);
}

#[tokio::test]
async fn test_setup_requires_players() {
    let state = test_state();
    let tournament = create_tournament(&state, TournamentStatus::Active).await;

    let err = setup_tournament(&state, tournament.id)
        .await
        .expect_err("setup without roster should fail");

    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(err.http_status(), 400);
}

#[tokio::test]
async fn test_seeding_preview_ranks_and_sizes_bracket() {
    let state = test_state();
    let repo = TournamentRepo::new(state.store.clone());
    let mut tournament = create_tournament(&state, TournamentStatus::Open).await;

    let veteran = create_player_with_stats(&state, "Veteran", 30, 2.0, 0.8, 3).await;
    let journeyman = create_player_with_stats(&state, "Journeyman", 10, 6.0, 0.4, 0).await;
    let rookie = create_player(&state, "Rookie").await;
    tournament.registered_players = vec![rookie.id, veteran.id, journeyman.id];
    repo.save(tournament.clone()).await.expect("save roster");

    let preview = seeding_preview(&state, tournament.id).await.expect("preview");

    assert_eq!(preview.entries.len(), 3);
    assert_eq!(preview.entries[0].player_id, veteran.id);
    assert_eq!(preview.entries[0].rank, 1);
    let rookie_entry = preview
        .entries
        .iter()
        .find(|e| e.player_id == rookie.id)
        .expect("rookie entry");
    assert_eq!(rookie_entry.score, 50.0);
    assert_eq!(preview.bracket_size, 4);
    assert_eq!(preview.byes, 1);
}
