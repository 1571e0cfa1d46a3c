use chrono::Utc;
use uuid::Uuid;

use engine::config::EngineConfig;
use engine::scoring::{self, MatchUpdateData};
use engine::AppState;
use infra::models::{GeneratedTeam, Match, Player, TeamStats, Tournament};
use infra::repos::matches::{self, Round};
use infra::repos::players::{self, CreatePlayerData};
use infra::repos::tournaments::{
    CreateTournamentData, TournamentFormat, TournamentRepo, TournamentStatus,
};

pub fn test_state() -> AppState {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("engine=debug")
        .with_test_writer()
        .try_init();
    AppState::with_config(EngineConfig {
        live_pulse_secs: 1,
        deletion_batch_size: 50,
    })
}

#[allow(dead_code)]
pub async fn create_player(state: &AppState, name: &str) -> Player {
    players::insert(
        &state.store,
        CreatePlayerData {
            name: name.to_string(),
        },
    )
    .await
    .expect("Failed to create player")
}

/// Create a player with an established career so seeding has something to
/// rank on.
#[allow(dead_code)]
pub async fn create_player_with_stats(
    state: &AppState,
    name: &str,
    bods_played: i32,
    avg_finish: f64,
    winning_percentage: f64,
    championships: i32,
) -> Player {
    let mut player = create_player(state, name).await;
    player.bods_played = bods_played;
    player.avg_finish = avg_finish;
    player.winning_percentage = winning_percentage;
    player.individual_championships = championships;
    player.total_championships = championships;
    player.games_played = 100;
    player.games_won = (winning_percentage * 100.0) as i32;
    players::save(&state.store, player)
        .await
        .expect("Failed to save player stats")
}

#[allow(dead_code)]
pub async fn create_tournament(state: &AppState, status: TournamentStatus) -> Tournament {
    let repo = TournamentRepo::new(state.store.clone());
    repo.create(CreateTournamentData {
        date: Utc::now(),
        format: TournamentFormat::M,
        location: "Home".to_string(),
        max_players: None,
        status: Some(status),
        players: Vec::new(),
        registration_open_at: None,
        registration_deadline: None,
        bracket_type: None,
        seeding_config: None,
        team_formation_config: None,
        generated_seeds: Vec::new(),
        generated_teams: Vec::new(),
    })
    .await
    .expect("Failed to create tournament")
}

/// Create an active tournament with `count` two-player teams seeded 1..count.
/// Every roster player exists so career rollups can find them.
#[allow(dead_code)]
pub async fn active_tournament_with_teams(state: &AppState, count: usize) -> Tournament {
    let repo = TournamentRepo::new(state.store.clone());
    let mut tournament = create_tournament(state, TournamentStatus::Active).await;
    let mut teams = Vec::with_capacity(count);
    for i in 0..count {
        let a = create_player(state, &format!("Team{i} Alpha")).await;
        let b = create_player(state, &format!("Team{i} Beta")).await;
        teams.push(GeneratedTeam {
            id: Uuid::new_v4(),
            name: format!("{} & {}", a.name, b.name),
            player_ids: vec![a.id, b.id],
            player_names: vec![a.name, b.name],
            combined_seed: i as i32 + 1,
            checked_in: true,
            stats: TeamStats::default(),
        });
    }
    tournament.generated_teams = teams;
    repo.save(tournament)
        .await
        .expect("Failed to save tournament teams")
}

#[allow(dead_code)]
pub async fn complete_match(state: &AppState, match_id: Uuid, team1_wins: bool) -> Match {
    let (team1_score, team2_score) = if team1_wins { (11, 5) } else { (5, 11) };
    scoring::apply_match_update(
        state,
        match_id,
        MatchUpdateData {
            team1_score: Some(team1_score),
            team2_score: Some(team2_score),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to complete match")
}

/// Complete every match of a round with the better seeded side winning.
#[allow(dead_code)]
pub async fn complete_round_favorites(state: &AppState, tournament_id: Uuid, round: Round) {
    let games = matches::list_by_round(&state.store, tournament_id, round).await;
    assert!(!games.is_empty(), "round {} has no matches", round.as_str());
    for game in games {
        let team1_wins = game.team1.seed.unwrap_or(0) <= game.team2.seed.unwrap_or(0);
        complete_match(state, game.id, team1_wins).await;
    }
}
