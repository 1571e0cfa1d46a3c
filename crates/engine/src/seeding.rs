use std::cmp::Ordering;

use rand::RngExt;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use infra::models::{
    GeneratedTeam, Player, SeedEntry, SeedingConfig, TeamFormationConfig, TeamStats, Tournament,
};
use infra::repos::players;
use infra::repos::tournaments::{SeedingMethod, TeamFormationMethod, TournamentRepo};

use crate::error::{EngineError, Result};
use crate::live;
use crate::state::AppState;

/// Ranks the roster by a weighted composite of championships, winning
/// percentage and average finish. Manual seeding keeps roster order.
pub fn generate_player_seeds(roster: &[Player], config: &SeedingConfig) -> Vec<SeedEntry> {
    let mut scored: Vec<(f64, &Player)> = match config.method {
        SeedingMethod::Manual => roster.iter().map(|p| (0.0, p)).collect(),
        SeedingMethod::Historical | SeedingMethod::RecentForm | SeedingMethod::Elo => {
            let mut scored: Vec<(f64, &Player)> = roster
                .iter()
                .map(|p| (composite_score(p, config), p))
                .collect();
            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
            scored
        }
    };
    scored
        .drain(..)
        .enumerate()
        .map(|(i, (score, p))| SeedEntry {
            player_id: p.id,
            player_name: p.name.clone(),
            seed: i as i32 + 1,
            score,
        })
        .collect()
}

fn composite_score(player: &Player, config: &SeedingConfig) -> f64 {
    let finish_component = if player.bods_played > 0 {
        let divisor = if player.avg_finish == 0.0 {
            1.0
        } else {
            player.avg_finish
        };
        1.0 / divisor
    } else {
        0.0
    };
    player.total_championships as f64 * config.championship_weight
        + player.winning_percentage * config.win_percentage_weight
        + finish_component * config.avg_finish_weight
}

/// Builds the team list for a tournament. Pairing methods drop an odd
/// player out; manual keeps everyone as singletons in roster order.
pub fn form_teams(roster: &[Player], config: &TeamFormationConfig) -> Vec<GeneratedTeam> {
    match config.method {
        TeamFormationMethod::Manual | TeamFormationMethod::Preformed => roster
            .iter()
            .enumerate()
            .map(|(i, p)| GeneratedTeam {
                id: Uuid::new_v4(),
                name: p.name.clone(),
                player_ids: vec![p.id],
                player_names: vec![p.name.clone()],
                combined_seed: i as i32 + 1,
                checked_in: false,
                stats: TeamStats {
                    avg_finish: p.avg_finish,
                    win_percentage: p.winning_percentage,
                    championships: p.total_championships,
                    bods_played: p.bods_played,
                },
            })
            .collect(),
        TeamFormationMethod::Random => random_pairs(roster),
        TeamFormationMethod::StatisticalPairing | TeamFormationMethod::Draft => {
            statistical_pairs(roster)
        }
    }
}

fn random_pairs(roster: &[Player]) -> Vec<GeneratedTeam> {
    let mut rng = rand::rng();
    let mut pool: Vec<&Player> = roster.iter().collect();
    let mut shuffled = Vec::with_capacity(pool.len());
    while !pool.is_empty() {
        shuffled.push(pool.swap_remove(rng.random_range(0..pool.len())));
    }
    shuffled
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| pair_team(pair[0], pair[1], i as i32 + 1))
        .collect()
}

/// Strongest with weakest: rank the field by skill, then pair the top seed
/// with the bottom one and work inward.
fn statistical_pairs(roster: &[Player]) -> Vec<GeneratedTeam> {
    let mut ranked: Vec<&Player> = roster.iter().collect();
    ranked.sort_by(|a, b| {
        skill(b)
            .partial_cmp(&skill(a))
            .unwrap_or(Ordering::Equal)
    });
    let team_count = ranked.len() / 2;
    (0..team_count)
        .map(|i| {
            let top = ranked[i];
            let bottom = ranked[ranked.len() - 1 - i];
            let combined_seed = (i + 1 + (team_count - i)).div_ceil(2) as i32;
            pair_team(top, bottom, combined_seed)
        })
        .collect()
}

fn skill(player: &Player) -> f64 {
    player.winning_percentage * 100.0 + player.total_championships as f64 * 10.0
}

fn pair_team(a: &Player, b: &Player, combined_seed: i32) -> GeneratedTeam {
    GeneratedTeam {
        id: Uuid::new_v4(),
        name: format!("{} & {}", a.name, b.name),
        player_ids: vec![a.id, b.id],
        player_names: vec![a.name.clone(), b.name.clone()],
        combined_seed,
        checked_in: false,
        stats: TeamStats {
            avg_finish: (a.avg_finish + b.avg_finish) / 2.0,
            win_percentage: (a.winning_percentage + b.winning_percentage) / 2.0,
            championships: a.total_championships + b.total_championships,
            bods_played: a.bods_played + b.bods_played,
        },
    }
}

/// Generates seeds and teams for the tournament roster and persists both
/// onto the document.
pub async fn setup_tournament(state: &AppState, tournament_id: Uuid) -> Result<Tournament> {
    let repo = TournamentRepo::new(state.store.clone());
    let tournament = repo
        .find(tournament_id)
        .await
        .ok_or_else(|| EngineError::NotFound(format!("tournament {tournament_id}")))?;

    let roster_ids = if !tournament.players.is_empty() {
        tournament.players.clone()
    } else {
        tournament.registered_players.clone()
    };
    let roster = players::get_many(&state.store, &roster_ids).await;
    if roster.is_empty() {
        return Err(EngineError::Validation(
            "no players available for setup".into(),
        ));
    }

    let seeds = generate_player_seeds(&roster, &tournament.seeding_config);
    let teams = form_teams(&roster, &tournament.team_formation_config);
    info!(
        %tournament_id,
        players = roster.len(),
        teams = teams.len(),
        "tournament setup generated seeds and teams"
    );

    let mut updated = tournament;
    updated.generated_seeds = seeds;
    updated.generated_teams = teams;
    let saved = repo.save(updated).await?;
    live::emit_action(state, tournament_id, "setup_tournament");
    Ok(saved)
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewEntry {
    pub player_id: Uuid,
    pub player_name: String,
    pub rank: i32,
    pub score: f64,
    pub bods_played: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedingPreview {
    pub entries: Vec<PreviewEntry>,
    pub bracket_size: usize,
    pub byes: usize,
}

/// Read-only ranking of the current roster with the bracket size the field
/// would need. Players with under two appearances get a neutral score.
pub async fn seeding_preview(state: &AppState, tournament_id: Uuid) -> Result<SeedingPreview> {
    let repo = TournamentRepo::new(state.store.clone());
    let tournament = repo
        .find(tournament_id)
        .await
        .ok_or_else(|| EngineError::NotFound(format!("tournament {tournament_id}")))?;

    let roster_ids = if !tournament.players.is_empty() {
        tournament.players.clone()
    } else {
        tournament.registered_players.clone()
    };
    let roster = players::get_many(&state.store, &roster_ids).await;

    let mut scored: Vec<(f64, &Player)> = roster
        .iter()
        .map(|p| (preview_score(p), p))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let entries = scored
        .iter()
        .enumerate()
        .map(|(i, (score, p))| PreviewEntry {
            player_id: p.id,
            player_name: p.name.clone(),
            rank: i as i32 + 1,
            score: *score,
            bods_played: p.bods_played,
        })
        .collect();

    let count = roster.len();
    let bracket_size = if count == 0 { 0 } else { count.next_power_of_two() };
    Ok(SeedingPreview {
        entries,
        bracket_size,
        byes: bracket_size - count,
    })
}

fn preview_score(player: &Player) -> f64 {
    if player.bods_played < 2 {
        return 50.0;
    }
    let finish_bonus = (10.0 - player.avg_finish) * 5.0;
    player.winning_percentage * 100.0
        + player.total_championships as f64 * 25.0
        + finish_bonus.max(0.0)
        + (player.bods_played as f64).min(50.0)
}
