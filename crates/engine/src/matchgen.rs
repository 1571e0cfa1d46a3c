use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use infra::models::{GeneratedTeam, Match, TeamSide, TeamStats, Tournament};
use infra::repos::matches::{self, CreateMatchData, MatchStatus, Round, Winner};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::events::{EventType, TournamentEvent};
use crate::state::AppState;

/// Quarterfinal slots by seed position: 1v8, 4v5, 3v6, 2v7.
pub const QUARTERFINAL_PAIRS: [(usize, usize); 4] = [(0, 7), (3, 4), (2, 5), (1, 6)];

fn team_side(team: &GeneratedTeam) -> TeamSide {
    TeamSide {
        player_ids: team.player_ids.clone(),
        player_names: team.player_names.clone(),
        score: 0,
        seed: Some(team.combined_seed),
        player_scores: None,
    }
}

/// Creates the matches for one round. Regenerating a round wipes its old
/// matches first; match numbers keep counting past every other round.
pub async fn generate_matches_for_round(
    state: &AppState,
    tournament: &Tournament,
    teams: &[GeneratedTeam],
    round: Round,
) -> Result<Vec<Match>> {
    if teams.is_empty() {
        return Err(EngineError::Validation(format!(
            "no teams available to generate {} matches",
            round.as_str()
        )));
    }

    let removed = matches::delete_by_round(&state.store, tournament.id, round).await;
    if removed > 0 {
        debug!(
            tournament_id = %tournament.id,
            round = round.as_str(),
            removed,
            "cleared existing matches before regenerating round"
        );
    }

    let pairs: Vec<(GeneratedTeam, GeneratedTeam)> = if round.is_round_robin() {
        let mut pairs = Vec::new();
        for i in 0..teams.len() {
            for j in (i + 1)..teams.len() {
                pairs.push((teams[i].clone(), teams[j].clone()));
            }
        }
        pairs
    } else {
        let mut sorted = teams.to_vec();
        sorted.sort_by_key(|t| t.combined_seed);
        if let Some(cap) = round.required_team_count() {
            sorted.truncate(cap);
        }
        match round {
            Round::Quarterfinal => QUARTERFINAL_PAIRS
                .iter()
                .filter(|(a, b)| *a < sorted.len() && *b < sorted.len())
                .map(|(a, b)| (sorted[*a].clone(), sorted[*b].clone()))
                .collect(),
            _ => (0..sorted.len() / 2)
                .map(|i| (sorted[2 * i].clone(), sorted[2 * i + 1].clone()))
                .collect(),
        }
    };

    let start = matches::highest_match_number(&state.store, tournament.id).await + 1;
    let scheduled = Utc::now();
    let mut created = Vec::with_capacity(pairs.len());
    for (offset, (team1, team2)) in pairs.into_iter().enumerate() {
        let game = matches::insert(
            &state.store,
            CreateMatchData {
                tournament_id: tournament.id,
                match_number: start + offset as i32,
                round,
                team1: team_side(&team1),
                team2: team_side(&team2),
                scheduled_date: Some(scheduled),
            },
        )
        .await?;
        created.push(game);
    }

    info!(
        tournament_id = %tournament.id,
        round = round.as_str(),
        count = created.len(),
        "generated matches"
    );
    state.events.publish(TournamentEvent::new(
        tournament.id,
        EventType::MatchesGenerated,
        json!({ "round": round.as_str(), "count": created.len() }),
    ));
    Ok(created)
}

/// Winners of a finished round, ready to be paired into the next one.
/// Their seed carries over from the side they won with.
pub fn advancing_teams(round_matches: &[Match]) -> Vec<GeneratedTeam> {
    let mut advancing: Vec<GeneratedTeam> = round_matches
        .iter()
        .filter(|m| m.status == MatchStatus::Completed)
        .filter_map(|m| {
            let side = match m.winner? {
                Winner::Team1 => &m.team1,
                Winner::Team2 => &m.team2,
            };
            Some(GeneratedTeam {
                id: Uuid::new_v4(),
                name: side.player_names.join(" & "),
                player_ids: side.player_ids.clone(),
                player_names: side.player_names.clone(),
                combined_seed: side.seed.unwrap_or(0),
                checked_in: true,
                stats: TeamStats::default(),
            })
        })
        .collect();
    advancing.sort_by_key(|t| t.combined_seed);
    advancing
}
