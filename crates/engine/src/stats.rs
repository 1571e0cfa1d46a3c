use std::cmp::Ordering;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use infra::models::{
    BracketScores, GeneratedTeam, Match, Player, RoundRobinScores, TeamSide, TotalStats,
    Tournament, TournamentResult,
};
use infra::repos::matches::{self, MatchStatus, Round, Winner};
use infra::repos::players;
use infra::repos::results::{self, CreateResultData};
use infra::repos::tournaments::TournamentRepo;
use infra::store::Store;

use crate::error::{EngineError, Result};
use crate::events::{EventType, TournamentEvent};
use crate::state::AppState;

fn ratio(won: i32, played: i32) -> f64 {
    if played == 0 {
        0.0
    } else {
        won as f64 / played as f64
    }
}

fn same_players(a: &[Uuid], b: &[Uuid]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left = a.to_vec();
    let mut right = b.to_vec();
    left.sort();
    right.sort();
    left == right
}

#[derive(Debug, Clone, Copy)]
pub struct MatchOutcome {
    pub round: Round,
    pub won: bool,
}

/// Folds one completed match into a result document. Round robin play only
/// moves the aggregate counters; per-round slots are filled at finalization.
/// Bracket stages outside the tracked buckets still count in the totals.
pub fn apply_match_to_result(mut result: TournamentResult, outcome: &MatchOutcome) -> TournamentResult {
    if outcome.round.is_round_robin() {
        let rr = &mut result.round_robin_scores;
        rr.rr_played += 1;
        if outcome.won {
            rr.rr_won += 1;
        } else {
            rr.rr_lost += 1;
        }
        rr.rr_win_percentage = ratio(rr.rr_won, rr.rr_played);
    } else {
        let bracket = &mut result.bracket_scores;
        bracket.bracket_played += 1;
        if outcome.won {
            bracket.bracket_won += 1;
        } else {
            bracket.bracket_lost += 1;
        }
        apply_bracket_stage(bracket, outcome.round, outcome.won);
    }

    let totals = &mut result.total_stats;
    totals.total_won = result.round_robin_scores.rr_won + result.bracket_scores.bracket_won;
    totals.total_lost = result.round_robin_scores.rr_lost + result.bracket_scores.bracket_lost;
    totals.total_played = result.round_robin_scores.rr_played + result.bracket_scores.bracket_played;
    totals.win_percentage = ratio(totals.total_won, totals.total_played);
    result
}

fn apply_bracket_stage(bracket: &mut BracketScores, round: Round, won: bool) {
    match round {
        Round::RoundOf16 => {
            if won {
                bracket.r16_won += 1;
            } else {
                bracket.r16_lost += 1;
            }
        }
        Round::Quarterfinal => {
            if won {
                bracket.qf_won += 1;
            } else {
                bracket.qf_lost += 1;
            }
        }
        Round::Semifinal => {
            if won {
                bracket.sf_won += 1;
            } else {
                bracket.sf_lost += 1;
            }
        }
        Round::Final => {
            if won {
                bracket.finals_won += 1;
            } else {
                bracket.finals_lost += 1;
            }
        }
        _ => {}
    }
}

async fn ensure_result(
    state: &AppState,
    tournament_id: Uuid,
    side: &TeamSide,
    division: &str,
) -> Result<TournamentResult> {
    if let Some(existing) =
        results::find_by_players(&state.store, tournament_id, &side.player_ids).await
    {
        return Ok(existing);
    }
    let created = results::insert(
        &state.store,
        CreateResultData {
            tournament_id,
            player_ids: side.player_ids.clone(),
            player_names: side.player_names.clone(),
            team_name: side.player_names.join(" & "),
            division: division.to_string(),
            seed: side.seed,
        },
    )
    .await?;
    Ok(created)
}

/// Updates both sides' result documents after a match completes.
pub async fn record_match_result(state: &AppState, game: &Match) -> Result<()> {
    let winner = game
        .winner
        .ok_or_else(|| EngineError::Validation("match has no winner recorded".into()))?;
    let repo = TournamentRepo::new(state.store.clone());
    let tournament = repo
        .find(game.tournament_id)
        .await
        .ok_or_else(|| EngineError::NotFound(format!("tournament {}", game.tournament_id)))?;
    let division = tournament.format.as_str();

    let sides = [
        (&game.team1, winner == Winner::Team1),
        (&game.team2, winner == Winner::Team2),
    ];
    for (side, won) in sides {
        let result = ensure_result(state, game.tournament_id, side, division).await?;
        let updated = apply_match_to_result(
            result,
            &MatchOutcome {
                round: game.round,
                won,
            },
        );
        results::save(&state.store, updated).await?;
    }

    state.events.publish(TournamentEvent::new(
        game.tournament_id,
        EventType::StatsUpdate,
        json!({ "match_id": game.id, "round": game.round.as_str() }),
    ));
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingEntry {
    pub team_name: String,
    pub player_ids: Vec<Uuid>,
    pub combined_seed: i32,
    pub wins: i32,
    pub losses: i32,
    pub played: i32,
    pub win_percentage: f64,
    pub qualified: bool,
    pub rank: i32,
}

/// Round robin table over every formed team, including teams that have not
/// recorded a result yet. Qualification means winning at least half the
/// completed games.
pub fn round_robin_standings(
    teams: &[GeneratedTeam],
    results: &[TournamentResult],
) -> Vec<StandingEntry> {
    let mut standings: Vec<StandingEntry> = teams
        .iter()
        .map(|team| {
            let record = results
                .iter()
                .find(|r| same_players(&r.player_ids, &team.player_ids))
                .map(|r| &r.round_robin_scores);
            let (wins, losses, played) = record
                .map(|rr| (rr.rr_won, rr.rr_lost, rr.rr_played))
                .unwrap_or((0, 0, 0));
            StandingEntry {
                team_name: team.name.clone(),
                player_ids: team.player_ids.clone(),
                combined_seed: team.combined_seed,
                wins,
                losses,
                played,
                win_percentage: ratio(wins, played),
                qualified: wins >= played / 2,
                rank: 0,
            }
        })
        .collect();
    standings.sort_by(|a, b| {
        b.win_percentage
            .partial_cmp(&a.win_percentage)
            .unwrap_or(Ordering::Equal)
            .then(a.combined_seed.cmp(&b.combined_seed))
    });
    for (i, entry) in standings.iter_mut().enumerate() {
        entry.rank = i as i32 + 1;
    }
    standings
}

/// Computes the round robin table and writes rank and percentage onto each
/// team's result document.
pub async fn compute_round_robin_standings(
    state: &AppState,
    tournament: &Tournament,
) -> Result<Vec<StandingEntry>> {
    let results = results::list_by_tournament(&state.store, tournament.id).await;
    let standings = round_robin_standings(&tournament.generated_teams, &results);
    for entry in &standings {
        if let Some(mut result) =
            results::find_by_players(&state.store, tournament.id, &entry.player_ids).await
        {
            result.round_robin_scores.rr_rank = Some(entry.rank);
            result.round_robin_scores.rr_win_percentage = entry.win_percentage;
            results::save(&state.store, result).await?;
        }
    }
    info!(
        tournament_id = %tournament.id,
        teams = standings.len(),
        "round robin standings computed"
    );
    Ok(standings)
}

/// Placement from the bracket record, falling back to the round robin
/// record for teams that never reached a tracked bracket stage.
pub fn final_rank(rr: &RoundRobinScores, bracket: &BracketScores, team_count: usize) -> i32 {
    if bracket.finals_won > 0 {
        return 1;
    }
    if bracket.finals_lost > 0 {
        return 2;
    }
    if bracket.sf_lost > 0 {
        return 3;
    }
    if bracket.qf_lost > 0 {
        return 5.min(team_count as i32);
    }
    let by_record = ((1.0 - rr.rr_win_percentage) * team_count as f64).ceil() as i32;
    let middle = (team_count as f64 * 0.5).ceil() as i32;
    by_record.max(middle)
}

#[derive(Debug, Clone, Copy)]
pub struct CareerEvent {
    pub finish: i32,
    pub games_won: i32,
    pub games_played: i32,
    /// First place in a division format counts as a division championship,
    /// anywhere else as an individual one.
    pub division_format: bool,
}

pub fn apply_finish_to_career(mut player: Player, event: &CareerEvent) -> Player {
    let previous_bods = player.bods_played;
    player.bods_played += 1;
    player.games_played += event.games_played;
    player.games_won += event.games_won;
    player.best_result = Some(
        player
            .best_result
            .map_or(event.finish, |best| best.min(event.finish)),
    );
    player.winning_percentage = ratio(player.games_won, player.games_played);
    player.avg_finish = (player.avg_finish * previous_bods as f64 + event.finish as f64)
        / player.bods_played as f64;
    if event.finish == 1 {
        if event.division_format {
            player.division_championships += 1;
        } else {
            player.individual_championships += 1;
        }
    }
    player.total_championships = player.individual_championships + player.division_championships;
    player
}

pub(crate) async fn rollup_player_career(
    store: &Store,
    player_id: Uuid,
    event: &CareerEvent,
) -> bool {
    match players::find(store, player_id).await {
        Some(player) => {
            let updated = apply_finish_to_career(player, event);
            match players::save(store, updated).await {
                Ok(_) => true,
                Err(err) => {
                    warn!(%player_id, error = %err, "career update failed to save");
                    false
                }
            }
        }
        None => {
            warn!(%player_id, "player not found, career rollup skipped");
            false
        }
    }
}

/// Rebuilds every team's result from its completed matches, assigns final
/// placements and rolls the finishes into player careers.
pub async fn finalize_tournament(state: &AppState, tournament: &Tournament) -> Result<()> {
    let games = matches::list_by_tournament(&state.store, tournament.id).await;
    let completed: Vec<&Match> = games
        .iter()
        .filter(|m| m.status == MatchStatus::Completed)
        .collect();
    let team_count = tournament.generated_teams.len();
    let division = tournament.format.as_str();
    let division_format = tournament.format.is_division_format();

    let mut placements: Vec<(GeneratedTeam, CareerEvent)> = Vec::with_capacity(team_count);
    for team in &tournament.generated_teams {
        let existing =
            results::find_by_players(&state.store, tournament.id, &team.player_ids).await;

        let mut rr = RoundRobinScores::default();
        let mut bracket = BracketScores::default();
        for m in &completed {
            let won = if same_players(&m.team1.player_ids, &team.player_ids) {
                m.winner == Some(Winner::Team1)
            } else if same_players(&m.team2.player_ids, &team.player_ids) {
                m.winner == Some(Winner::Team2)
            } else {
                continue;
            };
            if m.round.is_round_robin() {
                rr.rr_played += 1;
                if won {
                    rr.rr_won += 1;
                } else {
                    rr.rr_lost += 1;
                }
                let slot = match m.round {
                    Round::RoundRobin1 => &mut rr.round1,
                    Round::RoundRobin2 => &mut rr.round2,
                    _ => &mut rr.round3,
                };
                *slot = Some(slot.unwrap_or(0) + i32::from(won));
            } else {
                bracket.bracket_played += 1;
                if won {
                    bracket.bracket_won += 1;
                } else {
                    bracket.bracket_lost += 1;
                }
                apply_bracket_stage(&mut bracket, m.round, won);
            }
        }
        rr.rr_win_percentage = ratio(rr.rr_won, rr.rr_played);
        // Rank was assigned when round robin play closed; keep it.
        rr.rr_rank = existing
            .as_ref()
            .and_then(|r| r.round_robin_scores.rr_rank);

        let finish = final_rank(&rr, &bracket, team_count);
        let totals = TotalStats {
            total_won: rr.rr_won + bracket.bracket_won,
            total_lost: rr.rr_lost + bracket.bracket_lost,
            total_played: rr.rr_played + bracket.bracket_played,
            win_percentage: ratio(
                rr.rr_won + bracket.bracket_won,
                rr.rr_played + bracket.bracket_played,
            ),
            final_rank: Some(finish),
            bod_finish: Some(finish),
            home: Some(tournament.location == "Home"),
        };
        let career = CareerEvent {
            finish,
            games_won: totals.total_won,
            games_played: totals.total_played,
            division_format,
        };

        let mut result = match existing {
            Some(r) => r,
            None => {
                results::insert(
                    &state.store,
                    CreateResultData {
                        tournament_id: tournament.id,
                        player_ids: team.player_ids.clone(),
                        player_names: team.player_names.clone(),
                        team_name: team.name.clone(),
                        division: division.to_string(),
                        seed: Some(team.combined_seed),
                    },
                )
                .await?
            }
        };
        result.round_robin_scores = rr;
        result.bracket_scores = bracket;
        result.total_stats = totals;
        result.seed = Some(team.combined_seed);
        results::save(&state.store, result).await?;
        placements.push((team.clone(), career));
    }

    placements.sort_by_key(|(_, career)| career.finish);
    for (team, career) in &placements {
        for player_id in &team.player_ids {
            rollup_player_career(&state.store, *player_id, career).await;
        }
    }

    info!(
        tournament_id = %tournament.id,
        teams = team_count,
        "tournament stats finalized"
    );
    state.events.publish(TournamentEvent::new(
        tournament.id,
        EventType::StatsUpdate,
        json!({ "finalized": true }),
    ));
    Ok(())
}
