use std::str::FromStr;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use infra::models::{Champion, Tournament};
use infra::repos::matches::{self, MatchStatus, Round, Winner};
use infra::repos::tournaments::{TournamentRepo, TournamentStatus};

use crate::error::{EngineError, Result};
use crate::events::{EventType, TournamentEvent};
use crate::live;
use crate::matchgen::{self, generate_matches_for_round};
use crate::phase::{calculate_phase, Phase};
use crate::state::AppState;
use crate::stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    StartRegistration,
    CloseRegistration,
    StartCheckin,
    StartRoundRobin,
    AdvanceRound,
    StartBracket,
    CompleteTournament,
    ResetTournament,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::StartRegistration => "start_registration",
            AdminAction::CloseRegistration => "close_registration",
            AdminAction::StartCheckin => "start_checkin",
            AdminAction::StartRoundRobin => "start_round_robin",
            AdminAction::AdvanceRound => "advance_round",
            AdminAction::StartBracket => "start_bracket",
            AdminAction::CompleteTournament => "complete_tournament",
            AdminAction::ResetTournament => "reset_tournament",
        }
    }
}

impl FromStr for AdminAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "start_registration" => Ok(AdminAction::StartRegistration),
            "close_registration" => Ok(AdminAction::CloseRegistration),
            "start_checkin" => Ok(AdminAction::StartCheckin),
            "start_round_robin" => Ok(AdminAction::StartRoundRobin),
            "advance_round" => Ok(AdminAction::AdvanceRound),
            "start_bracket" => Ok(AdminAction::StartBracket),
            "complete_tournament" => Ok(AdminAction::CompleteTournament),
            "reset_tournament" => Ok(AdminAction::ResetTournament),
            _ => Err(format!("Unknown admin action: {s}")),
        }
    }
}

/// Runs one lifecycle action against a tournament, broadcasts the action
/// tag and follows up with a rebuilt snapshot for live observers.
pub async fn dispatch_action(
    state: &AppState,
    tournament_id: Uuid,
    action: &str,
) -> Result<Tournament> {
    let parsed: AdminAction = action.parse().map_err(EngineError::Validation)?;
    let repo = TournamentRepo::new(state.store.clone());
    let tournament = repo
        .find(tournament_id)
        .await
        .ok_or_else(|| EngineError::NotFound(format!("tournament {tournament_id}")))?;

    info!(%tournament_id, action = parsed.as_str(), "dispatching admin action");
    let updated = match parsed {
        AdminAction::StartRegistration => start_registration(&repo, tournament).await?,
        AdminAction::CloseRegistration => close_registration(&repo, tournament).await?,
        AdminAction::StartCheckin => start_checkin(&repo, tournament).await?,
        AdminAction::StartRoundRobin => start_round_robin(state, &repo, tournament).await?,
        AdminAction::AdvanceRound => advance_round(state, &repo, tournament).await?,
        AdminAction::StartBracket => start_bracket(state, &repo, tournament).await?,
        AdminAction::CompleteTournament => complete_tournament(state, &repo, tournament).await?,
        AdminAction::ResetTournament => reset_tournament(state, &repo, tournament).await?,
    };
    live::emit_action(state, tournament_id, parsed.as_str());
    live::emit_snapshot(state, tournament_id).await;
    Ok(updated)
}

/// A preselected field goes straight to active; otherwise the tournament
/// opens for sign-ups.
async fn start_registration(repo: &TournamentRepo, tournament: Tournament) -> Result<Tournament> {
    let mut updated = tournament;
    updated.status = if !updated.players.is_empty() || !updated.generated_teams.is_empty() {
        TournamentStatus::Active
    } else {
        TournamentStatus::Open
    };
    Ok(repo.save(updated).await?)
}

/// Freezes the registered list into the playing roster.
async fn close_registration(repo: &TournamentRepo, tournament: Tournament) -> Result<Tournament> {
    let mut updated = tournament;
    updated.players = updated.registered_players.clone();
    updated.status = TournamentStatus::Active;
    Ok(repo.save(updated).await?)
}

async fn start_checkin(repo: &TournamentRepo, tournament: Tournament) -> Result<Tournament> {
    let mut updated = tournament;
    updated.status = TournamentStatus::Active;
    Ok(repo.save(updated).await?)
}

async fn start_round_robin(
    state: &AppState,
    repo: &TournamentRepo,
    tournament: Tournament,
) -> Result<Tournament> {
    generate_matches_for_round(
        state,
        &tournament,
        &tournament.generated_teams,
        Round::RoundRobin1,
    )
    .await?;
    let mut updated = tournament;
    updated.management_state.current_round = Some(Round::RoundRobin1);
    updated.status = TournamentStatus::Active;
    Ok(repo.save(updated).await?)
}

/// Moves a finished round forward: the next round robin leg, the bracket
/// cut after the third leg, the next bracket stage, or completion after
/// the final. A round still in play leaves the tournament untouched.
async fn advance_round(
    state: &AppState,
    repo: &TournamentRepo,
    tournament: Tournament,
) -> Result<Tournament> {
    let games = matches::list_by_tournament(&state.store, tournament.id).await;
    let phase = calculate_phase(&tournament, &games);
    if !phase.can_advance {
        info!(
            tournament_id = %tournament.id,
            phase = phase.phase.as_str(),
            completed = phase.completed_matches,
            total = phase.total_matches,
            "current round not finished, nothing to advance"
        );
        return Ok(tournament);
    }
    let Some(current) = phase.current_round else {
        return Ok(tournament);
    };

    match phase.phase {
        Phase::RoundRobin => {
            if let Some(next) = current.next_round_robin() {
                generate_matches_for_round(state, &tournament, &tournament.generated_teams, next)
                    .await?;
                let mut updated = tournament;
                updated.management_state.current_round = Some(next);
                Ok(repo.save(updated).await?)
            } else {
                stats::compute_round_robin_standings(state, &tournament).await?;
                generate_matches_for_round(
                    state,
                    &tournament,
                    &tournament.generated_teams,
                    Round::Quarterfinal,
                )
                .await?;
                let mut updated = tournament;
                updated.management_state.current_round = Some(Round::Quarterfinal);
                Ok(repo.save(updated).await?)
            }
        }
        Phase::Bracket => {
            let round_matches = matches::list_by_round(&state.store, tournament.id, current).await;
            let advancing = matchgen::advancing_teams(&round_matches);
            if let Some(next) = current.next_bracket_round() {
                generate_matches_for_round(state, &tournament, &advancing, next).await?;
                let mut updated = tournament;
                updated.management_state.current_round = Some(next);
                Ok(repo.save(updated).await?)
            } else {
                complete_tournament(state, repo, tournament).await
            }
        }
        _ => Ok(tournament),
    }
}

/// Seeds the bracket straight from the formed teams, sized to the field.
async fn start_bracket(
    state: &AppState,
    repo: &TournamentRepo,
    tournament: Tournament,
) -> Result<Tournament> {
    let round = match tournament.generated_teams.len() {
        0..=2 => Round::Final,
        3..=4 => Round::Semifinal,
        _ => Round::Quarterfinal,
    };
    generate_matches_for_round(state, &tournament, &tournament.generated_teams, round).await?;
    let mut updated = tournament;
    updated.management_state.current_round = Some(round);
    Ok(repo.save(updated).await?)
}

async fn determine_champion(state: &AppState, tournament_id: Uuid) -> Option<Champion> {
    let finals = matches::list_by_round(&state.store, tournament_id, Round::Final).await;
    finals
        .iter()
        .find(|m| m.status == MatchStatus::Completed && m.winner.is_some())
        .and_then(|m| {
            let side = match m.winner? {
                Winner::Team1 => &m.team1,
                Winner::Team2 => &m.team2,
            };
            Some(Champion {
                player_id: *side.player_ids.first()?,
                player_name: side.player_names.join(" & "),
            })
        })
}

async fn complete_tournament(
    state: &AppState,
    repo: &TournamentRepo,
    tournament: Tournament,
) -> Result<Tournament> {
    let mut updated = tournament;
    updated.status = TournamentStatus::Completed;
    if let Some(champion) = determine_champion(state, updated.id).await {
        updated.champion = Some(champion);
    }
    let saved = repo.save(updated).await?;
    stats::finalize_tournament(state, &saved).await?;
    Ok(saved)
}

/// Wipes all matches and puts the tournament back on the calendar.
async fn reset_tournament(
    state: &AppState,
    repo: &TournamentRepo,
    tournament: Tournament,
) -> Result<Tournament> {
    let removed = matches::delete_by_tournament(&state.store, tournament.id).await;
    info!(tournament_id = %tournament.id, removed, "tournament reset, matches dropped");
    let mut updated = tournament;
    updated.champion = None;
    updated.management_state.current_round = None;
    updated.status = TournamentStatus::Scheduled;
    Ok(repo.save(updated).await?)
}

/// Direct status change honoring the transition table; lifecycle actions
/// above move statuses on their own terms.
pub async fn update_status(
    state: &AppState,
    tournament_id: Uuid,
    next: TournamentStatus,
) -> Result<Tournament> {
    let repo = TournamentRepo::new(state.store.clone());
    let tournament = repo
        .find(tournament_id)
        .await
        .ok_or_else(|| EngineError::NotFound(format!("tournament {tournament_id}")))?;
    if !tournament.status.can_transition_to(next) {
        return Err(EngineError::Validation(format!(
            "Cannot change tournament status from {} to {}",
            tournament.status.as_str(),
            next.as_str()
        )));
    }
    let mut updated = tournament;
    updated.status = next;
    let saved = repo.save(updated).await?;
    live::emit_action(state, tournament_id, "status_update");
    Ok(saved)
}

/// Flips a team's check-in flag.
pub async fn check_in_team(
    state: &AppState,
    tournament_id: Uuid,
    team_id: Uuid,
    checked_in: bool,
) -> Result<Tournament> {
    let repo = TournamentRepo::new(state.store.clone());
    let mut tournament = repo
        .find(tournament_id)
        .await
        .ok_or_else(|| EngineError::NotFound(format!("tournament {tournament_id}")))?;
    let team = tournament
        .generated_teams
        .iter_mut()
        .find(|t| t.id == team_id)
        .ok_or_else(|| EngineError::NotFound(format!("team {team_id}")))?;
    team.checked_in = checked_in;
    let saved = repo.save(tournament).await?;
    state.events.publish(TournamentEvent::new(
        tournament_id,
        EventType::TeamCheckin,
        json!({ "team_id": team_id, "checked_in": checked_in }),
    ));
    Ok(saved)
}
