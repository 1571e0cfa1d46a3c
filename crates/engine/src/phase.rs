use std::str::FromStr;

use infra::models::{Match, Tournament};
use infra::repos::matches::{MatchStatus, Round};
use infra::repos::tournaments::TournamentStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Registration,
    CheckIn,
    RoundRobin,
    Bracket,
    Completed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Registration => "registration",
            Phase::CheckIn => "check_in",
            Phase::RoundRobin => "round_robin",
            Phase::Bracket => "bracket",
            Phase::Completed => "completed",
        }
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(Phase::Setup),
            "registration" => Ok(Phase::Registration),
            "check_in" => Ok(Phase::CheckIn),
            "round_robin" => Ok(Phase::RoundRobin),
            "bracket" => Ok(Phase::Bracket),
            "completed" => Ok(Phase::Completed),
            _ => Err(format!("Unknown phase: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::NotStarted => "not_started",
            RoundStatus::InProgress => "in_progress",
            RoundStatus::Completed => "completed",
        }
    }
}

/// Where a tournament stands, derived entirely from its document and its
/// matches. Nothing here is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseInfo {
    pub phase: Phase,
    pub current_round: Option<Round>,
    pub round_status: RoundStatus,
    pub can_advance: bool,
    pub completed_matches: usize,
    pub total_matches: usize,
}

impl PhaseInfo {
    fn idle(phase: Phase) -> Self {
        Self {
            phase,
            current_round: None,
            round_status: RoundStatus::NotStarted,
            can_advance: false,
            completed_matches: 0,
            total_matches: 0,
        }
    }
}

pub fn calculate_phase(tournament: &Tournament, matches: &[Match]) -> PhaseInfo {
    match tournament.status {
        TournamentStatus::Scheduled | TournamentStatus::Cancelled => PhaseInfo::idle(Phase::Setup),
        TournamentStatus::Open => PhaseInfo::idle(Phase::Registration),
        TournamentStatus::Completed => PhaseInfo {
            phase: Phase::Completed,
            current_round: None,
            round_status: RoundStatus::Completed,
            can_advance: false,
            completed_matches: matches
                .iter()
                .filter(|m| m.status == MatchStatus::Completed)
                .count(),
            total_matches: matches.len(),
        },
        TournamentStatus::Active => active_phase(tournament, matches),
    }
}

fn active_phase(tournament: &Tournament, matches: &[Match]) -> PhaseInfo {
    if matches.is_empty() {
        // A roster or formed teams means play is about to start; otherwise
        // the field is still checking in.
        if !tournament.players.is_empty() || !tournament.generated_teams.is_empty() {
            return PhaseInfo {
                phase: Phase::RoundRobin,
                current_round: Some(Round::RoundRobin1),
                round_status: RoundStatus::NotStarted,
                can_advance: false,
                completed_matches: 0,
                total_matches: 0,
            };
        }
        return PhaseInfo::idle(Phase::CheckIn);
    }

    let bracket: Vec<&Match> = matches
        .iter()
        .filter(|m| m.round.bracket_order() > 0)
        .collect();
    if !bracket.is_empty() {
        let current = bracket
            .iter()
            .max_by_key(|m| m.round.bracket_order())
            .map(|m| m.round);
        return subset_info(Phase::Bracket, current, &bracket);
    }

    let round_robin: Vec<&Match> = matches.iter().filter(|m| m.round.is_round_robin()).collect();
    let current = round_robin
        .iter()
        .max_by_key(|m| m.round.round_number())
        .map(|m| m.round);
    subset_info(Phase::RoundRobin, current, &round_robin)
}

fn subset_info(phase: Phase, current_round: Option<Round>, subset: &[&Match]) -> PhaseInfo {
    let (completed, in_progress) = progress(subset.iter().copied());
    let round_status = if !subset.is_empty() && completed == subset.len() {
        RoundStatus::Completed
    } else if completed > 0 || in_progress > 0 {
        RoundStatus::InProgress
    } else {
        RoundStatus::NotStarted
    };
    PhaseInfo {
        phase,
        current_round,
        round_status,
        can_advance: round_status == RoundStatus::Completed,
        completed_matches: completed,
        total_matches: subset.len(),
    }
}

fn progress<'a>(matches: impl Iterator<Item = &'a Match>) -> (usize, usize) {
    let mut completed = 0;
    let mut in_progress = 0;
    for m in matches {
        match m.status {
            MatchStatus::Completed => completed += 1,
            MatchStatus::InProgress => in_progress += 1,
            _ => {}
        }
    }
    (completed, in_progress)
}
