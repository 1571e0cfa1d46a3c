use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Match, TeamSide};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Round {
    #[serde(rename = "RR_R1")]
    RoundRobin1,
    #[serde(rename = "RR_R2")]
    RoundRobin2,
    #[serde(rename = "RR_R3")]
    RoundRobin3,
    #[serde(rename = "round-of-64")]
    RoundOf64,
    #[serde(rename = "round-of-32")]
    RoundOf32,
    #[serde(rename = "round-of-16")]
    RoundOf16,
    #[serde(rename = "quarterfinal")]
    Quarterfinal,
    #[serde(rename = "semifinal")]
    Semifinal,
    #[serde(rename = "final")]
    Final,
    #[serde(rename = "third-place")]
    ThirdPlace,
}

impl Round {
    pub fn as_str(&self) -> &'static str {
        match self {
            Round::RoundRobin1 => "RR_R1",
            Round::RoundRobin2 => "RR_R2",
            Round::RoundRobin3 => "RR_R3",
            Round::RoundOf64 => "round-of-64",
            Round::RoundOf32 => "round-of-32",
            Round::RoundOf16 => "round-of-16",
            Round::Quarterfinal => "quarterfinal",
            Round::Semifinal => "semifinal",
            Round::Final => "final",
            Round::ThirdPlace => "third-place",
        }
    }

    pub fn is_round_robin(self) -> bool {
        matches!(
            self,
            Round::RoundRobin1 | Round::RoundRobin2 | Round::RoundRobin3
        )
    }

    /// Display round number stored on each match document.
    pub fn round_number(self) -> i32 {
        match self {
            Round::RoundRobin1 => 1,
            Round::RoundRobin2 => 2,
            Round::RoundRobin3 => 3,
            Round::Quarterfinal => 4,
            Round::Semifinal => 5,
            Round::Final => 6,
            _ => 1,
        }
    }

    /// How many teams a bracket round admits. Rounds without a cap (round
    /// robin, early bracket rounds) return None and take the field as-is.
    pub fn required_team_count(self) -> Option<usize> {
        match self {
            Round::Quarterfinal => Some(8),
            Round::Semifinal => Some(4),
            Round::Final => Some(2),
            Round::ThirdPlace => Some(4),
            _ => None,
        }
    }

    pub fn next_round_robin(self) -> Option<Round> {
        match self {
            Round::RoundRobin1 => Some(Round::RoundRobin2),
            Round::RoundRobin2 => Some(Round::RoundRobin3),
            _ => None,
        }
    }

    pub fn next_bracket_round(self) -> Option<Round> {
        match self {
            Round::RoundOf64 => Some(Round::RoundOf32),
            Round::RoundOf32 => Some(Round::RoundOf16),
            Round::RoundOf16 => Some(Round::Quarterfinal),
            Round::Quarterfinal => Some(Round::Semifinal),
            Round::Semifinal => Some(Round::Final),
            _ => None,
        }
    }

    /// Ordering of bracket rounds from earliest to the final. Round robin
    /// rounds sit at zero so they never win a "deepest round" scan.
    pub fn bracket_order(self) -> i32 {
        match self {
            Round::RoundOf64 => 1,
            Round::RoundOf32 => 2,
            Round::RoundOf16 => 3,
            Round::Quarterfinal => 4,
            Round::Semifinal => 5,
            Round::ThirdPlace => 6,
            Round::Final => 7,
            _ => 0,
        }
    }
}

impl FromStr for Round {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RR_R1" => Ok(Round::RoundRobin1),
            "RR_R2" => Ok(Round::RoundRobin2),
            "RR_R3" => Ok(Round::RoundRobin3),
            "round-of-64" => Ok(Round::RoundOf64),
            "round-of-32" => Ok(Round::RoundOf32),
            "round-of-16" => Ok(Round::RoundOf16),
            "quarterfinal" => Ok(Round::Quarterfinal),
            "semifinal" => Ok(Round::Semifinal),
            "final" => Ok(Round::Final),
            "third-place" => Ok(Round::ThirdPlace),
            _ => Err(format!("Unknown round: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Postponed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in-progress",
            MatchStatus::Completed => "completed",
            MatchStatus::Cancelled => "cancelled",
            MatchStatus::Postponed => "postponed",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "in-progress" => Ok(MatchStatus::InProgress),
            "completed" => Ok(MatchStatus::Completed),
            "cancelled" => Ok(MatchStatus::Cancelled),
            "postponed" => Ok(MatchStatus::Postponed),
            _ => Err(format!("Unknown match status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Team1,
    Team2,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::Team1 => "team1",
            Winner::Team2 => "team2",
        }
    }
}

impl FromStr for Winner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team1" => Ok(Winner::Team1),
            "team2" => Ok(Winner::Team2),
            _ => Err(format!("Unknown winner side: {s}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateMatchData {
    pub tournament_id: Uuid,
    pub match_number: i32,
    pub round: Round,
    pub team1: TeamSide,
    pub team2: TeamSide,
    pub scheduled_date: Option<DateTime<Utc>>,
}

pub async fn insert(store: &Store, data: CreateMatchData) -> Result<Match, StoreError> {
    let now = Utc::now();
    let mut collections = store.write();
    if collections
        .matches
        .values()
        .any(|m| m.tournament_id == data.tournament_id && m.match_number == data.match_number)
    {
        return Err(StoreError::Duplicate(format!(
            "match {} in tournament {}",
            data.match_number, data.tournament_id
        )));
    }
    let game = Match {
        id: Uuid::new_v4(),
        tournament_id: data.tournament_id,
        match_number: data.match_number,
        round: data.round,
        round_number: data.round.round_number(),
        team1: data.team1,
        team2: data.team2,
        winner: None,
        status: MatchStatus::Scheduled,
        scheduled_date: data.scheduled_date,
        completed_date: None,
        confirmed: false,
        notes: None,
        admin_override: None,
        created_at: now,
        updated_at: now,
    };
    collections.matches.insert(game.id, game.clone());
    Ok(game)
}

/// Inserts a fully formed document (imports, compensation).
pub async fn insert_full(store: &Store, game: Match) -> Result<Match, StoreError> {
    let mut collections = store.write();
    if collections.matches.contains_key(&game.id) {
        return Err(StoreError::Duplicate(format!("match {}", game.id)));
    }
    if collections
        .matches
        .values()
        .any(|m| m.tournament_id == game.tournament_id && m.match_number == game.match_number)
    {
        return Err(StoreError::Duplicate(format!(
            "match {} in tournament {}",
            game.match_number, game.tournament_id
        )));
    }
    collections.matches.insert(game.id, game.clone());
    Ok(game)
}

pub async fn find(store: &Store, id: Uuid) -> Option<Match> {
    store.read().matches.get(&id).cloned()
}

pub async fn list_by_tournament(store: &Store, tournament_id: Uuid) -> Vec<Match> {
    let mut matches: Vec<Match> = store
        .read()
        .matches
        .values()
        .filter(|m| m.tournament_id == tournament_id)
        .cloned()
        .collect();
    matches.sort_by_key(|m| (m.round_number, m.match_number));
    matches
}

pub async fn list_by_round(store: &Store, tournament_id: Uuid, round: Round) -> Vec<Match> {
    let mut matches: Vec<Match> = store
        .read()
        .matches
        .values()
        .filter(|m| m.tournament_id == tournament_id && m.round == round)
        .cloned()
        .collect();
    matches.sort_by_key(|m| m.match_number);
    matches
}

pub async fn save(store: &Store, mut game: Match) -> Result<Match, StoreError> {
    let mut collections = store.write();
    if !collections.matches.contains_key(&game.id) {
        return Err(StoreError::NotFound(format!("match {}", game.id)));
    }
    game.updated_at = Utc::now();
    collections.matches.insert(game.id, game.clone());
    Ok(game)
}

/// Clears a round so it can be regenerated. Returns how many went away.
pub async fn delete_by_round(store: &Store, tournament_id: Uuid, round: Round) -> usize {
    let mut collections = store.write();
    let ids: Vec<Uuid> = collections
        .matches
        .values()
        .filter(|m| m.tournament_id == tournament_id && m.round == round)
        .map(|m| m.id)
        .collect();
    for id in &ids {
        collections.matches.remove(id);
    }
    ids.len()
}

pub async fn delete_by_tournament(store: &Store, tournament_id: Uuid) -> usize {
    let mut collections = store.write();
    let ids: Vec<Uuid> = collections
        .matches
        .values()
        .filter(|m| m.tournament_id == tournament_id)
        .map(|m| m.id)
        .collect();
    for id in &ids {
        collections.matches.remove(id);
    }
    ids.len()
}

/// Deletes up to `limit` matches of the tournament, lowest match number
/// first, and reports how many were actually removed.
pub async fn delete_batch(store: &Store, tournament_id: Uuid, limit: usize) -> usize {
    let mut collections = store.write();
    let mut ids: Vec<(i32, Uuid)> = collections
        .matches
        .values()
        .filter(|m| m.tournament_id == tournament_id)
        .map(|m| (m.match_number, m.id))
        .collect();
    ids.sort_by_key(|(number, _)| *number);
    ids.truncate(limit);
    for (_, id) in &ids {
        collections.matches.remove(id);
    }
    ids.len()
}

pub async fn count_by_tournament(store: &Store, tournament_id: Uuid) -> usize {
    store
        .read()
        .matches
        .values()
        .filter(|m| m.tournament_id == tournament_id)
        .count()
}

pub async fn highest_match_number(store: &Store, tournament_id: Uuid) -> i32 {
    store
        .read()
        .matches
        .values()
        .filter(|m| m.tournament_id == tournament_id)
        .map(|m| m.match_number)
        .max()
        .unwrap_or(0)
}
