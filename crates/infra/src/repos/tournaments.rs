use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    GeneratedTeam, ManagementState, SeedEntry, SeedingConfig, TeamFormationConfig, Tournament,
};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    Scheduled,
    Open,
    Active,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Scheduled => "scheduled",
            TournamentStatus::Open => "open",
            TournamentStatus::Active => "active",
            TournamentStatus::Completed => "completed",
            TournamentStatus::Cancelled => "cancelled",
        }
    }

    /// Fixed transition table. `completed` is terminal; `cancelled`
    /// tournaments can be rescheduled or reopened.
    pub fn can_transition_to(self, next: TournamentStatus) -> bool {
        use TournamentStatus::*;
        matches!(
            (self, next),
            (Scheduled, Open)
                | (Scheduled, Cancelled)
                | (Open, Active)
                | (Open, Cancelled)
                | (Open, Scheduled)
                | (Active, Completed)
                | (Active, Cancelled)
                | (Cancelled, Scheduled)
                | (Cancelled, Open)
        )
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(TournamentStatus::Scheduled),
            "open" => Ok(TournamentStatus::Open),
            "active" => Ok(TournamentStatus::Active),
            "completed" => Ok(TournamentStatus::Completed),
            "cancelled" => Ok(TournamentStatus::Cancelled),
            _ => Err(format!("Unknown tournament status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentFormat {
    #[serde(rename = "M")]
    M,
    #[serde(rename = "W")]
    W,
    #[serde(rename = "Mixed")]
    Mixed,
    #[serde(rename = "Men's Singles")]
    MensSingles,
    #[serde(rename = "Men's Doubles")]
    MensDoubles,
    #[serde(rename = "Women's Doubles")]
    WomensDoubles,
    #[serde(rename = "Mixed Doubles")]
    MixedDoubles,
}

impl TournamentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::M => "M",
            TournamentFormat::W => "W",
            TournamentFormat::Mixed => "Mixed",
            TournamentFormat::MensSingles => "Men's Singles",
            TournamentFormat::MensDoubles => "Men's Doubles",
            TournamentFormat::WomensDoubles => "Women's Doubles",
            TournamentFormat::MixedDoubles => "Mixed Doubles",
        }
    }

    /// Short division codes; a first-place finish in one of these counts as
    /// a division championship rather than an individual one.
    pub fn is_division_format(self) -> bool {
        matches!(
            self,
            TournamentFormat::M | TournamentFormat::W | TournamentFormat::Mixed
        )
    }
}

impl FromStr for TournamentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(TournamentFormat::M),
            "W" => Ok(TournamentFormat::W),
            "Mixed" => Ok(TournamentFormat::Mixed),
            "Men's Singles" => Ok(TournamentFormat::MensSingles),
            "Men's Doubles" => Ok(TournamentFormat::MensDoubles),
            "Women's Doubles" => Ok(TournamentFormat::WomensDoubles),
            "Mixed Doubles" => Ok(TournamentFormat::MixedDoubles),
            _ => Err(format!("Unknown tournament format: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketType {
    SingleElimination,
    RoundRobinPlayoff,
}

impl BracketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BracketType::SingleElimination => "single_elimination",
            BracketType::RoundRobinPlayoff => "round_robin_playoff",
        }
    }
}

impl FromStr for BracketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_elimination" => Ok(BracketType::SingleElimination),
            "round_robin_playoff" => Ok(BracketType::RoundRobinPlayoff),
            _ => Err(format!("Unknown bracket type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingMethod {
    Historical,
    RecentForm,
    Elo,
    Manual,
}

impl SeedingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedingMethod::Historical => "historical",
            SeedingMethod::RecentForm => "recent_form",
            SeedingMethod::Elo => "elo",
            SeedingMethod::Manual => "manual",
        }
    }
}

impl FromStr for SeedingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "historical" => Ok(SeedingMethod::Historical),
            "recent_form" => Ok(SeedingMethod::RecentForm),
            "elo" => Ok(SeedingMethod::Elo),
            "manual" => Ok(SeedingMethod::Manual),
            _ => Err(format!("Unknown seeding method: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamFormationMethod {
    Manual,
    Random,
    StatisticalPairing,
    Preformed,
    Draft,
}

impl TeamFormationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamFormationMethod::Manual => "manual",
            TeamFormationMethod::Random => "random",
            TeamFormationMethod::StatisticalPairing => "statistical_pairing",
            TeamFormationMethod::Preformed => "preformed",
            TeamFormationMethod::Draft => "draft",
        }
    }
}

impl FromStr for TeamFormationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(TeamFormationMethod::Manual),
            "random" => Ok(TeamFormationMethod::Random),
            "statistical_pairing" => Ok(TeamFormationMethod::StatisticalPairing),
            "preformed" => Ok(TeamFormationMethod::Preformed),
            "draft" => Ok(TeamFormationMethod::Draft),
            _ => Err(format!("Unknown team formation method: {s}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTournamentData {
    pub date: DateTime<Utc>,
    pub format: TournamentFormat,
    pub location: String,
    pub max_players: Option<i32>,
    pub status: Option<TournamentStatus>,
    pub players: Vec<Uuid>,
    pub registration_open_at: Option<DateTime<Utc>>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub bracket_type: Option<BracketType>,
    pub seeding_config: Option<SeedingConfig>,
    pub team_formation_config: Option<TeamFormationConfig>,
    pub generated_seeds: Vec<SeedEntry>,
    pub generated_teams: Vec<GeneratedTeam>,
}

pub struct TournamentRepo {
    store: Store,
}

impl TournamentRepo {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn find(&self, id: Uuid) -> Option<Tournament> {
        self.store.read().tournaments.get(&id).cloned()
    }

    pub async fn list(&self) -> Vec<Tournament> {
        let mut tournaments: Vec<Tournament> =
            self.store.read().tournaments.values().cloned().collect();
        tournaments.sort_by_key(|t| t.bod_number);
        tournaments
    }

    pub async fn next_bod_number(&self) -> i32 {
        self.store
            .read()
            .tournaments
            .values()
            .map(|t| t.bod_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Creates a tournament with the next free BOD number.
    pub async fn create(&self, data: CreateTournamentData) -> Result<Tournament, StoreError> {
        let now = Utc::now();
        let mut collections = self.store.write();
        let bod_number = collections
            .tournaments
            .values()
            .map(|t| t.bod_number)
            .max()
            .unwrap_or(0)
            + 1;
        let tournament = Tournament {
            id: Uuid::new_v4(),
            bod_number,
            date: data.date,
            format: data.format,
            location: data.location,
            max_players: data.max_players,
            status: data.status.unwrap_or(TournamentStatus::Scheduled),
            registration_open_at: data.registration_open_at,
            registration_deadline: data.registration_deadline,
            players: data.players,
            registered_players: Vec::new(),
            waitlist_players: Vec::new(),
            generated_seeds: data.generated_seeds,
            generated_teams: data.generated_teams,
            champion: None,
            bracket_type: data.bracket_type.unwrap_or(BracketType::RoundRobinPlayoff),
            seeding_config: data.seeding_config.unwrap_or_default(),
            team_formation_config: data.team_formation_config.unwrap_or_default(),
            management_state: ManagementState::default(),
            created_at: now,
            updated_at: now,
        };
        collections.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    /// Inserts a fully formed document (imports, compensation). The BOD
    /// number and id must both be free.
    pub async fn insert(&self, tournament: Tournament) -> Result<Tournament, StoreError> {
        let mut collections = self.store.write();
        if collections.tournaments.contains_key(&tournament.id) {
            return Err(StoreError::Duplicate(format!(
                "tournament {}",
                tournament.id
            )));
        }
        if collections
            .tournaments
            .values()
            .any(|t| t.bod_number == tournament.bod_number)
        {
            return Err(StoreError::Duplicate(format!(
                "tournament BOD {}",
                tournament.bod_number
            )));
        }
        collections.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    pub async fn save(&self, mut tournament: Tournament) -> Result<Tournament, StoreError> {
        let mut collections = self.store.write();
        if !collections.tournaments.contains_key(&tournament.id) {
            return Err(StoreError::NotFound(format!(
                "tournament {}",
                tournament.id
            )));
        }
        tournament.updated_at = Utc::now();
        collections.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    /// Removes and returns the document so callers can keep a snapshot.
    pub async fn delete(&self, id: Uuid) -> Result<Tournament, StoreError> {
        self.store
            .write()
            .tournaments
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("tournament {id}")))
    }
}
