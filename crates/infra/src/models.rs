use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::matches::{MatchStatus, Round, Winner};
use crate::repos::tournaments::{
    BracketType, SeedingMethod, TeamFormationMethod, TournamentFormat, TournamentStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: Uuid,
    pub bod_number: i32,
    pub date: DateTime<Utc>,
    pub format: TournamentFormat,
    pub location: String,
    pub max_players: Option<i32>,
    pub status: TournamentStatus,
    pub registration_open_at: Option<DateTime<Utc>>,
    pub registration_deadline: Option<DateTime<Utc>>,
    /// Preselected roster; filled from `registered_players` when
    /// registration closes.
    pub players: Vec<Uuid>,
    pub registered_players: Vec<Uuid>,
    pub waitlist_players: Vec<Uuid>,
    pub generated_seeds: Vec<SeedEntry>,
    pub generated_teams: Vec<GeneratedTeam>,
    pub champion: Option<Champion>,
    pub bracket_type: BracketType,
    pub seeding_config: SeedingConfig,
    pub team_formation_config: TeamFormationConfig,
    pub management_state: ManagementState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedEntry {
    pub player_id: Uuid,
    pub player_name: String,
    pub seed: i32,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTeam {
    pub id: Uuid,
    pub name: String,
    pub player_ids: Vec<Uuid>,
    pub player_names: Vec<String>,
    pub combined_seed: i32,
    pub checked_in: bool,
    pub stats: TeamStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamStats {
    pub avg_finish: f64,
    pub win_percentage: f64,
    pub championships: i32,
    pub bods_played: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Champion {
    pub player_id: Uuid,
    pub player_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedingConfig {
    pub method: SeedingMethod,
    pub championship_weight: f64,
    pub win_percentage_weight: f64,
    pub avg_finish_weight: f64,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            method: SeedingMethod::Historical,
            championship_weight: 0.3,
            win_percentage_weight: 0.4,
            avg_finish_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamFormationConfig {
    pub method: TeamFormationMethod,
}

impl Default for TeamFormationConfig {
    fn default() -> Self {
        Self {
            method: TeamFormationMethod::StatisticalPairing,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagementState {
    pub current_round: Option<Round>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub tournament_id: Uuid,
    /// Unique per tournament; generation continues after the highest
    /// existing number.
    pub match_number: i32,
    pub round: Round,
    pub round_number: i32,
    pub team1: TeamSide,
    pub team2: TeamSide,
    pub winner: Option<Winner>,
    pub status: MatchStatus,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub confirmed: bool,
    pub notes: Option<String>,
    pub admin_override: Option<AdminOverride>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamSide {
    pub player_ids: Vec<Uuid>,
    pub player_names: Vec<String>,
    pub score: i32,
    pub seed: Option<i32>,
    pub player_scores: Option<HashMap<Uuid, i32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOverride {
    pub reason: String,
    pub authorized_by: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentResult {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub player_ids: Vec<Uuid>,
    pub player_names: Vec<String>,
    pub team_name: String,
    pub division: String,
    pub seed: Option<i32>,
    pub round_robin_scores: RoundRobinScores,
    pub bracket_scores: BracketScores,
    pub total_stats: TotalStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-round win slots stay `None` until a finalization or import fills
/// them; live play only moves the aggregate counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundRobinScores {
    pub round1: Option<i32>,
    pub round2: Option<i32>,
    pub round3: Option<i32>,
    pub rr_won: i32,
    pub rr_lost: i32,
    pub rr_played: i32,
    pub rr_win_percentage: f64,
    pub rr_rank: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BracketScores {
    pub r16_won: i32,
    pub r16_lost: i32,
    pub qf_won: i32,
    pub qf_lost: i32,
    pub sf_won: i32,
    pub sf_lost: i32,
    pub finals_won: i32,
    pub finals_lost: i32,
    pub bracket_won: i32,
    pub bracket_lost: i32,
    pub bracket_played: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TotalStats {
    pub total_won: i32,
    pub total_lost: i32,
    pub total_played: i32,
    pub win_percentage: f64,
    pub final_rank: Option<i32>,
    pub bod_finish: Option<i32>,
    pub home: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub bods_played: i32,
    pub best_result: Option<i32>,
    pub avg_finish: f64,
    pub games_played: i32,
    pub games_won: i32,
    pub winning_percentage: f64,
    pub individual_championships: i32,
    pub division_championships: i32,
    /// Always `individual + division`; recomputed on every career update.
    pub total_championships: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
