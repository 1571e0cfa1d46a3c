pub mod matches;
pub mod players;
pub mod results;
pub mod tournaments;

pub use matches::{CreateMatchData, MatchStatus, Round, Winner};
pub use players::CreatePlayerData;
pub use results::CreateResultData;
pub use tournaments::{
    BracketType, CreateTournamentData, SeedingMethod, TeamFormationMethod, TournamentFormat,
    TournamentRepo, TournamentStatus,
};
