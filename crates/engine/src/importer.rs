use serde::Deserialize;
use tracing::{debug, info};

use infra::models::{Match, Tournament, TournamentResult};
use infra::repos::matches;
use infra::repos::results;
use infra::repos::tournaments::{TournamentRepo, TournamentStatus};
use uuid::Uuid;

use crate::error::Result;
use crate::state::AppState;
use crate::stats::{self, CareerEvent};

/// A historical tournament with everything it produced. Imports always
/// land as completed; nothing here goes through live play.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportData {
    pub tournament: Tournament,
    pub matches: Vec<Match>,
    pub results: Vec<TournamentResult>,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub tournament_id: Uuid,
    pub matches: usize,
    pub results: usize,
    pub rollup_failures: usize,
}

pub async fn import_tournament(state: &AppState, data: ImportData) -> Result<ImportSummary> {
    let repo = TournamentRepo::new(state.store.clone());
    let mut tournament = data.tournament;
    tournament.status = TournamentStatus::Completed;
    let division_format = tournament.format.is_division_format();
    let tournament = repo.insert(tournament).await?;

    let mut imported_matches = 0;
    for mut game in data.matches {
        game.tournament_id = tournament.id;
        matches::insert_full(&state.store, game).await?;
        imported_matches += 1;
    }

    let mut imported_results = 0;
    let mut rollup_failures = 0;
    for mut result in data.results {
        result.tournament_id = tournament.id;
        let result = results::insert_full(&state.store, result).await?;
        imported_results += 1;

        let finish = result
            .total_stats
            .bod_finish
            .or(result.total_stats.final_rank);
        let Some(finish) = finish else {
            debug!(result_id = %result.id, "imported result has no finish, careers untouched");
            continue;
        };
        let career = CareerEvent {
            finish,
            games_won: result.total_stats.total_won,
            games_played: result.total_stats.total_played,
            division_format,
        };
        for player_id in &result.player_ids {
            if !stats::rollup_player_career(&state.store, *player_id, &career).await {
                rollup_failures += 1;
            }
        }
    }

    info!(
        tournament_id = %tournament.id,
        bod_number = tournament.bod_number,
        matches = imported_matches,
        results = imported_results,
        rollup_failures,
        "tournament imported"
    );
    Ok(ImportSummary {
        tournament_id: tournament.id,
        matches: imported_matches,
        results: imported_results,
        rollup_failures,
    })
}
