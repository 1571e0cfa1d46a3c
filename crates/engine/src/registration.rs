use tracing::info;
use uuid::Uuid;

use infra::models::Tournament;
use infra::repos::players;
use infra::repos::tournaments::{CreateTournamentData, TournamentRepo, TournamentStatus};

use crate::error::{EngineError, Result};
use crate::live;
use crate::state::AppState;

fn validate_capacity(cap: i32) -> Result<()> {
    if !(2..=64).contains(&cap) || (cap & (cap - 1)) != 0 {
        return Err(EngineError::Validation(format!(
            "max players must be a power of two between 2 and 64, got {cap}"
        )));
    }
    Ok(())
}

/// Creates a tournament. The field cap, when given, has to be a power of
/// two so the bracket fills cleanly.
pub async fn create_tournament(
    state: &AppState,
    data: CreateTournamentData,
) -> Result<Tournament> {
    if let Some(cap) = data.max_players {
        validate_capacity(cap)?;
    }
    let repo = TournamentRepo::new(state.store.clone());
    let created = repo.create(data).await?;
    info!(
        tournament_id = %created.id,
        bod_number = created.bod_number,
        "tournament created"
    );
    Ok(created)
}

/// Signs a player up, spilling onto the waitlist once the field is full.
pub async fn add_player(
    state: &AppState,
    tournament_id: Uuid,
    player_id: Uuid,
) -> Result<Tournament> {
    let repo = TournamentRepo::new(state.store.clone());
    let mut tournament = repo
        .find(tournament_id)
        .await
        .ok_or_else(|| EngineError::NotFound(format!("tournament {tournament_id}")))?;

    if !matches!(
        tournament.status,
        TournamentStatus::Scheduled | TournamentStatus::Open
    ) {
        return Err(EngineError::Precondition(format!(
            "registration is closed while the tournament is {}",
            tournament.status.as_str()
        )));
    }
    if players::find(&state.store, player_id).await.is_none() {
        return Err(EngineError::NotFound(format!("player {player_id}")));
    }
    if tournament.registered_players.contains(&player_id)
        || tournament.waitlist_players.contains(&player_id)
    {
        return Err(EngineError::Conflict(format!(
            "player {player_id} is already registered"
        )));
    }

    let full = tournament
        .max_players
        .is_some_and(|cap| tournament.registered_players.len() >= cap as usize);
    if full {
        tournament.waitlist_players.push(player_id);
    } else {
        tournament.registered_players.push(player_id);
    }

    let saved = repo.save(tournament).await?;
    live::emit_action(state, tournament_id, "player_registered");
    Ok(saved)
}

/// Drops a player; the first waitlisted player takes the freed spot.
pub async fn remove_player(
    state: &AppState,
    tournament_id: Uuid,
    player_id: Uuid,
) -> Result<Tournament> {
    let repo = TournamentRepo::new(state.store.clone());
    let mut tournament = repo
        .find(tournament_id)
        .await
        .ok_or_else(|| EngineError::NotFound(format!("tournament {tournament_id}")))?;

    if let Some(pos) = tournament
        .registered_players
        .iter()
        .position(|id| *id == player_id)
    {
        tournament.registered_players.remove(pos);
        if !tournament.waitlist_players.is_empty() {
            let promoted = tournament.waitlist_players.remove(0);
            tournament.registered_players.push(promoted);
            info!(%tournament_id, player_id = %promoted, "promoted from waitlist");
        }
    } else if let Some(pos) = tournament
        .waitlist_players
        .iter()
        .position(|id| *id == player_id)
    {
        tournament.waitlist_players.remove(pos);
    } else {
        return Err(EngineError::NotFound(format!(
            "player {player_id} is not registered"
        )));
    }

    let saved = repo.save(tournament).await?;
    live::emit_action(state, tournament_id, "player_removed");
    Ok(saved)
}
