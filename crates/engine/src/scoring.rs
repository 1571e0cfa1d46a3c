use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use infra::models::{AdminOverride, Match, TeamSide};
use infra::repos::matches::{self, MatchStatus, Winner};

use crate::error::{EngineError, Result};
use crate::events::{EventType, TournamentEvent};
use crate::live;
use crate::state::AppState;
use crate::stats;

#[derive(Debug, Clone, Default)]
pub struct MatchUpdateData {
    pub team1_score: Option<i32>,
    pub team2_score: Option<i32>,
    pub status: Option<MatchStatus>,
    pub winner: Option<Winner>,
    pub notes: Option<String>,
    pub player_scores: Option<HashMap<Uuid, i32>>,
    pub admin_override: Option<AdminOverride>,
}

/// Standard game: first to 11 with the lead capped at two past deuce.
/// 0-0 passes because an unstarted game carries that score.
pub fn validate_game_score(team1: i32, team2: i32) -> std::result::Result<(), String> {
    if team1 < 0 || team2 < 0 {
        return Err("scores cannot be negative".into());
    }
    if team1 == 0 && team2 == 0 {
        return Ok(());
    }
    if team1 == team2 {
        return Err("game cannot end in a tie".into());
    }
    let high = team1.max(team2);
    let low = team1.min(team2);
    if high == 11 && low <= 9 {
        return Ok(());
    }
    if low >= 10 && high - low == 2 {
        return Ok(());
    }
    Err(format!("{high}-{low} is not a valid game score"))
}

fn merge_player_scores(side: &mut TeamSide, entries: &HashMap<Uuid, i32>) -> bool {
    let mut touched = false;
    for (player_id, points) in entries {
        if side.player_ids.contains(player_id) {
            side.player_scores
                .get_or_insert_with(HashMap::new)
                .insert(*player_id, *points);
            touched = true;
        }
    }
    if touched {
        if let Some(scores) = &side.player_scores {
            side.score = scores.values().sum();
        }
    }
    touched
}

fn validate_completion(game: &Match) -> Result<()> {
    let winner = game
        .winner
        .ok_or_else(|| EngineError::Validation("a completed match needs a winner".into()))?;
    let (winning, losing) = match winner {
        Winner::Team1 => (game.team1.score, game.team2.score),
        Winner::Team2 => (game.team2.score, game.team1.score),
    };
    if winning <= losing {
        return Err(EngineError::Validation(format!(
            "winner score {winning} does not beat {losing}"
        )));
    }
    if let Err(reason) = validate_game_score(game.team1.score, game.team2.score) {
        if game.admin_override.is_some() {
            info!(match_id = %game.id, reason, "irregular score accepted under admin override");
        } else {
            return Err(EngineError::Validation(reason));
        }
    }
    Ok(())
}

/// Applies a partial update to a match. A score difference decides the
/// winner and completes the match on its own; an explicit status only
/// applies while the scores are level. Completing a match feeds both
/// teams' tournament results.
pub async fn apply_match_update(
    state: &AppState,
    match_id: Uuid,
    update: MatchUpdateData,
) -> Result<Match> {
    let mut game = matches::find(&state.store, match_id)
        .await
        .ok_or_else(|| EngineError::NotFound(format!("match {match_id}")))?;
    let was_completed = game.status == MatchStatus::Completed;

    if let Some(entries) = &update.player_scores {
        merge_player_scores(&mut game.team1, entries);
        merge_player_scores(&mut game.team2, entries);
    }
    if let Some(score) = update.team1_score {
        game.team1.score = score;
    }
    if let Some(score) = update.team2_score {
        game.team2.score = score;
    }
    if let Some(notes) = update.notes {
        game.notes = Some(notes);
    }
    if let Some(override_data) = update.admin_override {
        game.admin_override = Some(AdminOverride {
            timestamp: Utc::now(),
            ..override_data
        });
    }
    if let Some(winner) = update.winner {
        game.winner = Some(winner);
    }

    if game.team1.score != game.team2.score {
        game.winner = Some(if game.team1.score > game.team2.score {
            Winner::Team1
        } else {
            Winner::Team2
        });
        game.status = MatchStatus::Completed;
    } else if let Some(status) = update.status {
        game.status = status;
    }

    if game.status == MatchStatus::Completed {
        validate_completion(&game)?;
        if !was_completed {
            game.completed_date = Some(Utc::now());
        }
    }

    let saved = matches::save(&state.store, game).await?;
    state.events.publish(TournamentEvent::new(
        saved.tournament_id,
        EventType::MatchUpdate,
        json!({ "match_id": saved.id, "match": saved }),
    ));

    if !was_completed && saved.status == MatchStatus::Completed {
        stats::record_match_result(state, &saved).await?;
    }
    Ok(saved)
}

/// Marks every completed-but-unconfirmed match confirmed and follows up
/// with a single snapshot of the new state.
pub async fn confirm_completed_matches(
    state: &AppState,
    tournament_id: Uuid,
) -> Result<Vec<Match>> {
    let games = matches::list_by_tournament(&state.store, tournament_id).await;
    let mut confirmed = Vec::new();
    for mut game in games {
        if game.status != MatchStatus::Completed || game.confirmed {
            continue;
        }
        game.confirmed = true;
        let saved = matches::save(&state.store, game).await?;
        state.events.publish(TournamentEvent::new(
            tournament_id,
            EventType::MatchConfirmed,
            json!({ "match_id": saved.id }),
        ));
        confirmed.push(saved);
    }
    if !confirmed.is_empty() {
        info!(%tournament_id, count = confirmed.len(), "confirmed completed matches");
    }
    live::emit_snapshot(state, tournament_id).await;
    Ok(confirmed)
}
