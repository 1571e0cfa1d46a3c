use std::collections::HashMap;

use futures_util::{Stream, StreamExt};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;

use infra::repos::matches;
use infra::repos::results;
use infra::repos::tournaments::TournamentRepo;

use crate::error::{EngineError, Result};
use crate::events::{self, EventType, TournamentEvent};
use crate::phase::{calculate_phase, PhaseInfo};
use crate::state::AppState;
use crate::stats::round_robin_standings;

pub async fn phase_info(state: &AppState, tournament_id: Uuid) -> Result<PhaseInfo> {
    let repo = TournamentRepo::new(state.store.clone());
    let tournament = repo
        .find(tournament_id)
        .await
        .ok_or_else(|| EngineError::NotFound(format!("tournament {tournament_id}")))?;
    let games = matches::list_by_tournament(&state.store, tournament_id).await;
    Ok(calculate_phase(&tournament, &games))
}

pub fn emit_action(state: &AppState, tournament_id: Uuid, action: &str) {
    state.events.publish(TournamentEvent::new(
        tournament_id,
        EventType::Action,
        json!({ "action": action }),
    ));
}

/// Publishes a full snapshot of the tournament: the document itself, its
/// matches, the derived phase, current standings and the check-in map.
/// Best effort; a missing tournament just skips the pulse.
pub async fn emit_snapshot(state: &AppState, tournament_id: Uuid) {
    let repo = TournamentRepo::new(state.store.clone());
    let Some(tournament) = repo.find(tournament_id).await else {
        debug!(%tournament_id, "snapshot skipped, tournament gone");
        return;
    };
    let games = matches::list_by_tournament(&state.store, tournament_id).await;
    let records = results::list_by_tournament(&state.store, tournament_id).await;
    let phase = calculate_phase(&tournament, &games);
    let standings = round_robin_standings(&tournament.generated_teams, &records);
    let check_in: HashMap<Uuid, bool> = tournament
        .generated_teams
        .iter()
        .map(|team| (team.id, team.checked_in))
        .collect();
    state.events.publish(TournamentEvent::new(
        tournament_id,
        EventType::Snapshot,
        json!({
            "tournament": tournament,
            "phase": phase,
            "matches": games,
            "standings": standings,
            "check_in": check_in,
        }),
    ));
}

struct PulseGuard(JoinHandle<()>);

impl Drop for PulseGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Event stream for one tournament. Subscribers get every published event
/// plus a periodic snapshot pulse; the first snapshot fires immediately.
/// Dropping the stream stops the pulse task.
pub fn live_updates(
    state: &AppState,
    tournament_id: Uuid,
) -> impl Stream<Item = TournamentEvent> {
    let receiver = events::subscribe(tournament_id);
    let pulse_state = state.clone();
    let pulse = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(pulse_state.config.pulse_interval());
        loop {
            ticker.tick().await;
            emit_snapshot(&pulse_state, tournament_id).await;
        }
    });
    let guard = PulseGuard(pulse);

    async_stream::stream! {
        let _guard = guard;
        let mut inner = BroadcastStream::new(receiver);
        while let Some(item) = inner.next().await {
            match item {
                Ok(event) => yield event,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(%tournament_id, skipped, "live subscriber lagged behind");
                }
            }
        }
    }
}
