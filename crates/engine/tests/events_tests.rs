mod common;

use common::*;

use std::str::FromStr;
use std::time::Duration;

use engine::actions::dispatch_action;
use engine::events::{self, EventType, TournamentEvent};
use engine::live::live_updates;
use futures_util::StreamExt;
use infra::repos::matches::{self, Round};
use infra::repos::tournaments::TournamentStatus;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout;
use uuid::Uuid;

#[test]
fn test_event_type_labels_round_trip() {
    let all = [
        EventType::Action,
        EventType::MatchUpdate,
        EventType::TeamCheckin,
        EventType::MatchesGenerated,
        EventType::MatchConfirmed,
        EventType::StatsUpdate,
        EventType::Snapshot,
    ];
    for event_type in all {
        assert_eq!(EventType::from_str(event_type.as_str()), Ok(event_type));
    }
    assert!(EventType::from_str("reload").is_err());
}

#[tokio::test]
async fn test_publish_reaches_subscribers() {
    let state = test_state();
    let tournament_id = Uuid::new_v4();
    let mut rx = events::subscribe(tournament_id);

    state.events.publish(TournamentEvent::new(
        tournament_id,
        EventType::Action,
        json!({ "action": "noop" }),
    ));

    let event = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event within timeout")
        .expect("channel open");
    assert_eq!(event.tournament_id, tournament_id);
    assert_eq!(event.event_type, EventType::Action);
    assert_eq!(event.payload["action"], "noop");
}

#[tokio::test]
async fn test_dispatch_publishes_action_event() {
    let state = test_state();
    let tournament = create_tournament(&state, TournamentStatus::Scheduled).await;
    let mut rx = events::subscribe(tournament.id);

    dispatch_action(&state, tournament.id, "start_registration")
        .await
        .expect("dispatch");

    let event = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event within timeout")
        .expect("channel open");
    assert_eq!(event.event_type, EventType::Action);
    assert_eq!(event.payload["action"], "start_registration");
}

#[tokio::test]
async fn test_match_completion_emits_update_then_stats() {
    let state = test_state();
    let tournament = active_tournament_with_teams(&state, 2).await;
    dispatch_action(&state, tournament.id, "start_bracket")
        .await
        .expect("start bracket");
    let game = matches::list_by_round(&state.store, tournament.id, Round::Final)
        .await
        .into_iter()
        .next()
        .expect("final match");

    let mut rx = events::subscribe(tournament.id);
    complete_match(&state, game.id, true).await;

    let first = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("first event")
        .expect("channel open");
    assert_eq!(first.event_type, EventType::MatchUpdate);
    assert_eq!(first.payload["match_id"], json!(game.id));

    let second = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("second event")
        .expect("channel open");
    assert_eq!(second.event_type, EventType::StatsUpdate);
}

#[tokio::test]
async fn test_live_stream_opens_with_a_snapshot() {
    let state = test_state();
    let tournament = create_tournament(&state, TournamentStatus::Open).await;

    let stream = live_updates(&state, tournament.id);
    tokio::pin!(stream);

    let event = timeout(Duration::from_secs(3), stream.next())
        .await
        .expect("snapshot within timeout")
        .expect("stream open");
    assert_eq!(event.event_type, EventType::Snapshot);
    assert!(event.payload.get("tournament").is_some());
    assert_eq!(event.payload["phase"]["phase"], "registration");
    assert!(event.payload["standings"].is_array());
    assert!(event.payload["check_in"].is_object());
}

#[tokio::test]
async fn test_dropping_the_stream_stops_the_pulse() {
    let state = test_state();
    let tournament = create_tournament(&state, TournamentStatus::Open).await;

    let mut rx = events::subscribe(tournament.id);
    {
        let stream = live_updates(&state, tournament.id);
        tokio::pin!(stream);
        timeout(Duration::from_secs(3), stream.next())
            .await
            .expect("first pulse")
            .expect("stream open");
    }

    // Let any in-flight pulse land, then the channel must stay quiet.
    tokio::time::sleep(Duration::from_millis(300)).await;
    while rx.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(
        rx.try_recv().is_err(),
        "pulse task must stop when the stream is dropped"
    );
}

#[tokio::test]
async fn test_cleanup_closes_live_channels() {
    let tournament_id = Uuid::new_v4();
    let mut rx = events::subscribe(tournament_id);

    events::cleanup_tournament_channel(tournament_id);

    match rx.recv().await {
        Err(RecvError::Closed) => {}
        other => panic!("expected closed channel, got {other:?}"),
    }
}
