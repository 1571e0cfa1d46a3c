use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "action")]
    Action,
    #[serde(rename = "match:update")]
    MatchUpdate,
    #[serde(rename = "team:checkin")]
    TeamCheckin,
    #[serde(rename = "matches:generated")]
    MatchesGenerated,
    #[serde(rename = "match:confirmed")]
    MatchConfirmed,
    #[serde(rename = "stats:update")]
    StatsUpdate,
    #[serde(rename = "snapshot")]
    Snapshot,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Action => "action",
            EventType::MatchUpdate => "match:update",
            EventType::TeamCheckin => "team:checkin",
            EventType::MatchesGenerated => "matches:generated",
            EventType::MatchConfirmed => "match:confirmed",
            EventType::StatsUpdate => "stats:update",
            EventType::Snapshot => "snapshot",
        }
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "action" => Ok(EventType::Action),
            "match:update" => Ok(EventType::MatchUpdate),
            "team:checkin" => Ok(EventType::TeamCheckin),
            "matches:generated" => Ok(EventType::MatchesGenerated),
            "match:confirmed" => Ok(EventType::MatchConfirmed),
            "stats:update" => Ok(EventType::StatsUpdate),
            "snapshot" => Ok(EventType::Snapshot),
            _ => Err(format!("Unknown event type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentEvent {
    pub tournament_id: Uuid,
    pub event_type: EventType,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl TournamentEvent {
    pub fn new(tournament_id: Uuid, event_type: EventType, payload: Value) -> Self {
        Self {
            tournament_id,
            event_type,
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// Fan-out target for tournament events. Publishing never fails; an event
/// nobody listens to is simply dropped.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: TournamentEvent);
}

static CHANNELS: Lazy<Arc<Mutex<HashMap<Uuid, broadcast::Sender<TournamentEvent>>>>> =
    Lazy::new(|| Arc::new(Mutex::new(HashMap::new())));

fn get_or_create_channel(tournament_id: Uuid) -> broadcast::Sender<TournamentEvent> {
    let mut channels = CHANNELS.lock();
    channels
        .entry(tournament_id)
        .or_insert_with(|| broadcast::channel(100).0)
        .clone()
}

/// Subscribes to the per-tournament broadcast channel, creating it on
/// first use.
pub fn subscribe(tournament_id: Uuid) -> broadcast::Receiver<TournamentEvent> {
    get_or_create_channel(tournament_id).subscribe()
}

/// Drops the channel once a tournament is gone so the registry does not
/// accumulate dead senders.
pub fn cleanup_tournament_channel(tournament_id: Uuid) {
    let mut channels = CHANNELS.lock();
    if channels.remove(&tournament_id).is_some() {
        debug!(%tournament_id, "removed live channel");
    }
}

/// Publishes into the per-tournament broadcast channel.
pub struct BroadcastSink;

impl EventSink for BroadcastSink {
    fn publish(&self, event: TournamentEvent) {
        let sender = get_or_create_channel(event.tournament_id);
        let _ = sender.send(event);
    }
}

/// Swallows everything; handy in tests that do not watch the stream.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn publish(&self, _event: TournamentEvent) {}
}
