use chrono::Utc;
use uuid::Uuid;

use crate::models::Player;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone)]
pub struct CreatePlayerData {
    pub name: String,
}

pub async fn insert(store: &Store, data: CreatePlayerData) -> Result<Player, StoreError> {
    let now = Utc::now();
    let mut collections = store.write();
    if collections.players.values().any(|p| p.name == data.name) {
        return Err(StoreError::Duplicate(format!("player {}", data.name)));
    }
    let player = Player {
        id: Uuid::new_v4(),
        name: data.name,
        bods_played: 0,
        best_result: None,
        avg_finish: 0.0,
        games_played: 0,
        games_won: 0,
        winning_percentage: 0.0,
        individual_championships: 0,
        division_championships: 0,
        total_championships: 0,
        created_at: now,
        updated_at: now,
    };
    collections.players.insert(player.id, player.clone());
    Ok(player)
}

pub async fn find(store: &Store, id: Uuid) -> Option<Player> {
    store.read().players.get(&id).cloned()
}

/// Fetches players in the order given; unknown ids are skipped.
pub async fn get_many(store: &Store, ids: &[Uuid]) -> Vec<Player> {
    let collections = store.read();
    ids.iter()
        .filter_map(|id| collections.players.get(id).cloned())
        .collect()
}

pub async fn list(store: &Store) -> Vec<Player> {
    let mut players: Vec<Player> = store.read().players.values().cloned().collect();
    players.sort_by(|a, b| a.name.cmp(&b.name));
    players
}

pub async fn save(store: &Store, mut player: Player) -> Result<Player, StoreError> {
    let mut collections = store.write();
    if !collections.players.contains_key(&player.id) {
        return Err(StoreError::NotFound(format!("player {}", player.id)));
    }
    player.updated_at = Utc::now();
    collections.players.insert(player.id, player.clone());
    Ok(player)
}
