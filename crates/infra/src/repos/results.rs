use chrono::Utc;
use uuid::Uuid;

use crate::models::{BracketScores, RoundRobinScores, TotalStats, TournamentResult};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone)]
pub struct CreateResultData {
    pub tournament_id: Uuid,
    pub player_ids: Vec<Uuid>,
    pub player_names: Vec<String>,
    pub team_name: String,
    pub division: String,
    pub seed: Option<i32>,
}

/// Order-insensitive roster comparison; one result per player set.
fn same_players(a: &[Uuid], b: &[Uuid]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left = a.to_vec();
    let mut right = b.to_vec();
    left.sort();
    right.sort();
    left == right
}

pub async fn insert(store: &Store, data: CreateResultData) -> Result<TournamentResult, StoreError> {
    let now = Utc::now();
    let mut collections = store.write();
    if collections
        .results
        .values()
        .any(|r| r.tournament_id == data.tournament_id && same_players(&r.player_ids, &data.player_ids))
    {
        return Err(StoreError::Duplicate(format!(
            "result for team {} in tournament {}",
            data.team_name, data.tournament_id
        )));
    }
    let result = TournamentResult {
        id: Uuid::new_v4(),
        tournament_id: data.tournament_id,
        player_ids: data.player_ids,
        player_names: data.player_names,
        team_name: data.team_name,
        division: data.division,
        seed: data.seed,
        round_robin_scores: RoundRobinScores::default(),
        bracket_scores: BracketScores::default(),
        total_stats: TotalStats::default(),
        created_at: now,
        updated_at: now,
    };
    collections.results.insert(result.id, result.clone());
    Ok(result)
}

/// Inserts a fully formed document (imports, compensation).
pub async fn insert_full(
    store: &Store,
    result: TournamentResult,
) -> Result<TournamentResult, StoreError> {
    let mut collections = store.write();
    if collections.results.contains_key(&result.id) {
        return Err(StoreError::Duplicate(format!("result {}", result.id)));
    }
    if collections
        .results
        .values()
        .any(|r| r.tournament_id == result.tournament_id && same_players(&r.player_ids, &result.player_ids))
    {
        return Err(StoreError::Duplicate(format!(
            "result for team {} in tournament {}",
            result.team_name, result.tournament_id
        )));
    }
    collections.results.insert(result.id, result.clone());
    Ok(result)
}

pub async fn find(store: &Store, id: Uuid) -> Option<TournamentResult> {
    store.read().results.get(&id).cloned()
}

pub async fn find_by_players(
    store: &Store,
    tournament_id: Uuid,
    player_ids: &[Uuid],
) -> Option<TournamentResult> {
    store
        .read()
        .results
        .values()
        .find(|r| r.tournament_id == tournament_id && same_players(&r.player_ids, player_ids))
        .cloned()
}

pub async fn list_by_tournament(store: &Store, tournament_id: Uuid) -> Vec<TournamentResult> {
    let mut results: Vec<TournamentResult> = store
        .read()
        .results
        .values()
        .filter(|r| r.tournament_id == tournament_id)
        .cloned()
        .collect();
    results.sort_by(|a, b| a.team_name.cmp(&b.team_name));
    results
}

pub async fn save(store: &Store, mut result: TournamentResult) -> Result<TournamentResult, StoreError> {
    let mut collections = store.write();
    if !collections.results.contains_key(&result.id) {
        return Err(StoreError::NotFound(format!("result {}", result.id)));
    }
    result.updated_at = Utc::now();
    collections.results.insert(result.id, result.clone());
    Ok(result)
}

/// Deletes up to `limit` results of the tournament, team name order, and
/// reports how many were actually removed.
pub async fn delete_batch(store: &Store, tournament_id: Uuid, limit: usize) -> usize {
    let mut collections = store.write();
    let mut ids: Vec<(String, Uuid)> = collections
        .results
        .values()
        .filter(|r| r.tournament_id == tournament_id)
        .map(|r| (r.team_name.clone(), r.id))
        .collect();
    ids.sort();
    ids.truncate(limit);
    for (_, id) in &ids {
        collections.results.remove(id);
    }
    ids.len()
}

pub async fn count_by_tournament(store: &Store, tournament_id: Uuid) -> usize {
    store
        .read()
        .results
        .values()
        .filter(|r| r.tournament_id == tournament_id)
        .count()
}
