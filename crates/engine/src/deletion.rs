use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::RngExt;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use infra::models::Tournament;
use infra::repos::matches;
use infra::repos::results;
use infra::repos::tournaments::{TournamentFormat, TournamentRepo, TournamentStatus};

use crate::events;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeletionErrorCode {
    InvalidId,
    NotFound,
    InvalidStatus,
    MatchesDeletionFailed,
    ResultsDeletionFailed,
    TournamentNotFoundForDeletion,
    TournamentDeletionFailed,
}

impl DeletionErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionErrorCode::InvalidId => "INVALID_ID",
            DeletionErrorCode::NotFound => "NOT_FOUND",
            DeletionErrorCode::InvalidStatus => "INVALID_STATUS",
            DeletionErrorCode::MatchesDeletionFailed => "MATCHES_DELETION_FAILED",
            DeletionErrorCode::ResultsDeletionFailed => "RESULTS_DELETION_FAILED",
            DeletionErrorCode::TournamentNotFoundForDeletion => "TOURNAMENT_NOT_FOUND_FOR_DELETION",
            DeletionErrorCode::TournamentDeletionFailed => "TOURNAMENT_DELETION_FAILED",
        }
    }
}

#[derive(Debug, Error)]
#[error("{}: {}", .code.as_str(), .message)]
pub struct DeletionError {
    pub code: DeletionErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl DeletionError {
    pub fn http_status(&self) -> u16 {
        match self.code {
            DeletionErrorCode::InvalidId => 400,
            DeletionErrorCode::NotFound => 404,
            DeletionErrorCode::InvalidStatus => 409,
            DeletionErrorCode::TournamentNotFoundForDeletion => 404,
            DeletionErrorCode::MatchesDeletionFailed
            | DeletionErrorCode::ResultsDeletionFailed
            | DeletionErrorCode::TournamentDeletionFailed => 500,
        }
    }

    /// Only failures inside an actual deletion step are worth retrying;
    /// validation rejections stay final.
    pub fn is_retryable(&self) -> bool {
        self.retryable
            && matches!(
                self.code,
                DeletionErrorCode::MatchesDeletionFailed
                    | DeletionErrorCode::ResultsDeletionFailed
                    | DeletionErrorCode::TournamentDeletionFailed
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    ValidateTournament,
    DeleteMatches,
    DeleteResults,
    DeleteTournament,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::ValidateTournament => "validate_tournament",
            StepName::DeleteMatches => "delete_matches",
            StepName::DeleteResults => "delete_results",
            StepName::DeleteTournament => "delete_tournament",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Compensated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Started,
    MatchesDeleted,
    ResultsDeleted,
    TournamentDeleted,
    Completed,
    Failed,
    Compensating,
}

#[derive(Debug)]
struct StepState {
    name: StepName,
    status: StepStatus,
    expected: usize,
    actual: usize,
    compensation_data: Option<Value>,
}

#[derive(Debug)]
struct DeletionOperation {
    correlation_id: String,
    status: OperationStatus,
    steps: Vec<StepState>,
}

impl DeletionOperation {
    fn new(correlation_id: String) -> Self {
        let steps = [
            StepName::ValidateTournament,
            StepName::DeleteMatches,
            StepName::DeleteResults,
            StepName::DeleteTournament,
        ]
        .into_iter()
        .map(|name| StepState {
            name,
            status: StepStatus::Pending,
            expected: 0,
            actual: 0,
            compensation_data: None,
        })
        .collect();
        Self {
            correlation_id,
            status: OperationStatus::Started,
            steps,
        }
    }

    fn step_mut(&mut self, name: StepName) -> &mut StepState {
        let index = match name {
            StepName::ValidateTournament => 0,
            StepName::DeleteMatches => 1,
            StepName::DeleteResults => 2,
            StepName::DeleteTournament => 3,
        };
        &mut self.steps[index]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepSummary {
    pub name: StepName,
    pub status: StepStatus,
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedTournament {
    pub bod_number: i32,
    pub format: TournamentFormat,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletionSummary {
    pub correlation_id: String,
    pub steps: Vec<StepSummary>,
    pub duration_ms: u64,
    pub tournament: DeletedTournament,
}

fn new_correlation_id() -> String {
    const ALPHANUM: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ALPHANUM[rng.random_range(0..ALPHANUM.len())] as char)
        .collect();
    format!("del_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Restores what a completed tournament step deleted. Match and result
/// snapshots are kept on the steps but never replayed; the tournament
/// document is the one record that must survive a broken teardown.
async fn compensate(state: &AppState, op: &mut DeletionOperation) {
    op.status = OperationStatus::Compensating;
    let correlation_id = op.correlation_id.clone();
    warn!(%correlation_id, "compensating partially deleted tournament");

    let (completed, data) = {
        let step = op.step_mut(StepName::DeleteTournament);
        (
            step.status == StepStatus::Completed,
            step.compensation_data.take(),
        )
    };
    if !completed {
        return;
    }
    let Some(doc) = data.and_then(|d| d.get("tournament").cloned()) else {
        return;
    };
    let Ok(tournament) = serde_json::from_value::<Tournament>(doc) else {
        warn!(%correlation_id, "tournament snapshot did not deserialize");
        return;
    };
    let repo = TournamentRepo::new(state.store.clone());
    match repo.insert(tournament).await {
        Ok(restored) => {
            op.step_mut(StepName::DeleteTournament).status = StepStatus::Compensated;
            info!(%correlation_id, tournament_id = %restored.id, "tournament restored");
        }
        Err(err) => {
            warn!(%correlation_id, error = %err, "tournament restore failed");
        }
    }
}

async fn fail_operation(
    state: &AppState,
    op: &mut DeletionOperation,
    step: StepName,
    code: DeletionErrorCode,
    message: String,
    retryable: bool,
) -> DeletionError {
    let progressed = matches!(
        op.status,
        OperationStatus::MatchesDeleted | OperationStatus::ResultsDeleted
    );
    op.step_mut(step).status = StepStatus::Failed;
    op.status = OperationStatus::Failed;
    error!(
        correlation_id = %op.correlation_id,
        step = step.as_str(),
        code = code.as_str(),
        %message,
        "tournament deletion failed"
    );
    if progressed {
        compensate(state, op).await;
    }
    DeletionError {
        code,
        message,
        retryable,
    }
}

/// Tears a tournament down in order: matches, results, then the document
/// itself, each step counted against the totals taken at validation. Only
/// scheduled or completed tournaments qualify.
pub async fn delete_tournament(
    state: &AppState,
    raw_id: &str,
) -> std::result::Result<DeletionSummary, DeletionError> {
    let started = Instant::now();
    let mut op = DeletionOperation::new(new_correlation_id());
    info!(correlation_id = %op.correlation_id, raw_id, "tournament deletion started");

    op.step_mut(StepName::ValidateTournament).status = StepStatus::InProgress;
    let tournament_id = match Uuid::parse_str(raw_id) {
        Ok(id) => id,
        Err(_) => {
            return Err(fail_operation(
                state,
                &mut op,
                StepName::ValidateTournament,
                DeletionErrorCode::InvalidId,
                format!("Invalid tournament id: {raw_id}"),
                false,
            )
            .await);
        }
    };
    let repo = TournamentRepo::new(state.store.clone());
    let Some(tournament) = repo.find(tournament_id).await else {
        return Err(fail_operation(
            state,
            &mut op,
            StepName::ValidateTournament,
            DeletionErrorCode::NotFound,
            format!("Tournament {tournament_id} not found"),
            false,
        )
        .await);
    };
    if !matches!(
        tournament.status,
        TournamentStatus::Scheduled | TournamentStatus::Completed
    ) {
        return Err(fail_operation(
            state,
            &mut op,
            StepName::ValidateTournament,
            DeletionErrorCode::InvalidStatus,
            format!(
                "Cannot delete tournament with status '{}'. Only scheduled or completed tournaments can be deleted.",
                tournament.status.as_str()
            ),
            false,
        )
        .await);
    }

    let match_count = matches::count_by_tournament(&state.store, tournament_id).await;
    let result_count = results::count_by_tournament(&state.store, tournament_id).await;
    {
        let step = op.step_mut(StepName::ValidateTournament);
        step.expected = 1;
        step.actual = 1;
        step.status = StepStatus::Completed;
    }
    op.step_mut(StepName::DeleteMatches).expected = match_count;
    op.step_mut(StepName::DeleteResults).expected = result_count;
    op.step_mut(StepName::DeleteTournament).expected = 1;

    op.step_mut(StepName::DeleteMatches).status = StepStatus::InProgress;
    if match_count == 0 {
        op.step_mut(StepName::DeleteMatches).status = StepStatus::Completed;
    } else {
        let snapshot = matches::list_by_tournament(&state.store, tournament_id).await;
        op.step_mut(StepName::DeleteMatches).compensation_data =
            Some(json!({ "matches": snapshot }));
        let mut deleted = 0;
        while deleted < match_count {
            let batch = matches::delete_batch(
                &state.store,
                tournament_id,
                state.config.deletion_batch_size,
            )
            .await;
            if batch == 0 {
                break;
            }
            deleted += batch;
        }
        if deleted != match_count {
            warn!(
                correlation_id = %op.correlation_id,
                expected = match_count,
                deleted,
                "match deletion count mismatch"
            );
        }
        let step = op.step_mut(StepName::DeleteMatches);
        step.actual = deleted;
        step.status = StepStatus::Completed;
    }
    op.status = OperationStatus::MatchesDeleted;

    op.step_mut(StepName::DeleteResults).status = StepStatus::InProgress;
    if result_count == 0 {
        op.step_mut(StepName::DeleteResults).status = StepStatus::Completed;
    } else {
        let snapshot = results::list_by_tournament(&state.store, tournament_id).await;
        op.step_mut(StepName::DeleteResults).compensation_data =
            Some(json!({ "results": snapshot }));
        let mut deleted = 0;
        while deleted < result_count {
            let batch = results::delete_batch(
                &state.store,
                tournament_id,
                state.config.deletion_batch_size,
            )
            .await;
            if batch == 0 {
                break;
            }
            deleted += batch;
        }
        if deleted != result_count {
            warn!(
                correlation_id = %op.correlation_id,
                expected = result_count,
                deleted,
                "result deletion count mismatch"
            );
        }
        let step = op.step_mut(StepName::DeleteResults);
        step.actual = deleted;
        step.status = StepStatus::Completed;
    }
    op.status = OperationStatus::ResultsDeleted;

    op.step_mut(StepName::DeleteTournament).status = StepStatus::InProgress;
    let Some(doomed) = repo.find(tournament_id).await else {
        return Err(fail_operation(
            state,
            &mut op,
            StepName::DeleteTournament,
            DeletionErrorCode::TournamentNotFoundForDeletion,
            format!("Tournament {tournament_id} disappeared before deletion"),
            false,
        )
        .await);
    };
    op.step_mut(StepName::DeleteTournament).compensation_data =
        Some(json!({ "tournament": doomed }));
    let deleted_doc = match repo.delete(tournament_id).await {
        Ok(doc) => doc,
        Err(err) => {
            return Err(fail_operation(
                state,
                &mut op,
                StepName::DeleteTournament,
                DeletionErrorCode::TournamentDeletionFailed,
                format!("Tournament deletion failed: {err}"),
                true,
            )
            .await);
        }
    };
    {
        let step = op.step_mut(StepName::DeleteTournament);
        step.actual = 1;
        step.status = StepStatus::Completed;
    }
    op.status = OperationStatus::TournamentDeleted;

    op.status = OperationStatus::Completed;
    events::cleanup_tournament_channel(tournament_id);
    let summary = DeletionSummary {
        correlation_id: op.correlation_id.clone(),
        steps: op
            .steps
            .iter()
            .map(|s| StepSummary {
                name: s.name,
                status: s.status,
                expected: s.expected,
                actual: s.actual,
            })
            .collect(),
        duration_ms: started.elapsed().as_millis() as u64,
        tournament: DeletedTournament {
            bod_number: deleted_doc.bod_number,
            format: deleted_doc.format,
            date: deleted_doc.date,
        },
    };
    info!(
        correlation_id = %summary.correlation_id,
        tournament_id = %tournament_id,
        bod_number = summary.tournament.bod_number,
        duration_ms = summary.duration_ms,
        "tournament deletion completed"
    );
    Ok(summary)
}
