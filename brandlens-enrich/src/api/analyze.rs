//! Analysis task API handlers
//!
//! POST /analyze/start, GET /analyze/status/{task_id},
//! POST /analyze/cancel/{task_id}

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{Task, TaskStatus},
    parser::InputFormat,
    pipeline::PipelineRunner,
    AppState,
};

/// POST /analyze/start request
#[derive(Debug, Deserialize)]
pub struct StartAnalysisRequest {
    /// Path of an already-stored input file
    pub file_path: String,
    /// "csv" or "json"; inferred from the extension when omitted
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_workers: Option<usize>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub max_records: Option<usize>,
}

/// POST /analyze/start response
#[derive(Debug, Serialize)]
pub struct StartAnalysisResponse {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

/// POST /analyze/cancel response
#[derive(Debug, Serialize)]
pub struct CancelAnalysisResponse {
    pub task_id: Uuid,
    pub cancelled_at: DateTime<Utc>,
}

/// POST /analyze/start
///
/// Accepts the job and returns immediately; the pipeline runs as a background
/// task and is observed through the status endpoint.
pub async fn start_analysis(
    State(state): State<AppState>,
    Json(request): Json<StartAnalysisRequest>,
) -> ApiResult<Json<StartAnalysisResponse>> {
    let input_path = PathBuf::from(&request.file_path);

    let format = match &request.format {
        Some(format) => format
            .parse::<InputFormat>()
            .map_err(ApiError::BadRequest)?,
        None => InputFormat::from_path(&input_path).ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Cannot infer input format from: {}",
                request.file_path
            ))
        })?,
    };

    let filename = input_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| request.file_path.clone());

    let task = state.store.create(&filename).await;

    let mut settings = state.settings.clone();
    if let Some(max_workers) = request.max_workers {
        settings.max_workers = max_workers.max(1);
    }
    if let Some(batch_size) = request.batch_size {
        settings.batch_size = batch_size.max(1);
    }
    if let Some(max_records) = request.max_records {
        settings.max_records = Some(max_records);
    }

    let cancel = CancellationToken::new();
    state
        .cancel_tokens
        .write()
        .await
        .insert(task.task_id, cancel.clone());

    let runner = PipelineRunner::new(
        state.store.clone(),
        Arc::clone(&state.provider),
        Arc::clone(&state.classifier),
        settings,
    );

    let task_id = task.task_id;
    tracing::info!(
        task_id = %task_id,
        file = %input_path.display(),
        format = format.as_str(),
        "Analysis task accepted"
    );

    let cancel_tokens = Arc::clone(&state.cancel_tokens);
    tokio::spawn(async move {
        runner.run(task_id, &input_path, format, cancel).await;
        cancel_tokens.write().await.remove(&task_id);
    });

    Ok(Json(StartAnalysisResponse {
        task_id,
        status: task.status,
        created_at: task.created_at,
    }))
}

/// GET /analyze/status/{task_id}
///
/// Committed task snapshot: status, progress, ordered logs, and the terminal
/// results or error once present.
pub async fn get_analysis_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state
        .store
        .snapshot(task_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;

    tracing::debug!(task_id = %task_id, status = ?task.status, "Status query");
    Ok(Json(task))
}

/// POST /analyze/cancel/{task_id}
pub async fn cancel_analysis(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<CancelAnalysisResponse>> {
    let task = state
        .store
        .snapshot(task_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;

    if task.is_terminal() {
        return Err(ApiError::BadRequest(format!(
            "Task already in terminal state: {:?}",
            task.status
        )));
    }

    if let Some(token) = state.cancel_tokens.read().await.get(&task_id) {
        token.cancel();
    }

    tracing::info!(task_id = %task_id, "Analysis task cancelled");

    Ok(Json(CancelAnalysisResponse {
        task_id,
        cancelled_at: Utc::now(),
    }))
}

/// Build analysis task routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze/start", post(start_analysis))
        .route("/analyze/status/:task_id", get(get_analysis_status))
        .route("/analyze/cancel/:task_id", post(cancel_analysis))
}
