//! Artifact download handler
//!
//! Result files are referenced by exact filename from a completed task's
//! results and served from the configured output directory.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// GET /artifacts/{filename}
pub async fn download_artifact(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    // Lookup is by exact filename only; no traversal out of the output dir.
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(ApiError::BadRequest(format!(
            "Invalid artifact name: {}",
            filename
        )));
    }

    let path = state.settings.output_dir.join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::NotFound(format!("Artifact not found: {}", filename)))?;

    tracing::debug!(artifact = %filename, size = bytes.len(), "Artifact download");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Build artifact routes
pub fn artifact_routes() -> Router<AppState> {
    Router::new().route("/artifacts/:filename", get(download_artifact))
}
