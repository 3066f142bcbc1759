//! Edit job handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{info, warn};

use reelcut_models::{transcript_from_analysis, EditRequest, RenditionJobResponse};
use reelcut_render::RenderError;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Run the rendition matrix for an edit request.
///
/// Returns once every variant has been attempted.
pub async fn create_edit(
    State(state): State<AppState>,
    payload: Result<Json<EditRequest>, JsonRejection>,
) -> ApiResult<Json<RenditionJobResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request.validate()?;

    let record = state
        .store
        .get(&request.video_id)
        .await
        .ok_or_else(|| RenderError::VideoNotFound(request.video_id.to_string()))?;

    info!(
        video_id = %request.video_id,
        template_id = request.template_id.as_deref().unwrap_or("-"),
        selections = request.selections.len(),
        "Edit request received"
    );

    let source = state.locator.locate(&record).await?;
    let transcript = record
        .analysis
        .as_ref()
        .map(transcript_from_analysis)
        .unwrap_or_default();

    match state.driver.run(&request, &source, &transcript).await {
        Ok(outcome) => {
            metrics::record_edit_request("success");
            Ok(Json(outcome.into_response()))
        }
        Err(e) => {
            warn!(video_id = %request.video_id, "Edit job failed: {}", e);
            metrics::record_edit_request("failed");
            Err(e.into())
        }
    }
}
