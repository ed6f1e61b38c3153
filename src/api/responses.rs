//! Response API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{ResponseWithAnswers, SubmitResponseRequest, SurveyResponse, SurveyStats};
use crate::AppState;

/// Response listing with the manager's recorded fetch error, if any.
#[derive(Debug, Serialize)]
pub struct ResponseListPayload {
    pub responses: Vec<ResponseWithAnswers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/surveys/:id/responses - Submit a response with its answers.
pub async fn submit_response(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
    Json(request): Json<SubmitResponseRequest>,
) -> ApiResult<SurveyResponse> {
    if request.answers.is_empty() {
        return Err(AppError::Validation(
            "At least one answer is required".to_string(),
        ));
    }

    let mut manager = state.responses.lock().await;
    let response = manager.submit_response(&survey_id, &request).await?;
    success(response)
}

/// GET /api/surveys/:id/responses - List a survey's responses, newest first.
pub async fn list_responses(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
) -> ApiResult<ResponseListPayload> {
    let mut manager = state.responses.lock().await;
    manager.list_responses(&survey_id).await;

    success(ResponseListPayload {
        responses: manager.responses().to_vec(),
        error: manager.last_error().map(str::to_string),
    })
}

/// Count payload for a survey's responses.
#[derive(Debug, Serialize)]
pub struct ResponseCountPayload {
    pub count: i64,
}

/// GET /api/surveys/:id/responses/count - Count a survey's responses.
pub async fn count_responses(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
) -> ApiResult<ResponseCountPayload> {
    let manager = state.responses.lock().await;
    let count = manager.count_responses(&survey_id).await;
    success(ResponseCountPayload { count })
}

/// GET /api/surveys/:id/stats - Aggregate a survey's answers per question.
pub async fn survey_stats(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
) -> ApiResult<SurveyStats> {
    let manager = state.responses.lock().await;
    let stats = manager.compute_stats(&survey_id).await;
    success(stats)
}
