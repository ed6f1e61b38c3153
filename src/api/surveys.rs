//! Survey API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateSurveyRequest, Survey, UpdateSurveyRequest};
use crate::AppState;

/// Survey listing with the manager's recorded fetch error, if any. A failed
/// refresh still renders the previous (possibly stale) list.
#[derive(Debug, Serialize)]
pub struct SurveyListPayload {
    pub surveys: Vec<Survey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/surveys - List all surveys, newest first.
pub async fn list_surveys(State(state): State<AppState>) -> ApiResult<SurveyListPayload> {
    let mut manager = state.surveys.lock().await;
    manager.list_surveys().await;

    success(SurveyListPayload {
        surveys: manager.surveys().to_vec(),
        error: manager.last_error().map(str::to_string),
    })
}

/// POST /api/surveys - Create a new survey.
pub async fn create_survey(
    State(state): State<AppState>,
    Json(request): Json<CreateSurveyRequest>,
) -> ApiResult<Survey> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let mut manager = state.surveys.lock().await;
    let survey = manager.create_survey(&request).await?;
    success(survey)
}

/// GET /api/surveys/:id - Get a single survey.
pub async fn get_survey(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Survey> {
    let manager = state.surveys.lock().await;
    let survey = manager.get_survey_by_id(&id).await?;
    success(survey)
}

/// GET /api/surveys/slug/:slug - Get a single survey by its slug.
pub async fn get_survey_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Survey> {
    let manager = state.surveys.lock().await;
    let survey = manager.get_survey_by_slug(&slug).await?;
    success(survey)
}

/// PUT /api/surveys/:id - Update a survey's title and/or description.
pub async fn update_survey(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSurveyRequest>,
) -> ApiResult<Survey> {
    if request.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("Title must not be empty".to_string()));
    }

    let mut manager = state.surveys.lock().await;
    let survey = manager.update_survey(&id, &request).await?;
    success(survey)
}

/// DELETE /api/surveys/:id - Delete a survey and everything under it.
pub async fn delete_survey(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let mut manager = state.surveys.lock().await;
    manager.delete_survey(&id).await?;
    success(())
}
