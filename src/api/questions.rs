//! Question API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    CreateQuestionRequest, Question, QuestionOption, ReorderQuestionsRequest,
    UpdateQuestionRequest,
};
use crate::AppState;

/// Question listing with the options of every listed question and the
/// manager's recorded fetch error, if any.
#[derive(Debug, Serialize)]
pub struct QuestionListPayload {
    pub questions: Vec<Question>,
    pub options: Vec<QuestionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/surveys/:id/questions - List a survey's questions in display order.
pub async fn list_questions(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
) -> ApiResult<QuestionListPayload> {
    let mut manager = state.questions.lock().await;
    manager.list_questions(&survey_id).await;

    success(QuestionListPayload {
        questions: manager.questions().to_vec(),
        options: manager.options().to_vec(),
        error: manager.last_error().map(str::to_string),
    })
}

/// POST /api/surveys/:id/questions - Append a question to a survey.
pub async fn create_question(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
    Json(request): Json<CreateQuestionRequest>,
) -> ApiResult<Question> {
    if request.question_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Question text is required".to_string(),
        ));
    }

    let mut manager = state.questions.lock().await;
    let question = manager.create_question(&survey_id, &request).await?;
    success(question)
}

/// PUT /api/questions/:id - Update a question (and replace its options when
/// a multiple-choice option list is supplied).
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateQuestionRequest>,
) -> ApiResult<Question> {
    let mut manager = state.questions.lock().await;
    let question = manager.update_question(&id, &request).await?;
    success(question)
}

/// DELETE /api/questions/:id - Delete a question.
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let mut manager = state.questions.lock().await;
    manager.delete_question(&id).await?;
    success(())
}

/// GET /api/questions/:id/options - Fetch one question's options.
pub async fn fetch_options(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<QuestionOption>> {
    let manager = state.questions.lock().await;
    let options = manager.fetch_options(&id).await?;
    success(options)
}

/// PUT /api/surveys/:id/questions/order - Reorder a survey's questions.
pub async fn reorder_questions(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
    Json(request): Json<ReorderQuestionsRequest>,
) -> ApiResult<()> {
    if request.question_ids.is_empty() {
        return Err(AppError::Validation(
            "At least one question id is required".to_string(),
        ));
    }

    let mut manager = state.questions.lock().await;
    manager
        .reorder_questions(&survey_id, &request.question_ids)
        .await?;
    success(())
}
