//! Response and answer models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::QuestionType;

/// One respondent's full submission to a survey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub id: String,
    pub survey_id: String,
    pub submitted_at: String,
}

/// One answer to one question, as read back for display.
///
/// `option_text` is join-derived from the referenced option and only present
/// for multiple-choice answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseAnswer {
    pub id: String,
    pub response_id: String,
    pub question_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_text: Option<String>,
}

/// A response together with its answers, newest responses first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseWithAnswers {
    #[serde(flatten)]
    pub response: SurveyResponse,
    pub answers: Vec<ResponseAnswer>,
}

/// The value of a submitted answer. Exactly one of free text or a chosen
/// option id, selected by the enum variant rather than by convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AnswerValue {
    /// Free text; yes/no answers are encoded as text ("yes"/"no").
    #[serde(rename = "answer_text")]
    Text(String),
    /// The id of the chosen option of a multiple-choice question.
    #[serde(rename = "option_id")]
    Choice(String),
}

/// One submitted answer within a response.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: String,
    #[serde(flatten)]
    pub value: AnswerValue,
}

/// Request body for submitting a response.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponseRequest {
    pub answers: Vec<AnswerInput>,
}

/// Aggregated answers for one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionStats {
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Answer texts in row order: option texts for multiple-choice answers,
    /// raw answer text otherwise.
    pub answers: Vec<String>,
}

/// Aggregated statistics keyed by question id.
pub type SurveyStats = HashMap<String, QuestionStats>;
