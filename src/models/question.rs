//! Question and option models.

use serde::{Deserialize, Serialize};

/// The closed set of question types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    YesNo,
    Text,
    Multiple,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::YesNo => "yes_no",
            QuestionType::Text => "text",
            QuestionType::Multiple => "multiple",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "yes_no" => Some(QuestionType::YesNo),
            "text" => Some(QuestionType::Text),
            "multiple" => Some(QuestionType::Multiple),
            _ => None,
        }
    }
}

/// One prompt within a survey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub survey_id: String,
    pub question_text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Zero-based display position. Unique within a survey but not
    /// necessarily contiguous after deletions.
    pub order_index: i64,
}

/// One selectable choice belonging to a multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub question_id: String,
    pub option_text: String,
}

/// Typed question shape: only `Multiple` carries an option list, so
/// "options belong to multiple-choice questions" holds structurally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionSpec {
    YesNo,
    Text,
    Multiple {
        #[serde(default)]
        options: Vec<String>,
    },
}

impl QuestionSpec {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionSpec::YesNo => QuestionType::YesNo,
            QuestionSpec::Text => QuestionType::Text,
            QuestionSpec::Multiple { .. } => QuestionType::Multiple,
        }
    }

    /// The supplied option texts, when this is a multiple-choice spec.
    pub fn options(&self) -> Option<&[String]> {
        match self {
            QuestionSpec::Multiple { options } => Some(options),
            _ => None,
        }
    }
}

/// Request body for creating a new question.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionRequest {
    pub question_text: String,
    #[serde(flatten)]
    pub spec: QuestionSpec,
}

/// Request body for updating an existing question.
///
/// All fields are partial. `options` is honored only when the question's
/// (possibly updated) type is `multiple`, and then fully replaces the
/// existing option set; leaving it absent keeps the current options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuestionRequest {
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(rename = "type", default)]
    pub question_type: Option<QuestionType>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// Request body for reordering a survey's questions.
#[derive(Debug, Clone, Deserialize)]
pub struct ReorderQuestionsRequest {
    /// Question ids in their new display order.
    pub question_ids: Vec<String>,
}
