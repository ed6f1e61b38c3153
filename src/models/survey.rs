//! Survey model and request types.

use serde::{Deserialize, Serialize};

/// A survey: a named set of ordered questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Unique URL-safe identifier derived from the title. Immutable once set.
    pub slug: String,
    pub created_at: String,
}

/// Request body for creating a new survey.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSurveyRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Request body for updating an existing survey.
///
/// The slug is derived at creation and cannot be changed here.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSurveyRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
