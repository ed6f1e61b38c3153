//! Response manager: submission recording and aggregate statistics.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    AnswerValue, QuestionStats, QuestionType, ResponseAnswer, ResponseWithAnswers,
    SubmitResponseRequest, SurveyResponse, SurveyStats,
};

/// Manages the `survey_responses` and `survey_response_answers` tables plus
/// a mirror of the last listed survey's responses.
pub struct ResponseManager {
    pool: SqlitePool,
    responses: Vec<ResponseWithAnswers>,
    current_response: Option<SurveyResponse>,
    last_error: Option<String>,
}

impl ResponseManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            responses: Vec::new(),
            current_response: None,
            last_error: None,
        }
    }

    /// The mirrored responses with their answers, newest first.
    pub fn responses(&self) -> &[ResponseWithAnswers] {
        &self.responses
    }

    /// The response created by the most recent successful submission.
    pub fn current_response(&self) -> Option<&SurveyResponse> {
        self.current_response.as_ref()
    }

    /// The error recorded by the last non-throwing read, if it failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Record a submission: one response row, then one answer row per
    /// supplied answer. The two inserts are sequential, not atomic; an
    /// answer-step failure leaves the bare response behind and surfaces as a
    /// partial write.
    pub async fn submit_response(
        &mut self,
        survey_id: &str,
        request: &SubmitResponseRequest,
    ) -> Result<SurveyResponse, AppError> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO survey_responses (id, survey_id, submitted_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(survey_id)
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::datastore("Could not submit response", e))?;

        if !request.answers.is_empty() {
            let placeholders = vec!["(?, ?, ?, ?, ?)"; request.answers.len()].join(", ");
            let sql = format!(
                "INSERT INTO survey_response_answers \
                 (id, response_id, question_id, answer_text, option_id) VALUES {}",
                placeholders
            );

            let mut query = sqlx::query(&sql);
            for answer in &request.answers {
                let (answer_text, option_id) = match &answer.value {
                    AnswerValue::Text(text) => (Some(text.as_str()), None),
                    AnswerValue::Choice(option_id) => (None, Some(option_id.as_str())),
                };
                query = query
                    .bind(Uuid::new_v4().to_string())
                    .bind(&id)
                    .bind(&answer.question_id)
                    .bind(answer_text)
                    .bind(option_id);
            }

            query.execute(&self.pool).await.map_err(|e| {
                AppError::partial("Response was recorded but its answers were not", e)
            })?;
        }

        let response = SurveyResponse {
            id,
            survey_id: survey_id.to_string(),
            submitted_at: now,
        };
        self.current_response = Some(response.clone());
        Ok(response)
    }

    /// Refresh the mirror with a survey's responses, newest first, each with
    /// its answers and the chosen option's text where one was chosen.
    ///
    /// Does not fail: a datastore error is recorded and the previous mirror
    /// is left untouched.
    pub async fn list_responses(&mut self, survey_id: &str) {
        self.last_error = None;

        let rows = sqlx::query(
            "SELECT r.id AS response_id, r.survey_id, r.submitted_at, \
                    a.id AS answer_id, a.question_id, a.answer_text, a.option_id, \
                    o.option_text \
             FROM survey_responses r \
             LEFT JOIN survey_response_answers a ON a.response_id = r.id \
             LEFT JOIN survey_options o ON o.id = a.option_id \
             WHERE r.survey_id = ? \
             ORDER BY r.submitted_at DESC",
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(err) => {
                tracing::error!("Error fetching responses: {}", err);
                self.last_error = Some("Could not load responses".to_string());
                return;
            }
        };

        let mut responses: Vec<ResponseWithAnswers> = Vec::new();
        for row in &rows {
            let response_id: String = row.get("response_id");
            let pos = match responses.iter().position(|r| r.response.id == response_id) {
                Some(pos) => pos,
                None => {
                    responses.push(ResponseWithAnswers {
                        response: SurveyResponse {
                            id: response_id.clone(),
                            survey_id: row.get("survey_id"),
                            submitted_at: row.get("submitted_at"),
                        },
                        answers: Vec::new(),
                    });
                    responses.len() - 1
                }
            };

            // LEFT JOIN: a response without answers yields one all-NULL
            // answer row.
            let answer_id: Option<String> = row.get("answer_id");
            if let Some(answer_id) = answer_id {
                responses[pos].answers.push(ResponseAnswer {
                    id: answer_id,
                    response_id,
                    question_id: row.get("question_id"),
                    answer_text: row.get("answer_text"),
                    option_id: row.get("option_id"),
                    option_text: row.get("option_text"),
                });
            }
        }

        self.responses = responses;
    }

    /// Count a survey's responses without materializing rows. Best-effort:
    /// a datastore failure counts as zero.
    pub async fn count_responses(&self, survey_id: &str) -> i64 {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM survey_responses WHERE survey_id = ?")
            .bind(survey_id)
            .fetch_one(&self.pool)
            .await;

        match row {
            Ok(row) => row.get("n"),
            Err(err) => {
                tracing::error!("Error counting responses: {}", err);
                0
            }
        }
    }

    /// Aggregate a survey's answers into per-question statistics.
    ///
    /// Phase one fetches the survey's question ids (none means an empty
    /// mapping, no second fetch). Phase two joins the answers with their
    /// question's text/type and, when present, the chosen option's text,
    /// then folds them keyed by question id. A multiple-choice answer
    /// contributes its option text; any other answer contributes its
    /// non-empty answer text; rows matching neither are dropped.
    ///
    /// Best-effort: any failure yields an empty mapping.
    pub async fn compute_stats(&self, survey_id: &str) -> SurveyStats {
        match self.try_compute_stats(survey_id).await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::error!("Error computing response stats: {}", err);
                SurveyStats::new()
            }
        }
    }

    async fn try_compute_stats(&self, survey_id: &str) -> Result<SurveyStats, sqlx::Error> {
        let question_rows = sqlx::query("SELECT id FROM survey_questions WHERE survey_id = ?")
            .bind(survey_id)
            .fetch_all(&self.pool)
            .await?;

        if question_rows.is_empty() {
            return Ok(SurveyStats::new());
        }

        let ids: Vec<String> = question_rows.iter().map(|row| row.get("id")).collect();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT a.question_id, a.answer_text, \
                    q.question_text, q.type, \
                    o.option_text \
             FROM survey_response_answers a \
             JOIN survey_questions q ON q.id = a.question_id \
             LEFT JOIN survey_options o ON o.id = a.option_id \
             WHERE a.question_id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for id in &ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut stats = SurveyStats::new();
        for row in &rows {
            let question_id: String = row.get("question_id");
            let type_str: String = row.get("type");
            let question_type =
                QuestionType::from_str(&type_str).unwrap_or(QuestionType::Text);

            let entry = stats.entry(question_id).or_insert_with(|| QuestionStats {
                question: row.get("question_text"),
                question_type,
                answers: Vec::new(),
            });

            let option_text: Option<String> = row.get("option_text");
            let answer_text: Option<String> = row.get("answer_text");

            if question_type == QuestionType::Multiple {
                if let Some(text) = option_text {
                    entry.answers.push(text);
                }
                // A multiple-choice answer without a joined option is dropped.
            } else if let Some(text) = answer_text.filter(|t| !t.is_empty()) {
                entry.answers.push(text);
            }
            // Anything else (e.g. an empty answer_text) contributes nothing.
        }

        Ok(stats)
    }
}
