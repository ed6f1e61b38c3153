//! Question manager: CRUD over questions and their options, order-index
//! assignment and bulk reordering.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    CreateQuestionRequest, Question, QuestionOption, QuestionType, UpdateQuestionRequest,
};

/// Manages the `survey_questions` and `survey_options` tables plus mirrors
/// of the last listed survey's questions and options.
pub struct QuestionManager {
    pool: SqlitePool,
    questions: Vec<Question>,
    options: Vec<QuestionOption>,
    last_error: Option<String>,
}

impl QuestionManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            questions: Vec::new(),
            options: Vec::new(),
            last_error: None,
        }
    }

    /// The mirrored questions, in display order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The mirrored options of all mirrored questions.
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    /// The error recorded by the last non-throwing read, if it failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Refresh the mirrors with a survey's questions (by ascending
    /// order_index) and all of their options. A survey without questions
    /// short-circuits the option fetch and clears the option mirror.
    ///
    /// Does not fail: a datastore error is recorded and the previous mirrors
    /// are left untouched.
    pub async fn list_questions(&mut self, survey_id: &str) {
        self.last_error = None;

        let rows = sqlx::query(
            "SELECT id, survey_id, question_text, type, order_index FROM survey_questions \
             WHERE survey_id = ? ORDER BY order_index ASC",
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await;

        let questions: Vec<Question> = match rows {
            Ok(rows) => rows.iter().map(question_from_row).collect(),
            Err(err) => {
                tracing::error!("Error fetching questions: {}", err);
                self.last_error = Some("Could not load questions".to_string());
                return;
            }
        };

        if questions.is_empty() {
            self.questions = questions;
            self.options.clear();
            return;
        }

        let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        match self.fetch_options_for(&ids).await {
            Ok(options) => {
                self.questions = questions;
                self.options = options;
            }
            Err(err) => {
                tracing::error!("Error fetching options: {}", err);
                self.last_error = Some("Could not load question options".to_string());
            }
        }
    }

    /// Create a question at the end of the survey's display order.
    ///
    /// The next order_index is read from the current maximum (absence means
    /// 0). For a multiple-choice spec with options, the option rows are
    /// inserted in a second step after the question insert; a failure there
    /// leaves the question behind without options and surfaces as a partial
    /// write.
    pub async fn create_question(
        &mut self,
        survey_id: &str,
        request: &CreateQuestionRequest,
    ) -> Result<Question, AppError> {
        let last = sqlx::query(
            "SELECT order_index FROM survey_questions WHERE survey_id = ? \
             ORDER BY order_index DESC LIMIT 1",
        )
        .bind(survey_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::datastore("Could not create question", e))?;

        let order_index: i64 = last.map(|row| row.get::<i64, _>("order_index") + 1).unwrap_or(0);

        let id = Uuid::new_v4().to_string();
        let question_type = request.spec.question_type();

        sqlx::query(
            "INSERT INTO survey_questions (id, survey_id, question_text, type, order_index) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(survey_id)
        .bind(&request.question_text)
        .bind(question_type.as_str())
        .bind(order_index)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::datastore("Could not create question", e))?;

        if let Some(texts) = request.spec.options().filter(|t| !t.is_empty()) {
            let inserted = self
                .insert_options(&id, texts)
                .await
                .map_err(|e| AppError::partial("Question created but its options were not", e))?;
            self.options.extend(inserted);
        }

        let question = Question {
            id,
            survey_id: survey_id.to_string(),
            question_text: request.question_text.clone(),
            question_type,
            order_index,
        };

        self.questions.push(question.clone());
        Ok(question)
    }

    /// Apply a partial update. An option list supplied for a
    /// multiple-choice question replaces its option set wholesale: delete
    /// all, then insert the new list (an empty list just clears). An option
    /// list on a non-multiple question is ignored.
    pub async fn update_question(
        &mut self,
        id: &str,
        request: &UpdateQuestionRequest,
    ) -> Result<Question, AppError> {
        let existing = self.get_question(id).await?;

        let question_text = request
            .question_text
            .as_ref()
            .unwrap_or(&existing.question_text);
        let question_type = request.question_type.unwrap_or(existing.question_type);

        sqlx::query("UPDATE survey_questions SET question_text = ?, type = ? WHERE id = ?")
            .bind(question_text)
            .bind(question_type.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::datastore("Could not update question", e))?;

        let replacement = (question_type == QuestionType::Multiple)
            .then_some(request.options.as_deref())
            .flatten();
        if let Some(texts) = replacement {
            sqlx::query("DELETE FROM survey_options WHERE question_id = ?")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::partial("Question updated but its old options were not removed", e)
                })?;

            let inserted = if texts.is_empty() {
                Vec::new()
            } else {
                self.insert_options(id, texts).await.map_err(|e| {
                    AppError::partial("Question options were removed but not replaced", e)
                })?
            };

            self.options.retain(|opt| opt.question_id != id);
            self.options.extend(inserted);
        }

        let question = Question {
            id: id.to_string(),
            survey_id: existing.survey_id,
            question_text: question_text.clone(),
            question_type,
            order_index: existing.order_index,
        };

        if let Some(entry) = self.questions.iter_mut().find(|q| q.id == id) {
            *entry = question.clone();
        }

        Ok(question)
    }

    /// Delete a question. Its options and answers go with it via the
    /// datastore's cascade; sibling questions keep their order_index, so
    /// indexes stay unique but need not stay contiguous.
    pub async fn delete_question(&mut self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM survey_questions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::datastore("Could not delete question", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Question {} not found", id)));
        }

        self.questions.retain(|q| q.id != id);
        self.options.retain(|opt| opt.question_id != id);
        Ok(())
    }

    /// Point read of one question's options. Leaves the mirrors untouched.
    pub async fn fetch_options(&self, question_id: &str) -> Result<Vec<QuestionOption>, AppError> {
        let rows = sqlx::query(
            "SELECT id, question_id, option_text FROM survey_options WHERE question_id = ?",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::datastore("Could not load question options", e))?;

        Ok(rows.iter().map(option_from_row).collect())
    }

    /// Assign positional order indexes following the given id order.
    ///
    /// Updates are issued one at a time, in the order supplied, so a retried
    /// later write can never race an earlier one. A mid-loop failure leaves
    /// the earlier questions renumbered and the rest untouched, surfaced as
    /// a partial write. After full success the mirror is re-sorted.
    pub async fn reorder_questions(
        &mut self,
        survey_id: &str,
        ordered_ids: &[String],
    ) -> Result<(), AppError> {
        for (index, id) in ordered_ids.iter().enumerate() {
            sqlx::query("UPDATE survey_questions SET order_index = ? WHERE id = ? AND survey_id = ?")
                .bind(index as i64)
                .bind(id)
                .bind(survey_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::partial(
                        format!("Questions were only partially reordered ({} of {})",
                            index, ordered_ids.len()),
                        e,
                    )
                })?;

            if let Some(entry) = self.questions.iter_mut().find(|q| q.id == *id) {
                entry.order_index = index as i64;
            }
        }

        self.questions.sort_by_key(|q| q.order_index);
        Ok(())
    }

    async fn get_question(&self, id: &str) -> Result<Question, AppError> {
        let row = sqlx::query(
            "SELECT id, survey_id, question_text, type, order_index FROM survey_questions \
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::datastore("Could not load question", e))?;

        row.as_ref()
            .map(question_from_row)
            .ok_or_else(|| AppError::NotFound(format!("Question {} not found", id)))
    }

    /// Bulk-insert option rows for one question, returning the created
    /// records for mirroring.
    async fn insert_options(
        &self,
        question_id: &str,
        texts: &[String],
    ) -> Result<Vec<QuestionOption>, sqlx::Error> {
        let options: Vec<QuestionOption> = texts
            .iter()
            .map(|text| QuestionOption {
                id: Uuid::new_v4().to_string(),
                question_id: question_id.to_string(),
                option_text: text.clone(),
            })
            .collect();

        let placeholders = vec!["(?, ?, ?)"; options.len()].join(", ");
        let sql = format!(
            "INSERT INTO survey_options (id, question_id, option_text) VALUES {}",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for opt in &options {
            query = query
                .bind(&opt.id)
                .bind(&opt.question_id)
                .bind(&opt.option_text);
        }
        query.execute(&self.pool).await?;

        Ok(options)
    }

    /// Fetch all options whose question_id is in the given set.
    async fn fetch_options_for(&self, ids: &[&str]) -> Result<Vec<QuestionOption>, sqlx::Error> {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, question_id, option_text FROM survey_options WHERE question_id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(*id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(option_from_row).collect())
    }
}

fn question_from_row(row: &sqlx::sqlite::SqliteRow) -> Question {
    let type_str: String = row.get("type");
    Question {
        id: row.get("id"),
        survey_id: row.get("survey_id"),
        question_text: row.get("question_text"),
        question_type: QuestionType::from_str(&type_str).unwrap_or(QuestionType::Text),
        order_index: row.get("order_index"),
    }
}

fn option_from_row(row: &sqlx::sqlite::SqliteRow) -> QuestionOption {
    QuestionOption {
        id: row.get("id"),
        question_id: row.get("question_id"),
        option_text: row.get("option_text"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::managers::SurveyManager;
    use crate::models::{CreateSurveyRequest, QuestionSpec};
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    async fn fixture() -> (QuestionManager, String, SqlitePool, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let pool = init_database(&temp.path().join("test.sqlite"))
            .await
            .expect("init db");

        let mut surveys = SurveyManager::new(pool.clone());
        let survey = surveys
            .create_survey(&CreateSurveyRequest {
                title: "Fixture Survey".to_string(),
                description: String::new(),
            })
            .await
            .expect("create survey");

        (QuestionManager::new(pool.clone()), survey.id, pool, temp)
    }

    fn text_question(text: &str) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question_text: text.to_string(),
            spec: QuestionSpec::Text,
        }
    }

    #[tokio::test]
    async fn order_indexes_follow_creation_order() {
        let (mut mgr, survey_id, _pool, _tmp) = fixture().await;

        for i in 0..4 {
            let q = mgr
                .create_question(&survey_id, &text_question(&format!("Q{}", i)))
                .await
                .unwrap();
            assert_eq!(q.order_index, i);
        }

        mgr.list_questions(&survey_id).await;
        let indexes: Vec<i64> = mgr.questions().iter().map(|q| q.order_index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn multiple_choice_creation_mirrors_options() {
        let (mut mgr, survey_id, _pool, _tmp) = fixture().await;

        let q = mgr
            .create_question(
                &survey_id,
                &CreateQuestionRequest {
                    question_text: "Pick one".to_string(),
                    spec: QuestionSpec::Multiple {
                        options: vec!["Yes".into(), "No".into(), "Maybe".into()],
                    },
                },
            )
            .await
            .unwrap();

        assert_eq!(q.order_index, 0);
        assert_eq!(q.question_type, QuestionType::Multiple);

        let mirrored: Vec<&str> = mgr
            .options()
            .iter()
            .filter(|opt| opt.question_id == q.id)
            .map(|opt| opt.option_text.as_str())
            .collect();
        assert_eq!(mirrored, vec!["Yes", "No", "Maybe"]);

        let fetched = mgr.fetch_options(&q.id).await.unwrap();
        assert_eq!(fetched.len(), 3);
    }

    #[tokio::test]
    async fn update_replaces_option_set_without_leftovers() {
        let (mut mgr, survey_id, _pool, _tmp) = fixture().await;

        let q = mgr
            .create_question(
                &survey_id,
                &CreateQuestionRequest {
                    question_text: "Pick one".to_string(),
                    spec: QuestionSpec::Multiple {
                        options: vec!["Old A".into(), "Old B".into()],
                    },
                },
            )
            .await
            .unwrap();

        mgr.update_question(
            &q.id,
            &UpdateQuestionRequest {
                question_type: Some(QuestionType::Multiple),
                options: Some(vec!["New A".into(), "New B".into(), "New C".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let texts: Vec<String> = mgr
            .fetch_options(&q.id)
            .await
            .unwrap()
            .into_iter()
            .map(|opt| opt.option_text)
            .collect();
        assert_eq!(texts, vec!["New A", "New B", "New C"]);

        let mirrored: Vec<&str> = mgr
            .options()
            .iter()
            .map(|opt| opt.option_text.as_str())
            .collect();
        assert_eq!(mirrored, vec!["New A", "New B", "New C"]);
    }

    #[tokio::test]
    async fn update_with_empty_option_list_clears_options() {
        let (mut mgr, survey_id, _pool, _tmp) = fixture().await;

        let q = mgr
            .create_question(
                &survey_id,
                &CreateQuestionRequest {
                    question_text: "Pick one".to_string(),
                    spec: QuestionSpec::Multiple {
                        options: vec!["A".into()],
                    },
                },
            )
            .await
            .unwrap();

        mgr.update_question(
            &q.id,
            &UpdateQuestionRequest {
                question_type: Some(QuestionType::Multiple),
                options: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(mgr.fetch_options(&q.id).await.unwrap().is_empty());
        assert!(mgr.options().is_empty());
    }

    #[tokio::test]
    async fn scalar_update_leaves_options_alone() {
        let (mut mgr, survey_id, _pool, _tmp) = fixture().await;

        let q = mgr
            .create_question(
                &survey_id,
                &CreateQuestionRequest {
                    question_text: "Pick one".to_string(),
                    spec: QuestionSpec::Multiple {
                        options: vec!["A".into(), "B".into()],
                    },
                },
            )
            .await
            .unwrap();

        let updated = mgr
            .update_question(
                &q.id,
                &UpdateQuestionRequest {
                    question_text: Some("Pick exactly one".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.question_text, "Pick exactly one");
        assert_eq!(updated.question_type, QuestionType::Multiple);
        assert_eq!(mgr.fetch_options(&q.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_keeps_sibling_indexes() {
        let (mut mgr, survey_id, _pool, _tmp) = fixture().await;

        let q0 = mgr
            .create_question(&survey_id, &text_question("Q0"))
            .await
            .unwrap();
        let _q1 = mgr
            .create_question(&survey_id, &text_question("Q1"))
            .await
            .unwrap();
        let _q2 = mgr
            .create_question(&survey_id, &text_question("Q2"))
            .await
            .unwrap();

        mgr.delete_question(&q0.id).await.unwrap();

        mgr.list_questions(&survey_id).await;
        let indexes: Vec<i64> = mgr.questions().iter().map(|q| q.order_index).collect();
        // No renumbering: unique but no longer contiguous.
        assert_eq!(indexes, vec![1, 2]);

        // The next creation still lands after the remaining maximum.
        let q3 = mgr
            .create_question(&survey_id, &text_question("Q3"))
            .await
            .unwrap();
        assert_eq!(q3.order_index, 3);
    }

    #[tokio::test]
    async fn reorder_assigns_positional_indexes_and_is_idempotent() {
        let (mut mgr, survey_id, _pool, _tmp) = fixture().await;

        let mut ids = Vec::new();
        for i in 0..3 {
            let q = mgr
                .create_question(&survey_id, &text_question(&format!("Q{}", i)))
                .await
                .unwrap();
            ids.push(q.id);
        }

        let new_order = vec![ids[2].clone(), ids[0].clone(), ids[1].clone()];
        mgr.reorder_questions(&survey_id, &new_order).await.unwrap();

        let order_after = |mgr: &QuestionManager| -> Vec<(String, i64)> {
            mgr.questions()
                .iter()
                .map(|q| (q.id.clone(), q.order_index))
                .collect()
        };

        let first_pass = order_after(&mgr);
        assert_eq!(
            first_pass,
            vec![
                (ids[2].clone(), 0),
                (ids[0].clone(), 1),
                (ids[1].clone(), 2)
            ]
        );

        // Second pass with the same list yields the same assignment.
        mgr.reorder_questions(&survey_id, &new_order).await.unwrap();
        assert_eq!(order_after(&mgr), first_pass);

        // The persisted order agrees with the mirror.
        mgr.list_questions(&survey_id).await;
        assert_eq!(order_after(&mgr), first_pass);
    }

    #[tokio::test]
    async fn list_for_empty_survey_clears_mirrors() {
        let (mut mgr, survey_id, _pool, _tmp) = fixture().await;

        let q = mgr
            .create_question(
                &survey_id,
                &CreateQuestionRequest {
                    question_text: "Pick".to_string(),
                    spec: QuestionSpec::Multiple {
                        options: vec!["A".into()],
                    },
                },
            )
            .await
            .unwrap();
        mgr.delete_question(&q.id).await.unwrap();

        mgr.list_questions(&survey_id).await;
        assert!(mgr.last_error().is_none());
        assert!(mgr.questions().is_empty());
        assert!(mgr.options().is_empty());
    }
}
