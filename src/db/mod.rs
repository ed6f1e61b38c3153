//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all survey data. Deleting a survey
//! cascades to its questions, options, responses and answers at this level;
//! the managers never issue compensating deletes themselves.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS surveys (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            slug TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // No UNIQUE(survey_id, order_index): the sequential reorder loop passes
    // through transiently colliding index assignments.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS survey_questions (
            id TEXT PRIMARY KEY,
            survey_id TEXT NOT NULL REFERENCES surveys(id) ON DELETE CASCADE,
            question_text TEXT NOT NULL,
            type TEXT NOT NULL,
            order_index INTEGER NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS survey_options (
            id TEXT PRIMARY KEY,
            question_id TEXT NOT NULL REFERENCES survey_questions(id) ON DELETE CASCADE,
            option_text TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS survey_responses (
            id TEXT PRIMARY KEY,
            survey_id TEXT NOT NULL REFERENCES surveys(id) ON DELETE CASCADE,
            submitted_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS survey_response_answers (
            id TEXT PRIMARY KEY,
            response_id TEXT NOT NULL REFERENCES survey_responses(id) ON DELETE CASCADE,
            question_id TEXT NOT NULL REFERENCES survey_questions(id) ON DELETE CASCADE,
            answer_text TEXT,
            option_id TEXT REFERENCES survey_options(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_surveys_created_at ON surveys(created_at);
        CREATE INDEX IF NOT EXISTS idx_questions_survey ON survey_questions(survey_id, order_index);
        CREATE INDEX IF NOT EXISTS idx_options_question ON survey_options(question_id);
        CREATE INDEX IF NOT EXISTS idx_responses_survey ON survey_responses(survey_id, submitted_at);
        CREATE INDEX IF NOT EXISTS idx_answers_response ON survey_response_answers(response_id);
        CREATE INDEX IF NOT EXISTS idx_answers_question ON survey_response_answers(question_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
