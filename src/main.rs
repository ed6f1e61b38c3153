//! Survey Backend
//!
//! A REST backend for survey authoring and response collection, with SQLite
//! persistence.

mod api;
mod config;
mod db;
mod errors;
mod managers;
mod models;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use managers::{QuestionManager, ResponseManager, SurveyManager};

/// Application state shared across all handlers.
///
/// One manager instance per entity family for the whole store scope; each
/// sits behind its own lock because the managers mutate their in-memory
/// mirrors.
#[derive(Clone)]
pub struct AppState {
    pub surveys: Arc<Mutex<SurveyManager>>,
    pub questions: Arc<Mutex<QuestionManager>>,
    pub responses: Arc<Mutex<ResponseManager>>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Survey Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;

    // Create application state
    let state = AppState {
        surveys: Arc::new(Mutex::new(SurveyManager::new(pool.clone()))),
        questions: Arc::new(Mutex::new(QuestionManager::new(pool.clone()))),
        responses: Arc::new(Mutex::new(ResponseManager::new(pool))),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Surveys
        .route("/surveys", get(api::list_surveys))
        .route("/surveys", post(api::create_survey))
        .route("/surveys/slug/{slug}", get(api::get_survey_by_slug))
        .route("/surveys/{id}", get(api::get_survey))
        .route("/surveys/{id}", put(api::update_survey))
        .route("/surveys/{id}", delete(api::delete_survey))
        // Questions
        .route("/surveys/{id}/questions", get(api::list_questions))
        .route("/surveys/{id}/questions", post(api::create_question))
        .route("/surveys/{id}/questions/order", put(api::reorder_questions))
        .route("/questions/{id}", put(api::update_question))
        .route("/questions/{id}", delete(api::delete_question))
        .route("/questions/{id}/options", get(api::fetch_options))
        // Responses
        .route("/surveys/{id}/responses", get(api::list_responses))
        .route("/surveys/{id}/responses", post(api::submit_response))
        .route("/surveys/{id}/responses/count", get(api::count_responses))
        .route("/surveys/{id}/stats", get(api::survey_stats));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
