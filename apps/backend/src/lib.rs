pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::Database;
use crate::services::learning::LearningService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub learning: Arc<LearningService>,
}

/// Build the full router over the given state
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Account routes
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/profile", get(routes::auth::profile))
        // Quiz routes
        .route("/api/quiz/random", get(routes::quiz::random_question))
        .route("/api/quiz/sequential", get(routes::quiz::sequential_question))
        .route(
            "/api/quiz/sequential/{qid}/answer",
            post(routes::quiz::sequential_answer),
        )
        .route("/api/quiz/wrong", get(routes::quiz::wrong_questions))
        .route("/api/quiz/wrong/practice", get(routes::quiz::wrong_practice))
        // Question routes
        .route("/api/questions", get(routes::browse::browse))
        .route("/api/questions/labels", get(routes::browse::labels))
        .route("/api/questions/filter", get(routes::browse::filter))
        .route("/api/questions/reload", post(routes::learning::reload_questions))
        .route("/api/questions/{qid}", get(routes::quiz::question_detail))
        .route("/api/questions/{qid}/answer", post(routes::quiz::submit_answer))
        // Exam routes
        .route("/api/exams", post(routes::exams::start))
        .route("/api/exams/current", get(routes::exams::current))
        .route("/api/exams/current/submit", post(routes::exams::submit))
        // Favorites routes
        .route("/api/favorites", get(routes::favorites::list))
        .route("/api/favorites/{qid}", post(routes::favorites::add))
        .route("/api/favorites/{qid}", delete(routes::favorites::remove))
        .route("/api/favorites/{qid}/tag", put(routes::favorites::update_tag))
        // Statistics & learning routes
        .route("/api/statistics", get(routes::learning::statistics))
        .route("/api/recommendations", get(routes::learning::recommendations))
        .route(
            "/api/recommendations/wrong",
            get(routes::learning::wrong_recommendations),
        )
        .route("/api/progress", get(routes::learning::progress))
        .route("/api/trend", get(routes::learning::trend))
        .route("/api/cache/stats", get(routes::learning::cache_stats))
        .route("/api/history/reset", post(routes::learning::reset_history))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Connect to database
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://exam_master.db?mode=rwc".to_string());

    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    // Seed the question bank on first start
    if db.count_questions().await? == 0 {
        let path = std::env::var("QUESTIONS_CSV").unwrap_or_else(|_| "questions.csv".to_string());
        match services::import::import_questions_from_path(&db, &path).await {
            Ok(outcome) => tracing::info!(
                "Loaded {} questions from {} ({})",
                outcome.loaded,
                path,
                outcome.encoding
            ),
            Err(e) => tracing::warn!("Question bank not loaded: {}", e),
        }
    }

    let state = AppState {
        db: Arc::new(db),
        learning: Arc::new(LearningService::new()),
    };

    let app = build_router(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
