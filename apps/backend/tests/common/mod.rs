//! Common test utilities and fixtures for integration tests.
//!
//! Tests run against an in-memory SQLite database, so no external services
//! are required. Each [`TestContext`] gets its own fresh database.

pub mod fixtures;

use std::sync::Arc;

use axum::Router;

use exam_master_backend::db::Database;
use exam_master_backend::services::learning::LearningService;
use exam_master_backend::{build_router, AppState};
use learning_core::types::Question;

/// Test context with a fresh in-memory database and the full router.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context with migrations applied.
    pub async fn new() -> Self {
        let db = Database::connect_in_memory()
            .await
            .expect("Failed to open in-memory database");

        db.run_migrations().await.expect("Failed to run migrations");

        let db = Arc::new(db);
        let state = AppState {
            db: db.clone(),
            learning: Arc::new(LearningService::new()),
        };
        let app = build_router(state);

        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Insert one question directly.
    pub async fn seed_question(&self, question: &Question) {
        self.db
            .upsert_question(question)
            .await
            .expect("Failed to seed question");
    }

    /// Insert `count` single-choice questions with ids "1".."count", all
    /// with canonical answer "A".
    pub async fn seed_bank(&self, count: usize) {
        for i in 1..=count {
            self.seed_question(&fixtures::question(&i.to_string(), "A"))
                .await;
        }
    }
}
