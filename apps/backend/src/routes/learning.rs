//! Statistics and learning-system endpoints.
//!
//! `/api/statistics` aggregates directly in SQL; the `/api/recommendations`,
//! `/api/progress` and `/api/trend` endpoints go through the learning
//! service and its cache.

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use learning_core::analysis::{ProgressReport, TrendPoint};
use learning_core::cache::CacheStats;
use serde::Serialize;

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::import;
use crate::AppState;

const DEFAULT_RECOMMENDATIONS: usize = 10;
const DEFAULT_WRONG_RECOMMENDATIONS: usize = 5;
const DEFAULT_TREND_DAYS: u32 = 7;
const WORST_QUESTION_LIMIT: i64 = 10;
const RECENT_EXAM_LIMIT: i64 = 5;

fn breakdown(rows: Vec<LabelCounts>) -> Vec<LabelBreakdown> {
    rows.into_iter()
        .map(|row| {
            let accuracy = if row.total > 0 {
                row.correct as f64 / row.total as f64 * 100.0
            } else {
                0.0
            };
            LabelBreakdown {
                label: row.label.unwrap_or_else(|| "未分类".to_string()),
                total: row.total,
                correct: row.correct,
                accuracy,
            }
        })
        .collect()
}

/// GET /api/statistics
pub async fn statistics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<StatisticsResponse>> {
    let (total, correct) = state.db.overall_counts(auth.user_id).await?;
    let overall_accuracy = if total > 0 {
        correct as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    let difficulty_stats = breakdown(state.db.difficulty_breakdown(auth.user_id).await?);
    let category_stats = breakdown(state.db.category_breakdown(auth.user_id).await?);
    let worst_questions = state
        .db
        .most_wrong_questions(auth.user_id, WORST_QUESTION_LIMIT)
        .await?;

    let recent_exams = state
        .db
        .recent_completed_exams(auth.user_id, RECENT_EXAM_LIMIT)
        .await?
        .into_iter()
        .map(|session| ExamSummary {
            question_count: session.question_id_list().len(),
            id: session.id,
            mode: session.mode,
            start_time: session.start_time,
            score: session.score,
        })
        .collect();

    Ok(Json(StatisticsResponse {
        overall_accuracy,
        difficulty_stats,
        category_stats,
        worst_questions,
        recent_exams,
    }))
}

/// GET /api/recommendations
pub async fn recommendations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<RecommendationsResponse>> {
    let count = query.count.unwrap_or(DEFAULT_RECOMMENDATIONS);
    let refresh = query.refresh.is_some();

    let recommendations = state
        .learning
        .recommendations(&state.db, auth.user_id, count, refresh)
        .await?;

    Ok(Json(RecommendationsResponse { recommendations }))
}

/// GET /api/recommendations/wrong
pub async fn wrong_recommendations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<RecommendationsResponse>> {
    let count = query.count.unwrap_or(DEFAULT_WRONG_RECOMMENDATIONS);

    let recommendations = state
        .learning
        .wrong_recommendations(&state.db, auth.user_id, count)
        .await?;

    Ok(Json(RecommendationsResponse { recommendations }))
}

/// GET /api/progress
pub async fn progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ProgressReport>> {
    let report = state.learning.progress(&state.db, auth.user_id).await?;
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub period_days: u32,
    pub data: Vec<TrendPoint>,
}

/// GET /api/trend
pub async fn trend(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<TrendResponse>> {
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    let data = state.learning.trend(&state.db, auth.user_id, days).await?;

    Ok(Json(TrendResponse {
        period_days: days,
        data,
    }))
}

/// GET /api/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Result<Json<CacheStats>> {
    Ok(Json(state.learning.cache_stats()))
}

/// POST /api/history/reset
pub async fn reset_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ResetHistoryResponse>> {
    let deleted = state.db.reset_history(auth.user_id).await?;
    state.db.set_sequential_cursor(auth.user_id, None).await?;
    state.learning.invalidate_user(auth.user_id);

    tracing::info!("User {} reset {} history rows", auth.user_id, deleted);

    Ok(Json(ResetHistoryResponse { deleted }))
}

/// POST /api/questions/reload
pub async fn reload_questions(State(state): State<AppState>) -> Result<Json<ReloadResponse>> {
    let path = std::env::var("QUESTIONS_CSV").unwrap_or_else(|_| "questions.csv".to_string());
    let outcome = import::import_questions_from_path(&state.db, &path).await?;

    // Reports derived from the old bank are stale now.
    state.learning.clear_cache();

    Ok(Json(ReloadResponse {
        loaded: outcome.loaded,
        errors: outcome.errors,
        encoding: outcome.encoding.to_string(),
    }))
}
