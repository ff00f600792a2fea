//! Exam and timed-mode endpoints.
//!
//! A user has at most one session in flight: the latest uncompleted
//! `exam_sessions` row. Timed sessions carry a wall-clock deadline checked
//! at read and submit time.

use axum::{extract::State, Extension, Json};
use chrono::{Duration, Utc};

use learning_core::grading;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

const DEFAULT_TIMED_QUESTIONS: u32 = 5;
const DEFAULT_TIMED_MINUTES: u32 = 10;
const DEFAULT_EXAM_QUESTIONS: u32 = 10;

/// POST /api/exams
pub async fn start(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<StartExamRequest>,
) -> Result<Json<StartExamResponse>> {
    let (question_count, duration_secs) = match payload.mode {
        ExamMode::Timed => {
            let minutes = payload.duration_minutes.unwrap_or(DEFAULT_TIMED_MINUTES);
            (
                payload.question_count.unwrap_or(DEFAULT_TIMED_QUESTIONS),
                i64::from(minutes) * 60,
            )
        }
        // 0 means no time limit.
        ExamMode::Exam => (payload.question_count.unwrap_or(DEFAULT_EXAM_QUESTIONS), 0),
    };

    if question_count == 0 {
        return Err(ApiError::BadRequest(
            "question_count must be positive".to_string(),
        ));
    }

    let question_ids = state
        .db
        .random_question_ids(i64::from(question_count))
        .await?;
    if question_ids.is_empty() {
        return Err(ApiError::BadRequest("Question bank is empty".to_string()));
    }

    let exam_id = state
        .db
        .create_exam_session(
            auth.user_id,
            payload.mode.as_str(),
            &question_ids,
            Utc::now(),
            duration_secs,
        )
        .await?;

    tracing::info!(
        "User {} started {} session {} with {} questions",
        auth.user_id,
        payload.mode.as_str(),
        exam_id,
        question_ids.len()
    );

    Ok(Json(StartExamResponse {
        exam_id,
        mode: payload.mode,
        question_count: question_ids.len(),
        duration_secs,
    }))
}

/// GET /api/exams/current
pub async fn current(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<CurrentExamResponse>> {
    let session = state
        .db
        .current_exam_session(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No exam in progress".to_string()))?;

    let mut questions = Vec::new();
    for qid in session.question_id_list() {
        if let Some(question) = state.db.get_question(&qid).await? {
            questions.push(question.to_view());
        }
    }

    let (remaining_secs, expired) = if session.duration > 0 {
        let deadline = session.start_time + Duration::seconds(session.duration);
        let remaining = (deadline - Utc::now()).num_seconds();
        (Some(remaining.max(0)), remaining <= 0)
    } else {
        (None, false)
    };

    Ok(Json(CurrentExamResponse {
        exam_id: session.id,
        mode: session.mode,
        questions,
        remaining_secs,
        expired,
    }))
}

/// POST /api/exams/current/submit
pub async fn submit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<Json<SubmitExamResponse>> {
    let session = state
        .db
        .current_exam_session(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No exam in progress".to_string()))?;

    let question_ids = session.question_id_list();
    let total = question_ids.len();
    let mut correct_count = 0;
    let mut results = Vec::with_capacity(total);

    for qid in &question_ids {
        let Some(question) = state.db.get_question(qid).await? else {
            continue;
        };

        let submitted = payload
            .answers
            .get(qid)
            .map(|choices| grading::join_choices(choices))
            .unwrap_or_default();
        let is_correct = grading::is_correct(&submitted, &question.answer);
        if is_correct {
            correct_count += 1;
        }

        state
            .db
            .insert_attempt(auth.user_id, qid, &submitted, is_correct, Utc::now())
            .await?;

        results.push(QuestionResult {
            id: question.id,
            stem: question.stem,
            user_answer: submitted,
            correct_answer: question.answer,
            is_correct,
        });
    }

    let score = if total > 0 {
        correct_count as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    state.db.complete_exam_session(session.id, score).await?;

    Ok(Json(SubmitExamResponse {
        correct_count,
        total,
        score,
        results,
    }))
}
