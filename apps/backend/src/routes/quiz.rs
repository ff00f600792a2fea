//! Quiz endpoints: random practice, question detail, answering, sequential
//! mode and wrong-question review.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;

use learning_core::grading;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

async fn progress_counts(state: &AppState, user_id: i64) -> Result<(i64, i64)> {
    let total = state.db.count_questions().await?;
    let answered = state.db.answered_count(user_id).await?;
    Ok((answered, total))
}

/// GET /api/quiz/random
pub async fn random_question(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<RandomQuestionResponse>> {
    let (answered, total) = progress_counts(&state, auth.user_id).await?;

    let Some(qid) = state.db.random_unanswered_id(auth.user_id).await? else {
        // Every question answered; the client offers a history reset.
        return Ok(Json(RandomQuestionResponse {
            question: None,
            is_favorite: false,
            answered,
            total,
        }));
    };

    let question = state
        .db
        .get_question(&qid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
    let is_favorite = state.db.is_favorite(auth.user_id, &qid).await?;

    Ok(Json(RandomQuestionResponse {
        question: Some(question.to_view()),
        is_favorite,
        answered,
        total,
    }))
}

/// GET /api/questions/{qid}
pub async fn question_detail(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(qid): Path<String>,
) -> Result<Json<QuestionDetailResponse>> {
    let question = state
        .db
        .get_question(&qid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    // Viewing a question moves the sequential cursor so "continue" resumes
    // from the last browsed position.
    state
        .db
        .set_sequential_cursor(auth.user_id, Some(&qid))
        .await?;

    let (answered, total) = progress_counts(&state, auth.user_id).await?;
    let is_favorite = state.db.is_favorite(auth.user_id, &qid).await?;

    Ok(Json(QuestionDetailResponse {
        question: question.to_view(),
        is_favorite,
        answered,
        total,
    }))
}

/// POST /api/questions/{qid}/answer
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(qid): Path<String>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>> {
    let question = state
        .db
        .get_question(&qid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let submitted = grading::join_choices(&payload.answers);
    let correct = grading::is_correct(&submitted, &question.answer);

    state
        .db
        .insert_attempt(auth.user_id, &qid, &submitted, correct, Utc::now())
        .await?;

    let (answered, total) = progress_counts(&state, auth.user_id).await?;

    Ok(Json(SubmitAnswerResponse {
        correct,
        submitted,
        correct_answer: question.answer,
        answered,
        total,
    }))
}

/// GET /api/quiz/sequential
///
/// Resumes from the saved cursor, or the first unanswered question. When the
/// whole bank has been answered the cursor wraps to the first question.
pub async fn sequential_question(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SequentialQuestionResponse>> {
    let user = state
        .db
        .get_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut wrapped = false;
    let mut resumed = None;
    if let Some(cursor) = user.current_seq_qid {
        if state.db.get_question(&cursor).await?.is_some() {
            resumed = Some(cursor);
        }
    }
    let qid = match resumed {
        Some(qid) => qid,
        None => match state.db.first_unanswered_id(auth.user_id).await? {
            Some(qid) => qid,
            None => {
                wrapped = true;
                state
                    .db
                    .first_question_id()
                    .await?
                    .ok_or_else(|| ApiError::NotFound("Question bank is empty".to_string()))?
            }
        },
    };

    state
        .db
        .set_sequential_cursor(auth.user_id, Some(&qid))
        .await?;

    let question = state
        .db
        .get_question(&qid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
    let (answered, total) = progress_counts(&state, auth.user_id).await?;
    let is_favorite = state.db.is_favorite(auth.user_id, &qid).await?;

    Ok(Json(SequentialQuestionResponse {
        question: question.to_view(),
        wrapped,
        is_favorite,
        answered,
        total,
    }))
}

/// POST /api/quiz/sequential/{qid}/answer
///
/// Grades the answer, then advances the cursor to the next unanswered
/// question by ascending numeric id, wrapping to the start once the bank is
/// exhausted.
pub async fn sequential_answer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(qid): Path<String>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<SequentialAnswerResponse>> {
    let question = state
        .db
        .get_question(&qid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let submitted = grading::join_choices(&payload.answers);
    let correct = grading::is_correct(&submitted, &question.answer);

    state
        .db
        .insert_attempt(auth.user_id, &qid, &submitted, correct, Utc::now())
        .await?;

    let current_num = qid.parse::<i64>().unwrap_or(0);
    let mut wrapped = false;
    let next_qid = match state.db.next_unanswered_after(auth.user_id, current_num).await? {
        Some(next) => Some(next),
        None => match state.db.first_unanswered_id(auth.user_id).await? {
            Some(next) => Some(next),
            None => {
                wrapped = true;
                state.db.first_question_id().await?
            }
        },
    };

    state
        .db
        .set_sequential_cursor(auth.user_id, next_qid.as_deref())
        .await?;

    let (answered, total) = progress_counts(&state, auth.user_id).await?;

    Ok(Json(SequentialAnswerResponse {
        correct,
        submitted,
        correct_answer: question.answer,
        next_qid,
        wrapped,
        answered,
        total,
    }))
}

/// GET /api/quiz/wrong
pub async fn wrong_questions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<WrongListResponse>> {
    let mut questions = Vec::new();
    for qid in state.db.wrong_question_ids(auth.user_id).await? {
        if let Some(question) = state.db.get_question(&qid).await? {
            questions.push(question.to_view());
        }
    }

    Ok(Json(WrongListResponse { questions }))
}

/// GET /api/quiz/wrong/practice
pub async fn wrong_practice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<RandomQuestionResponse>> {
    let (answered, total) = progress_counts(&state, auth.user_id).await?;

    let Some(qid) = state.db.random_wrong_id(auth.user_id).await? else {
        return Err(ApiError::NotFound(
            "No wrong questions to practice".to_string(),
        ));
    };

    let question = state
        .db
        .get_question(&qid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
    let is_favorite = state.db.is_favorite(auth.user_id, &qid).await?;

    Ok(Json(RandomQuestionResponse {
        question: Some(question.to_view()),
        is_favorite,
        answered,
        total,
    }))
}
