//! Favorites endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::{FavoriteListResponse, FavoriteRequest};
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// POST /api/favorites/{qid}
pub async fn add(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(qid): Path<String>,
    payload: Option<Json<FavoriteRequest>>,
) -> Result<StatusCode> {
    state
        .db
        .get_question(&qid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let tag = payload.and_then(|Json(p)| p.tag);
    let inserted = state
        .db
        .add_favorite(auth.user_id, &qid, tag.as_deref())
        .await?;

    // One row per (user, question); re-favoriting is a no-op.
    Ok(if inserted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    })
}

/// DELETE /api/favorites/{qid}
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(qid): Path<String>,
) -> Result<StatusCode> {
    let removed = state.db.remove_favorite(auth.user_id, &qid).await?;
    if !removed {
        return Err(ApiError::NotFound("Favorite not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/favorites/{qid}/tag
pub async fn update_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(qid): Path<String>,
    Json(payload): Json<FavoriteRequest>,
) -> Result<StatusCode> {
    let updated = state
        .db
        .set_favorite_tag(auth.user_id, &qid, payload.tag.as_deref())
        .await?;
    if !updated {
        return Err(ApiError::NotFound("Favorite not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/favorites
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<FavoriteListResponse>> {
    let favorites = state.db.list_favorites(auth.user_id).await?;
    Ok(Json(FavoriteListResponse { favorites }))
}
