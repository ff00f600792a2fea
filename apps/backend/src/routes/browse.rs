//! Browsing: paged question listing, label lists, category/difficulty filter.

use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

const PER_PAGE: u32 = 20;

/// GET /api/questions
pub async fn browse(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<BrowseResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let qtype = query
        .qtype
        .as_deref()
        .filter(|t| !t.is_empty() && *t != "all");
    let search = query.search.as_deref().filter(|s| !s.is_empty());

    let total = state.db.count_browse_questions(qtype, search).await?;
    let offset = i64::from(page - 1) * i64::from(PER_PAGE);
    let rows = state
        .db
        .browse_questions(qtype, search, i64::from(PER_PAGE), offset)
        .await?;

    let favorites: HashSet<String> =
        state.db.favorite_ids(auth.user_id).await?.into_iter().collect();

    let questions = rows
        .into_iter()
        .map(|row| {
            let is_favorite = favorites.contains(&row.id);
            let core = row.to_core();
            BrowseQuestion {
                id: core.id,
                stem: core.stem,
                answer: core.answer,
                difficulty: core.difficulty,
                qtype: core.qtype,
                category: core.category,
                options: core.options,
                is_favorite,
            }
        })
        .collect();

    let total_pages = ((total as u32) + PER_PAGE - 1) / PER_PAGE;
    let available_types = state.db.distinct_types().await?;

    Ok(Json(BrowseResponse {
        questions,
        total,
        page,
        per_page: PER_PAGE,
        total_pages,
        has_prev: page > 1,
        has_next: page < total_pages,
        available_types,
    }))
}

/// GET /api/questions/labels
pub async fn labels(State(state): State<AppState>) -> Result<Json<LabelsResponse>> {
    Ok(Json(LabelsResponse {
        categories: state.db.distinct_categories().await?,
        difficulties: state.db.distinct_difficulties().await?,
        types: state.db.distinct_types().await?,
    }))
}

/// GET /api/questions/filter
pub async fn filter(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<FilterResponse>> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let difficulty = query.difficulty.as_deref().filter(|d| !d.is_empty());

    let questions = state.db.filter_questions(category, difficulty).await?;
    Ok(Json(FilterResponse { questions }))
}
