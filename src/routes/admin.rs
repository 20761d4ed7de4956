use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::admin_dto::{AdminProfile, AdminUserProgress, LeaderboardRow, LimitQuery};
use crate::AppState;

const DEFAULT_LIMIT: usize = 50;

#[axum::debug_handler]
pub async fn me(Extension(admin): Extension<AdminProfile>) -> Json<AdminProfile> {
    Json(admin)
}

#[axum::debug_handler]
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> crate::error::Result<Json<Vec<LeaderboardRow>>> {
    query.validate()?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Ok(Json(state.ranking_service.leaderboard(limit).await?))
}

#[axum::debug_handler]
pub async fn cohort(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> crate::error::Result<Json<Vec<AdminUserProgress>>> {
    query.validate()?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Ok(Json(state.ranking_service.cohort_progress(limit).await?))
}

#[axum::debug_handler]
pub async fn user_progress(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> crate::error::Result<Json<AdminUserProgress>> {
    Ok(Json(state.ranking_service.user_progress(user_id).await?))
}
