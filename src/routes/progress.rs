use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use validator::Validate;

use crate::dto::progress_dto::{
    AwardResult, AwardedBadge, ProgressOverview, RankingQuery, RecordActivityRequest,
    UserRankingEntry,
};
use crate::services::identity_service::AuthUser;
use crate::AppState;

const DEFAULT_RANKING_LIMIT: usize = 20;

#[axum::debug_handler]
pub async fn overview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> crate::error::Result<Json<ProgressOverview>> {
    Ok(Json(state.progress_service.overview(user.id).await?))
}

#[axum::debug_handler]
pub async fn list_badges(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> crate::error::Result<Json<Vec<AwardedBadge>>> {
    Ok(Json(state.progress_service.list_user_badges(user.id).await?))
}

#[axum::debug_handler]
pub async fn record_activity(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RecordActivityRequest>,
) -> crate::error::Result<(StatusCode, Json<AwardResult>)> {
    payload.validate()?;
    let awarded = state
        .progress_service
        .record_activity(user.id, &payload.activity_type, payload.metadata)
        .await?;
    Ok((StatusCode::CREATED, Json(AwardResult { awarded })))
}

#[axum::debug_handler]
pub async fn award_badges(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> crate::error::Result<Json<AwardResult>> {
    let awarded = state.progress_service.award_badges(user.id).await?;
    Ok(Json(AwardResult { awarded }))
}

#[axum::debug_handler]
pub async fn ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> crate::error::Result<Json<Vec<UserRankingEntry>>> {
    query.validate()?;
    let limit = query.limit.unwrap_or(DEFAULT_RANKING_LIMIT);
    Ok(Json(state.ranking_service.user_ranking(limit).await?))
}
