use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use uuid::Uuid;

use crate::dto::attempt_dto::{
    AnswerFeedback, AttemptResult, PublicQuestion, SetSummary, StartAttemptRequest,
    StartAttemptResponse, SubmitAnswerRequest, UserStats,
};
use crate::services::identity_service::AuthUser;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_sets(
    State(state): State<AppState>,
) -> crate::error::Result<Json<Vec<SetSummary>>> {
    Ok(Json(state.attempt_service.list_sets().await?))
}

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Path(set_id): Path<Uuid>,
) -> crate::error::Result<Json<Vec<PublicQuestion>>> {
    Ok(Json(state.attempt_service.list_questions(set_id).await?))
}

#[axum::debug_handler]
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<StartAttemptRequest>,
) -> crate::error::Result<(StatusCode, Json<StartAttemptResponse>)> {
    let started = state.attempt_service.start(user.id, payload.set_id).await?;
    Ok((StatusCode::CREATED, Json(started)))
}

#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(attempt_id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> crate::error::Result<Json<AnswerFeedback>> {
    let feedback = state
        .attempt_service
        .answer(user.id, attempt_id, &payload)
        .await?;
    Ok(Json(feedback))
}

#[axum::debug_handler]
pub async fn finish_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Json<AttemptResult>> {
    Ok(Json(state.attempt_service.finish(user.id, attempt_id).await?))
}

#[axum::debug_handler]
pub async fn get_result(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Json<AttemptResult>> {
    Ok(Json(
        state.attempt_service.get_result(user.id, attempt_id).await?,
    ))
}

#[axum::debug_handler]
pub async fn my_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> crate::error::Result<Json<UserStats>> {
    Ok(Json(state.attempt_service.user_stats(user.id).await?))
}
