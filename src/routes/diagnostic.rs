use axum::{extract::State, response::Json, Extension};

use crate::dto::attempt_dto::PublicQuestion;
use crate::dto::diagnostic_dto::{DiagnosticResult, DiagnosticStatus, DiagnosticSubmitRequest};
use crate::services::identity_service::AuthUser;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
) -> crate::error::Result<Json<Vec<PublicQuestion>>> {
    Ok(Json(state.diagnostic_service.list_questions().await?))
}

#[axum::debug_handler]
pub async fn submit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<DiagnosticSubmitRequest>,
) -> crate::error::Result<Json<DiagnosticResult>> {
    Ok(Json(state.diagnostic_service.submit(user.id, &payload).await?))
}

#[axum::debug_handler]
pub async fn status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> crate::error::Result<Json<DiagnosticStatus>> {
    Ok(Json(state.diagnostic_service.status(user.id).await?))
}

#[axum::debug_handler]
pub async fn last_result(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> crate::error::Result<Json<DiagnosticResult>> {
    Ok(Json(state.diagnostic_service.last_result(user.id).await?))
}
