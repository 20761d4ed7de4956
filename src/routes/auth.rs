use axum::{extract::State, response::Json};
use validator::Validate;

use crate::dto::auth_dto::{AdminLoginResponse, LoginRequest, LoginResponse};
use crate::AppState;

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> crate::error::Result<Json<LoginResponse>> {
    payload.validate()?;
    let response = state.auth_service.login(&payload).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> crate::error::Result<Json<AdminLoginResponse>> {
    payload.validate()?;
    let response = state.auth_service.admin_login(&payload).await?;
    Ok(Json(response))
}
