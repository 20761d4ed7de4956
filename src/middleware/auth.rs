use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::AppState;

fn bearer_token(req: &Request) -> Result<String, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"missing_authorization"})),
        )
            .into_response());
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"bad_authorization"})),
        )
            .into_response());
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"unsupported_scheme"})),
        )
            .into_response());
    };
    Ok(token.trim().to_string())
}

/// Resolves the caller through the identity provider and stores the
/// [`AuthUser`](crate::services::identity_service::AuthUser) in request extensions.
pub async fn require_user(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = match bearer_token(&req) {
        Ok(token) => token,
        Err(response) => return response,
    };
    match state.identity.current_user(&token).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Admin gate: verified admin token plus a live, active `admin_users` row.
pub async fn require_admin(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = match bearer_token(&req) {
        Ok(token) => token,
        Err(response) => return response,
    };
    match state.admin_auth_service.require_admin(&token).await {
        Ok(admin) => {
            req.extensions_mut().insert(admin);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
