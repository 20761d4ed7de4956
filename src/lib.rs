pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::database::TableStore;
use crate::services::{
    admin_auth_service::AdminAuthService, attempt_service::AttemptService,
    auth_service::AuthService, diagnostic_service::DiagnosticService,
    identity_service::IdentityProvider, progress_service::ProgressService,
    ranking_service::RankingService, token_service::TokenService,
};

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub tokens: TokenService,
    pub auth_service: AuthService,
    pub admin_auth_service: AdminAuthService,
    pub attempt_service: AttemptService,
    pub diagnostic_service: DiagnosticService,
    pub progress_service: ProgressService,
    pub ranking_service: RankingService,
}

impl AppState {
    pub fn new(
        db: Arc<dyn TableStore>,
        identity: Arc<dyn IdentityProvider>,
        tokens: TokenService,
    ) -> Self {
        let progress_service = ProgressService::new(db.clone());
        let admin_auth_service = AdminAuthService::new(db.clone(), tokens.clone());
        let auth_service =
            AuthService::new(identity.clone(), admin_auth_service.clone(), tokens.clone());
        let attempt_service = AttemptService::new(db.clone(), progress_service.clone());
        let diagnostic_service = DiagnosticService::new(db.clone(), progress_service.clone());
        let ranking_service = RankingService::new(db);

        Self {
            identity,
            tokens,
            auth_service,
            admin_auth_service,
            attempt_service,
            diagnostic_service,
            progress_service,
            ranking_service,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let base_routes = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/admin/login", post(routes::auth::admin_login))
        .route("/api/trivia/sets", get(routes::trivia::list_sets))
        .route(
            "/api/trivia/sets/:id/questions",
            get(routes::trivia::list_questions),
        )
        .route(
            "/api/diagnostic/questions",
            get(routes::diagnostic::list_questions),
        )
        .route("/api/ranking", get(routes::progress::ranking));

    let user_api = Router::new()
        .route("/api/trivia/attempts", post(routes::trivia::start_attempt))
        .route(
            "/api/trivia/attempts/:id",
            get(routes::trivia::get_result),
        )
        .route(
            "/api/trivia/attempts/:id/answers",
            post(routes::trivia::submit_answer),
        )
        .route(
            "/api/trivia/attempts/:id/finish",
            post(routes::trivia::finish_attempt),
        )
        .route("/api/trivia/stats", get(routes::trivia::my_stats))
        .route("/api/diagnostic/submit", post(routes::diagnostic::submit))
        .route("/api/diagnostic/status", get(routes::diagnostic::status))
        .route(
            "/api/diagnostic/result",
            get(routes::diagnostic::last_result),
        )
        .route("/api/progress", get(routes::progress::overview))
        .route("/api/progress/badges", get(routes::progress::list_badges))
        .route(
            "/api/progress/badges/award",
            post(routes::progress::award_badges),
        )
        .route(
            "/api/progress/activities",
            post(routes::progress::record_activity),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user,
        ));

    let admin_api = Router::new()
        .route("/api/admin/me", get(routes::admin::me))
        .route("/api/admin/leaderboard", get(routes::admin::leaderboard))
        .route("/api/admin/cohort", get(routes::admin::cohort))
        .route(
            "/api/admin/users/:id/progress",
            get(routes::admin::user_progress),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    base_routes
        .merge(user_api)
        .merge(admin_api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
