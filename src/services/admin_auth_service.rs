use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::database::{fetch_one, tables, Filter, Query, TableStore};
use crate::dto::admin_dto::AdminProfile;
use crate::error::{Error, Result};
use crate::models::user::AdminUser;
use crate::services::token_service::{Claims, TokenService, ROLE_ADMIN};
use crate::utils::best_effort::best_effort;
use crate::utils::time::{now, to_rfc3339};

/// Signature check plus a live lookup, so deactivating an administrator revokes
/// their outstanding tokens immediately.
#[derive(Clone)]
pub struct AdminAuthService {
    db: Arc<dyn TableStore>,
    tokens: TokenService,
}

impl AdminAuthService {
    pub fn new(db: Arc<dyn TableStore>, tokens: TokenService) -> Self {
        Self { db, tokens }
    }

    pub async fn require_admin(&self, token: &str) -> Result<AdminProfile> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Unauthorized("Missing administrator token".to_string()));
        }

        let claims = self.tokens.verify(token)?;
        if claims.role() != Some(ROLE_ADMIN) {
            tracing::warn!(sub = ?claims.subject(), "Token without admin role presented to admin gate");
            return Err(Error::Unauthorized("Administrator role required".to_string()));
        }

        let admin = self.lookup(&claims).await?.ok_or_else(|| {
            tracing::warn!(sub = ?claims.subject(), "Admin token for unknown administrator");
            Error::Unauthorized("Administrator not found".to_string())
        })?;
        if !admin.is_active() {
            tracing::warn!(admin_id = %admin.id, "Disabled administrator presented a token");
            return Err(Error::AccountDisabled);
        }

        best_effort("touch admin last_login_at", self.touch_last_login(admin.id)).await;
        Ok(profile(admin))
    }

    /// `sub` when it is an id, otherwise the email claim (or a `sub` holding an email).
    async fn lookup(&self, claims: &Claims) -> Result<Option<AdminUser>> {
        if let Some(id) = claims.subject().and_then(|s| Uuid::parse_str(s).ok()) {
            return self.find_by_id(id).await;
        }
        match claims.email().or(claims.subject()) {
            Some(email) if !email.trim().is_empty() => self.find_by_email(email).await,
            _ => Err(Error::Unauthorized("Token carries no identity".to_string())),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>> {
        fetch_one(
            self.db.as_ref(),
            tables::ADMIN_USERS,
            &Query::new().eq("id", id).limit(1),
        )
        .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        fetch_one(
            self.db.as_ref(),
            tables::ADMIN_USERS,
            &Query::new().eq("email", email.trim()).limit(1),
        )
        .await
    }

    pub async fn touch_last_login(&self, admin_id: Uuid) -> Result<()> {
        self.db
            .update(
                tables::ADMIN_USERS,
                &[Filter::eq("id", admin_id)],
                json!({ "last_login_at": to_rfc3339(now()) }),
            )
            .await
    }
}

pub fn profile(admin: AdminUser) -> AdminProfile {
    AdminProfile {
        id: admin.id,
        email: admin.email,
        full_name: admin.full_name,
        role: ROLE_ADMIN.to_string(),
        last_login_at: admin.last_login_at,
    }
}
