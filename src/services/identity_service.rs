use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

/// External identity provider: session introspection and password sign-in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self, access_token: &str) -> Result<AuthUser>;

    async fn password_grant(&self, email: &str, password: &str) -> Result<AuthSession>;
}

#[derive(Clone)]
pub struct SupabaseIdentity {
    http: Client,
    auth_url: String,
    anon_key: String,
}

impl SupabaseIdentity {
    pub fn new(http: Client, auth_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http,
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }
}

fn rejected(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    )
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn current_user(&self, access_token: &str) -> Result<AuthUser> {
        let resp = self
            .http
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if rejected(status) {
            return Err(Error::Unauthorized("Session is invalid or expired".to_string()));
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Identity lookup failed");
            return Err(Error::Upstream(format!("GET /user returned {}", status)));
        }
        Ok(resp.json::<AuthUser>().await?)
    }

    async fn password_grant(&self, email: &str, password: &str) -> Result<AuthSession> {
        let resp = self
            .http
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = resp.status();
        if rejected(status) {
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Password grant failed");
            return Err(Error::Upstream(format!("POST /token returned {}", status)));
        }
        Ok(resp.json::<AuthSession>().await?)
    }
}
