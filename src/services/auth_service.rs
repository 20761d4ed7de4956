use std::sync::Arc;

use crate::dto::auth_dto::{AdminLoginResponse, LoginRequest, LoginResponse};
use crate::error::{Error, Result};
use crate::services::admin_auth_service::{profile, AdminAuthService};
use crate::services::identity_service::IdentityProvider;
use crate::services::token_service::TokenService;
use crate::utils::best_effort::best_effort;

/// Login flows that mint app tokens and, for active administrators, admin tokens.
#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    admins: AdminAuthService,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        admins: AdminAuthService,
        tokens: TokenService,
    ) -> Self {
        Self {
            identity,
            admins,
            tokens,
        }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let session = self
            .identity
            .password_grant(&request.email, &request.password)
            .await?;
        let email = session
            .user
            .email
            .clone()
            .unwrap_or_else(|| request.email.clone());
        let subject = session.user.id.to_string();
        let app_token = self.tokens.mint_app_token(&subject, Some(&email))?;

        // A failed admin lookup downgrades to a plain login.
        let admin = best_effort("admin lookup during login", self.admins.find_by_email(&email))
            .await
            .flatten()
            .filter(|admin| admin.is_active());
        let admin_token = match &admin {
            Some(admin) => Some(
                self.tokens
                    .mint_admin_token(&admin.id.to_string(), Some(&admin.email))?,
            ),
            None => None,
        };

        tracing::info!(user_id = %session.user.id, is_admin = admin.is_some(), "User logged in");
        Ok(LoginResponse {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
            user: session.user,
            app_token,
            app_token_expires_in: self.tokens.app_ttl_seconds(),
            is_admin: admin_token.is_some(),
            admin_token_expires_in: admin_token
                .as_ref()
                .map(|_| self.tokens.admin_ttl_seconds()),
            admin_token,
        })
    }

    pub async fn admin_login(&self, request: &LoginRequest) -> Result<AdminLoginResponse> {
        let session = self
            .identity
            .password_grant(&request.email, &request.password)
            .await?;
        let email = session
            .user
            .email
            .clone()
            .unwrap_or_else(|| request.email.clone());

        let admin = self
            .admins
            .find_by_email(&email)
            .await?
            .ok_or_else(|| Error::Unauthorized("Account is not an administrator".to_string()))?;
        if !admin.is_active() {
            return Err(Error::AccountDisabled);
        }

        best_effort(
            "touch admin last_login_at",
            self.admins.touch_last_login(admin.id),
        )
        .await;

        let admin_token = self
            .tokens
            .mint_admin_token(&admin.id.to_string(), Some(&admin.email))?;
        tracing::info!(admin_id = %admin.id, "Administrator logged in");
        Ok(AdminLoginResponse {
            admin_token,
            expires_in: self.tokens.admin_ttl_seconds(),
            admin: profile(admin),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::database::{tables, TableStore};
    use crate::services::identity_service::{AuthSession, AuthUser, MockIdentityProvider};
    use serde_json::json;
    use uuid::Uuid;

    const SECRET: &str = "auth-service-secret";

    fn session(email: &str) -> AuthSession {
        AuthSession {
            access_token: "provider-jwt".into(),
            refresh_token: Some("refresh".into()),
            expires_in: Some(3600),
            user: AuthUser {
                id: Uuid::new_v4(),
                email: Some(email.into()),
            },
        }
    }

    fn service(store: Arc<MemoryStore>, identity: MockIdentityProvider) -> AuthService {
        let tokens = TokenService::new(SECRET);
        let db: Arc<dyn TableStore> = store;
        AuthService::new(
            Arc::new(identity),
            AdminAuthService::new(db, tokens.clone()),
            tokens,
        )
    }

    fn request(email: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: "secret".into(),
        }
    }

    #[tokio::test]
    async fn plain_users_get_only_an_app_token() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_password_grant()
            .returning(|email, _| Ok(session(email)));
        let auth = service(Arc::new(MemoryStore::new()), identity);

        let res = auth.login(&request("ana@example.com")).await.unwrap();
        assert!(!res.is_admin);
        assert!(res.admin_token.is_none());
        let claims = TokenService::new(SECRET).verify(&res.app_token).unwrap();
        assert_eq!(claims.role(), Some("authenticated"));
        assert_eq!(claims.subject(), Some(res.user.id.to_string().as_str()));
    }

    #[tokio::test]
    async fn active_admins_also_get_an_admin_token() {
        let store = Arc::new(MemoryStore::new());
        let admin_id = Uuid::new_v4();
        store.seed(
            tables::ADMIN_USERS,
            vec![json!({"id": admin_id, "email": "root@example.com", "full_name": "Root", "is_active": true})],
        );
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_password_grant()
            .returning(|email, _| Ok(session(email)));
        let auth = service(store, identity);

        let res = auth.login(&request("root@example.com")).await.unwrap();
        assert!(res.is_admin);
        assert_eq!(res.admin_token_expires_in, Some(7200));
        let claims = TokenService::new(SECRET)
            .verify(res.admin_token.as_deref().unwrap())
            .unwrap();
        assert_eq!(claims.role(), Some("admin"));
        assert_eq!(claims.subject(), Some(admin_id.to_string().as_str()));
    }

    #[tokio::test]
    async fn admin_lookup_failure_downgrades_to_plain_login() {
        let store = Arc::new(MemoryStore::new());
        store.fail_table(tables::ADMIN_USERS);
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_password_grant()
            .returning(|email, _| Ok(session(email)));
        let auth = service(store, identity);

        let res = auth.login(&request("root@example.com")).await.unwrap();
        assert!(!res.is_admin);
    }

    #[tokio::test]
    async fn admin_login_rejects_non_admins_and_disabled_admins() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            tables::ADMIN_USERS,
            vec![json!({"id": Uuid::new_v4(), "email": "off@example.com", "is_active": false})],
        );
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_password_grant()
            .returning(|email, _| Ok(session(email)));
        let auth = service(store, identity);

        let err = auth.admin_login(&request("nobody@example.com")).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        let err = auth.admin_login(&request("off@example.com")).await.unwrap_err();
        assert!(matches!(err, Error::AccountDisabled));
    }

    #[tokio::test]
    async fn bad_credentials_propagate() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_password_grant()
            .returning(|_, _| Err(Error::Unauthorized("Invalid credentials".into())));
        let auth = service(Arc::new(MemoryStore::new()), identity);

        let err = auth.login(&request("ana@example.com")).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }
}
