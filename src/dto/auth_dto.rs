use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::admin_dto::AdminProfile;
use crate::services::identity_service::AuthUser;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub user: AuthUser,
    pub app_token: String,
    pub app_token_expires_in: i64,
    pub is_admin: bool,
    pub admin_token: Option<String>,
    pub admin_token_expires_in: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub admin_token: String,
    pub expires_in: i64,
    pub admin: AdminProfile,
}
