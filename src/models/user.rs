use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    /// A missing flag counts as inactive.
    #[serde(default)]
    pub is_active: Option<bool>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl AdminUser {
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(false)
    }
}

/// Row of the `usuarios` profile table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    #[serde(default)]
    pub has_completed_diagnostic: Option<bool>,
    pub diagnostic_level: Option<String>,
    pub diagnostic_completed_at: Option<DateTime<Utc>>,
}
