use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Administrator identity resolved by the admin gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LimitQuery {
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avg_score: f64,
    pub best_score: f64,
    pub attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserProgress {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub total_attempts: usize,
    pub avg_score: f64,
    pub best_score: f64,
    /// Percentage of correct answers across all completed attempts.
    pub accuracy: f64,
    pub last_attempt_at: Option<DateTime<Utc>>,
}
