use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::models::badge::Badge;
use crate::models::progress::{InteractionStats, TopicProgress};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardedBadge {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub awarded_at: Option<DateTime<Utc>>,
}

impl AwardedBadge {
    pub fn from_badge(badge: &Badge, awarded_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: badge.id,
            code: badge.code.clone(),
            name: badge.name.clone(),
            description: badge.description.clone(),
            icon_url: badge.icon_url.clone(),
            awarded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressOverview {
    pub stats: InteractionStats,
    pub topics: Vec<TopicProgress>,
    pub badges: Vec<AwardedBadge>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordActivityRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 64))]
    pub activity_type: String,
    pub metadata: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardResult {
    pub awarded: Vec<AwardedBadge>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RankingQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRankingEntry {
    pub rank: usize,
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub total_quizzes: usize,
    pub average_score: f64,
    pub best_score: f64,
    pub ranking_score: f64,
}
