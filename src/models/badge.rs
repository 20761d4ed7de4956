use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub criteria_type: Option<String>,
    pub criteria_value: Option<JsonValue>,
    #[serde(default)]
    pub is_active: bool,
}

/// Award rule decoded from `criteria_type` / `criteria_value`.
#[derive(Debug, Clone, PartialEq)]
pub enum BadgeCriteria {
    TriviaCompletedCount { count: i64 },
    DiagnosticCompleted,
    NewsReadCount { count: i64 },
    TopicMastery { topic: Option<String>, threshold: f64 },
    /// Never awarded.
    Unknown(String),
}

impl Badge {
    pub fn criteria(&self) -> BadgeCriteria {
        let value = self.criteria_value.as_ref();
        match self.criteria_type.as_deref().unwrap_or_default() {
            "TRIVIA_COMPLETED_COUNT" => BadgeCriteria::TriviaCompletedCount {
                count: json_int(value, "count", 1),
            },
            "DIAGNOSTIC_COMPLETED" => BadgeCriteria::DiagnosticCompleted,
            "NEWS_READ_COUNT" => BadgeCriteria::NewsReadCount {
                count: json_int(value, "count", 5),
            },
            "TOPIC_MASTERY" => BadgeCriteria::TopicMastery {
                topic: json_string(value, "topic"),
                threshold: json_int(value, "threshold", 80) as f64,
            },
            other => BadgeCriteria::Unknown(other.to_string()),
        }
    }
}

/// Integer parameter that may be stored as a number or a numeric string.
fn json_int(value: Option<&JsonValue>, key: &str, default: i64) -> i64 {
    match value.and_then(|v| v.get(key)) {
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(JsonValue::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

fn json_string(value: Option<&JsonValue>, key: &str) -> Option<String> {
    match value.and_then(|v| v.get(key))? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBadge {
    pub user_id: Uuid,
    pub badge_id: Uuid,
    pub awarded_at: Option<DateTime<Utc>>,
}
