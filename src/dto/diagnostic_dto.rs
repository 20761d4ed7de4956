use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticAnswerInput {
    pub question_id: Uuid,
    pub option_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticSubmitRequest {
    #[serde(default)]
    pub answers: Vec<DiagnosticAnswerInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub user_id: Uuid,
    pub attempt_id: Uuid,
    pub score_percent: f64,
    pub level: Option<String>,
    pub recommended_topics: Vec<String>,
    pub topic_breakdown: BTreeMap<String, u32>,
    pub total_correct: usize,
    pub total_questions: usize,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticStatus {
    pub completed: bool,
    pub level: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}
