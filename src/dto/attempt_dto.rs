use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::progress_dto::AwardedBadge;
use crate::models::assessment::AssessmentSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub topic: Option<String>,
}

impl From<AssessmentSet> for SetSummary {
    fn from(set: AssessmentSet) -> Self {
        Self {
            id: set.id,
            title: set.title,
            description: set.description,
            topic: set.topic,
        }
    }
}

/// Option as shown to a learner: never carries correctness or explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicOption {
    pub id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub prompt: String,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub options: Vec<PublicOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartAttemptRequest {
    pub set_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartAttemptResponse {
    pub attempt_id: Uuid,
    pub set_id: Uuid,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: Uuid,
    pub selected_option_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub selected_option_id: Uuid,
    pub correct: bool,
    pub correct_option_id: Option<Uuid>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    pub attempt_id: Uuid,
    pub user_id: Uuid,
    pub set_id: Uuid,
    pub score_percent: f64,
    pub total_correct: usize,
    pub total_questions: usize,
    pub completed_at: Option<DateTime<Utc>>,
    pub topic_breakdown: BTreeMap<String, u32>,
    pub recommended_topics: Vec<String>,
    #[serde(default)]
    pub awarded_badges: Vec<AwardedBadge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: Uuid,
    pub total_attempts: usize,
    pub avg_score: f64,
    pub best_score: f64,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub total_questions_answered: usize,
    pub total_correct: usize,
}
