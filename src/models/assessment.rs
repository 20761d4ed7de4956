use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSet {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub topic: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// Quiz or diagnostic question. Diagnostic questions carry no `set_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub set_id: Option<Uuid>,
    pub prompt: String,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub set_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub score_percent: Option<f64>,
}

impl Attempt {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub score_percent: Option<f64>,
    pub level: Option<String>,
}

/// One stored answer, unique per (attempt_id, question_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub selected_option_id: Option<Uuid>,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DiagnosticLevel {
    pub fn from_score(score_percent: f64) -> Self {
        if score_percent >= 80.0 {
            DiagnosticLevel::Advanced
        } else if score_percent >= 50.0 {
            DiagnosticLevel::Intermediate
        } else {
            DiagnosticLevel::Beginner
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticLevel::Beginner => "Beginner",
            DiagnosticLevel::Intermediate => "Intermediate",
            DiagnosticLevel::Advanced => "Advanced",
        }
    }
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
