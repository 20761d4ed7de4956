use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    TriviaCompleted,
    DiagnosticCompleted,
    NewsRead,
    #[serde(other)]
    Other,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::TriviaCompleted => "TRIVIA_COMPLETED",
            ActivityType::DiagnosticCompleted => "DIAGNOSTIC_COMPLETED",
            ActivityType::NewsRead => "NEWS_READ",
            ActivityType::Other => "OTHER",
        }
    }
}
