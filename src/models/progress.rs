use serde::{Deserialize, Serialize};

/// Per-user counts over the activity log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionStats {
    pub trivia_completed: u32,
    pub diagnostics_completed: u32,
    pub news_read: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicProgress {
    pub topic: String,
    pub correct: u32,
    pub total_answered: u32,
    /// 0..=100
    pub percent: f64,
}

impl TopicProgress {
    pub fn new(topic: String, total_answered: u32, correct: u32) -> Self {
        let percent = if total_answered == 0 {
            0.0
        } else {
            correct as f64 * 100.0 / total_answered as f64
        };
        Self {
            topic,
            correct,
            total_answered,
            percent,
        }
    }
}
