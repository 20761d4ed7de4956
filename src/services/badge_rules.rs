use std::collections::HashSet;

use uuid::Uuid;

use crate::models::badge::{Badge, BadgeCriteria};
use crate::models::progress::{InteractionStats, TopicProgress};

/// Badges from `catalog` the user now qualifies for and does not already own.
pub fn evaluate<'a>(
    catalog: &'a [Badge],
    owned: &HashSet<Uuid>,
    stats: &InteractionStats,
    topics: &[TopicProgress],
) -> Vec<&'a Badge> {
    catalog
        .iter()
        .filter(|badge| badge.is_active && !owned.contains(&badge.id))
        .filter(|badge| qualifies(&badge.criteria(), stats, topics))
        .collect()
}

pub fn qualifies(criteria: &BadgeCriteria, stats: &InteractionStats, topics: &[TopicProgress]) -> bool {
    match criteria {
        BadgeCriteria::TriviaCompletedCount { count } => i64::from(stats.trivia_completed) >= *count,
        BadgeCriteria::DiagnosticCompleted => stats.diagnostics_completed >= 1,
        BadgeCriteria::NewsReadCount { count } => i64::from(stats.news_read) >= *count,
        BadgeCriteria::TopicMastery { topic, threshold } => {
            let Some(topic) = topic else {
                return false;
            };
            let wanted = topic.to_lowercase();
            topics
                .iter()
                .find(|progress| progress.topic.to_lowercase() == wanted)
                .is_some_and(|progress| progress.percent >= *threshold)
        }
        BadgeCriteria::Unknown(_) => false,
    }
}
