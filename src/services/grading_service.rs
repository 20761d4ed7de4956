use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use uuid::Uuid;

use crate::models::assessment::{Answer, DiagnosticLevel, Question};

/// Maximum number of weak topics suggested after an attempt.
pub const MAX_RECOMMENDED_TOPICS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grade {
    pub total_questions: usize,
    pub total_correct: usize,
    pub score_percent: f64,
    pub topic_breakdown: BTreeMap<String, u32>,
    pub recommended_topics: Vec<String>,
}

pub struct GradingService;

impl GradingService {
    pub fn score_percent(correct: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        correct as f64 * 100.0 / total as f64
    }

    pub fn topic_index(questions: &[Question]) -> HashMap<Uuid, String> {
        questions
            .iter()
            .filter_map(|q| q.topic.clone().map(|topic| (q.id, topic)))
            .collect()
    }

    /// Scores `answers` against a denominator of `total_questions`.
    ///
    /// The breakdown only counts correct answers, so a topic answered only wrongly is
    /// indistinguishable from one never attempted, and never shows up in recommendations.
    pub fn grade(
        answers: &[Answer],
        topics: &HashMap<Uuid, String>,
        total_questions: usize,
    ) -> Grade {
        let mut total_correct = 0;
        let mut topic_breakdown: BTreeMap<String, u32> = BTreeMap::new();

        for answer in answers.iter().filter(|a| a.is_correct) {
            total_correct += 1;
            if let Some(topic) = topics.get(&answer.question_id) {
                *topic_breakdown.entry(topic.clone()).or_insert(0) += 1;
            }
        }

        Grade {
            total_questions,
            total_correct,
            score_percent: Self::score_percent(total_correct, total_questions),
            recommended_topics: Self::recommend_topics(&topic_breakdown),
            topic_breakdown,
        }
    }

    /// Topics tied at the lowest count, in lexical order, at most three.
    pub fn recommend_topics(counts: &BTreeMap<String, u32>) -> Vec<String> {
        let Some(min) = counts.values().min().copied() else {
            return Vec::new();
        };
        counts
            .iter()
            .filter(|(_, count)| **count == min)
            .map(|(topic, _)| topic.clone())
            .take(MAX_RECOMMENDED_TOPICS)
            .collect()
    }

    pub fn diagnostic_level(score_percent: f64) -> DiagnosticLevel {
        DiagnosticLevel::from_score(score_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(question_id: Uuid, is_correct: bool) -> Answer {
        Answer {
            attempt_id: Uuid::nil(),
            question_id,
            selected_option_id: None,
            is_correct,
        }
    }

    fn topics(pairs: &[(Uuid, &str)]) -> HashMap<Uuid, String> {
        pairs.iter().map(|(id, t)| (*id, t.to_string())).collect()
    }

    #[test]
    fn score_is_zero_for_empty_sets() {
        assert_eq!(GradingService::score_percent(0, 0), 0.0);
        assert_eq!(GradingService::score_percent(3, 4), 75.0);
    }

    #[test]
    fn unanswered_questions_count_against_the_score() {
        let (q1, q2) = (Uuid::new_v4(), Uuid::new_v4());
        let idx = topics(&[(q1, "Water"), (q2, "Soil")]);
        let grade = GradingService::grade(&[answer(q1, true)], &idx, 4);
        assert_eq!(grade.total_correct, 1);
        assert_eq!(grade.score_percent, 25.0);
    }

    #[test]
    fn breakdown_counts_only_correct_answers() {
        let (q1, q2, q3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let idx = topics(&[(q1, "Water"), (q2, "Water"), (q3, "Soil")]);
        let grade = GradingService::grade(
            &[answer(q1, true), answer(q2, true), answer(q3, false)],
            &idx,
            3,
        );
        assert_eq!(grade.topic_breakdown.get("Water"), Some(&2));
        assert_eq!(grade.topic_breakdown.get("Soil"), None);
        assert_eq!(grade.recommended_topics, vec!["Water".to_string()]);
    }

    #[test]
    fn all_wrong_yields_no_recommendations() {
        let (q1, q2) = (Uuid::new_v4(), Uuid::new_v4());
        let idx = topics(&[(q1, "Water"), (q2, "Air")]);
        let grade = GradingService::grade(&[answer(q1, false), answer(q2, false)], &idx, 2);
        assert!(grade.topic_breakdown.is_empty());
        assert!(grade.recommended_topics.is_empty());
    }

    #[test]
    fn recommendation_ties_break_lexically_and_cap_at_three() {
        let counts: BTreeMap<String, u32> = [("e", 1), ("d", 1), ("c", 1), ("b", 1), ("a", 4)]
            .into_iter()
            .map(|(t, c)| (t.to_string(), c))
            .collect();
        assert_eq!(GradingService::recommend_topics(&counts), vec!["b", "c", "d"]);
        assert!(GradingService::recommend_topics(&BTreeMap::new()).is_empty());
    }
}
