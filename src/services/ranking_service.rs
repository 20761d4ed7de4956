//! Read-only leaderboard, cohort and ranking views over completed trivia attempts.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::{fetch, tables, Query, TableStore};
use crate::dto::admin_dto::{AdminUserProgress, LeaderboardRow};
use crate::dto::progress_dto::UserRankingEntry;
use crate::error::Result;
use crate::models::assessment::{Answer, Attempt};
use crate::models::user::UserProfile;

const MAX_WINDOW: usize = 2000;
const ADMIN_MIN_WINDOW: usize = 200;
const RANKING_MIN_WINDOW: usize = 500;

/// Number of recent attempts scanned to build a view of `limit` rows.
pub fn fetch_window(limit: usize, floor: usize) -> usize {
    MAX_WINDOW.min((limit.saturating_mul(5)).max(floor))
}

/// `0.4·avg + 0.3·best + 0.3·(attempts / most attempts · 100)`
pub fn ranking_score(avg: f64, best: f64, attempts: usize, max_attempts: usize) -> f64 {
    let volume = if max_attempts == 0 {
        0.0
    } else {
        attempts as f64 / max_attempts as f64 * 100.0
    };
    avg * 0.4 + best * 0.3 + volume * 0.3
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserAggregate {
    pub user_id: Uuid,
    pub attempts: usize,
    pub avg_score: f64,
    pub best_score: f64,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// Groups completed attempts by user. Output is ordered by user id.
pub fn aggregate(attempts: &[Attempt]) -> Vec<UserAggregate> {
    let mut grouped: HashMap<Uuid, Vec<&Attempt>> = HashMap::new();
    for attempt in attempts.iter().filter(|a| a.is_completed()) {
        grouped.entry(attempt.user_id).or_default().push(attempt);
    }

    let mut out: Vec<UserAggregate> = grouped
        .into_iter()
        .map(|(user_id, attempts)| {
            let scores: Vec<f64> = attempts
                .iter()
                .map(|a| a.score_percent.unwrap_or(0.0))
                .collect();
            UserAggregate {
                user_id,
                attempts: attempts.len(),
                avg_score: scores.iter().sum::<f64>() / scores.len() as f64,
                best_score: scores.iter().copied().fold(0.0, f64::max),
                last_attempt_at: attempts.iter().filter_map(|a| a.completed_at).max(),
            }
        })
        .collect();
    out.sort_by_key(|agg| agg.user_id);
    out
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

#[derive(Clone)]
pub struct RankingService {
    db: Arc<dyn TableStore>,
}

impl RankingService {
    pub fn new(db: Arc<dyn TableStore>) -> Self {
        Self { db }
    }

    async fn recent_attempts(&self, window: usize) -> Result<Vec<Attempt>> {
        fetch(
            self.db.as_ref(),
            tables::TRIVIA_ATTEMPTS,
            &Query::new().order_by("started_at", true).limit(window),
        )
        .await
    }

    async fn profiles(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, UserProfile>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let profiles: Vec<UserProfile> = fetch(
            self.db.as_ref(),
            tables::PROFILES,
            &Query::new().is_in("id", user_ids),
        )
        .await?;
        Ok(profiles.into_iter().map(|p| (p.id, p)).collect())
    }

    /// Highest average first, then highest best score.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardRow>> {
        let attempts = self
            .recent_attempts(fetch_window(limit, ADMIN_MIN_WINDOW))
            .await?;
        let mut rows = aggregate(&attempts);
        rows.sort_by(|a, b| {
            desc(a.avg_score, b.avg_score).then_with(|| desc(a.best_score, b.best_score))
        });
        rows.truncate(limit);

        let ids: Vec<Uuid> = rows.iter().map(|r| r.user_id).collect();
        let profiles = self.profiles(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|agg| {
                let profile = profiles.get(&agg.user_id);
                LeaderboardRow {
                    user_id: agg.user_id,
                    email: profile.and_then(|p| p.email.clone()),
                    full_name: profile.and_then(|p| p.full_name.clone()),
                    avg_score: agg.avg_score,
                    best_score: agg.best_score,
                    attempts: agg.attempts,
                }
            })
            .collect())
    }

    /// Most active users first, then highest average.
    pub async fn cohort_progress(&self, limit: usize) -> Result<Vec<AdminUserProgress>> {
        let attempts = self
            .recent_attempts(fetch_window(limit, ADMIN_MIN_WINDOW))
            .await?;
        let mut rows = aggregate(&attempts);
        rows.sort_by(|a, b| {
            b.attempts
                .cmp(&a.attempts)
                .then_with(|| desc(a.avg_score, b.avg_score))
        });
        rows.truncate(limit);

        let ids: Vec<Uuid> = rows.iter().map(|r| r.user_id).collect();
        let (profiles, accuracy) = tokio::try_join!(self.profiles(&ids), self.accuracy(&ids))?;
        Ok(rows
            .into_iter()
            .map(|agg| {
                let accuracy = accuracy.get(&agg.user_id).copied().unwrap_or(0.0);
                let profile = profiles.get(&agg.user_id);
                progress_row(agg, profile, accuracy)
            })
            .collect())
    }

    pub async fn user_progress(&self, user_id: Uuid) -> Result<AdminUserProgress> {
        let attempts: Vec<Attempt> = fetch(
            self.db.as_ref(),
            tables::TRIVIA_ATTEMPTS,
            &Query::new().eq("user_id", user_id),
        )
        .await?;
        let agg = aggregate(&attempts).into_iter().next().unwrap_or(UserAggregate {
            user_id,
            attempts: 0,
            avg_score: 0.0,
            best_score: 0.0,
            last_attempt_at: None,
        });

        let ids = [user_id];
        let (profiles, accuracy) = tokio::try_join!(self.profiles(&ids), self.accuracy(&ids))?;
        let accuracy = accuracy.get(&user_id).copied().unwrap_or(0.0);
        Ok(progress_row(agg, profiles.get(&user_id), accuracy))
    }

    /// Percentage of correct answers over each user's completed attempts.
    async fn accuracy(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, f64>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let attempts: Vec<Attempt> = fetch(
            self.db.as_ref(),
            tables::TRIVIA_ATTEMPTS,
            &Query::new().is_in("user_id", user_ids),
        )
        .await?;
        let owner: HashMap<Uuid, Uuid> = attempts
            .iter()
            .filter(|a| a.is_completed())
            .map(|a| (a.id, a.user_id))
            .collect();
        if owner.is_empty() {
            return Ok(HashMap::new());
        }

        let answers: Vec<Answer> = fetch(
            self.db.as_ref(),
            tables::TRIVIA_ANSWERS,
            &Query::new().is_in("attempt_id", owner.keys()),
        )
        .await?;
        let mut tally: HashMap<Uuid, (usize, usize)> = HashMap::new();
        for answer in &answers {
            if let Some(user_id) = owner.get(&answer.attempt_id) {
                let entry = tally.entry(*user_id).or_insert((0, 0));
                entry.0 += 1;
                if answer.is_correct {
                    entry.1 += 1;
                }
            }
        }
        Ok(tally
            .into_iter()
            .map(|(user_id, (answered, correct))| {
                (user_id, correct as f64 * 100.0 / answered as f64)
            })
            .collect())
    }

    /// Learner-facing ranking balancing score quality and volume.
    pub async fn user_ranking(&self, limit: usize) -> Result<Vec<UserRankingEntry>> {
        let attempts = self
            .recent_attempts(fetch_window(limit, RANKING_MIN_WINDOW))
            .await?;
        let aggregates = aggregate(&attempts);
        let max_attempts = aggregates.iter().map(|a| a.attempts).max().unwrap_or(0);

        let mut scored: Vec<(UserAggregate, f64)> = aggregates
            .into_iter()
            .map(|agg| {
                let score = ranking_score(agg.avg_score, agg.best_score, agg.attempts, max_attempts);
                (agg, score)
            })
            .collect();
        scored.sort_by(|a, b| desc(a.1, b.1));
        scored.truncate(limit);

        let ids: Vec<Uuid> = scored.iter().map(|(agg, _)| agg.user_id).collect();
        let profiles = self.profiles(&ids).await?;
        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(idx, (agg, score))| {
                let profile = profiles.get(&agg.user_id);
                UserRankingEntry {
                    rank: idx + 1,
                    user_id: agg.user_id,
                    full_name: profile.and_then(|p| p.full_name.clone()),
                    email: profile.and_then(|p| p.email.clone()),
                    total_quizzes: agg.attempts,
                    average_score: agg.avg_score,
                    best_score: agg.best_score,
                    ranking_score: score,
                }
            })
            .collect())
    }
}

fn progress_row(agg: UserAggregate, profile: Option<&UserProfile>, accuracy: f64) -> AdminUserProgress {
    AdminUserProgress {
        user_id: agg.user_id,
        email: profile.and_then(|p| p.email.clone()),
        full_name: profile.and_then(|p| p.full_name.clone()),
        total_attempts: agg.attempts,
        avg_score: agg.avg_score,
        best_score: agg.best_score,
        accuracy,
        last_attempt_at: agg.last_attempt_at,
    }
}
