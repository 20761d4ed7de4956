use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::database::{fetch, tables, Query, Resolution, Returning, TableStore};
use crate::dto::progress_dto::{AwardedBadge, ProgressOverview};
use crate::error::Result;
use crate::models::activity::ActivityType;
use crate::models::assessment::{Answer, Question};
use crate::models::badge::{Badge, UserBadge};
use crate::models::progress::{InteractionStats, TopicProgress};
use crate::services::badge_rules;
use crate::utils::time::{now, to_rfc3339};

#[derive(Deserialize)]
struct IdRow {
    id: Uuid,
}

#[derive(Deserialize)]
struct TypeRow {
    #[serde(rename = "type")]
    activity_type: ActivityType,
}

/// Which attempt/answer/question tables a tally reads.
struct AnswerSource {
    attempts: &'static str,
    answers: &'static str,
    questions: &'static str,
}

const TRIVIA_SOURCE: AnswerSource = AnswerSource {
    attempts: tables::TRIVIA_ATTEMPTS,
    answers: tables::TRIVIA_ANSWERS,
    questions: tables::TRIVIA_QUESTIONS,
};

const DIAGNOSTIC_SOURCE: AnswerSource = AnswerSource {
    attempts: tables::DIAGNOSTIC_ATTEMPTS,
    answers: tables::DIAGNOSTIC_ANSWERS,
    questions: tables::DIAGNOSTIC_QUESTIONS,
};

/// Activity log, per-topic progress and badge awards.
#[derive(Clone)]
pub struct ProgressService {
    db: Arc<dyn TableStore>,
}

impl ProgressService {
    pub fn new(db: Arc<dyn TableStore>) -> Self {
        Self { db }
    }

    pub async fn interaction_stats(&self, user_id: Uuid) -> Result<InteractionStats> {
        let rows: Vec<TypeRow> = fetch(
            self.db.as_ref(),
            tables::USER_ACTIVITIES,
            &Query::new().select("type").eq("user_id", user_id),
        )
        .await?;

        let mut stats = InteractionStats::default();
        for row in rows {
            match row.activity_type {
                ActivityType::TriviaCompleted => stats.trivia_completed += 1,
                ActivityType::DiagnosticCompleted => stats.diagnostics_completed += 1,
                ActivityType::NewsRead => stats.news_read += 1,
                ActivityType::Other => {}
            }
        }
        Ok(stats)
    }

    /// Answered/correct per topic across trivia and diagnostic answers, sorted by topic.
    pub async fn topic_progress(&self, user_id: Uuid) -> Result<Vec<TopicProgress>> {
        let (trivia, diagnostic) = tokio::try_join!(
            self.answer_tally(&TRIVIA_SOURCE, user_id),
            self.answer_tally(&DIAGNOSTIC_SOURCE, user_id),
        )?;

        let mut merged = trivia;
        for (topic, (answered, correct)) in diagnostic {
            let entry = merged.entry(topic).or_insert((0, 0));
            entry.0 += answered;
            entry.1 += correct;
        }

        Ok(merged
            .into_iter()
            .map(|(topic, (answered, correct))| TopicProgress::new(topic, answered, correct))
            .collect())
    }

    async fn answer_tally(
        &self,
        source: &AnswerSource,
        user_id: Uuid,
    ) -> Result<BTreeMap<String, (u32, u32)>> {
        let attempts: Vec<IdRow> = fetch(
            self.db.as_ref(),
            source.attempts,
            &Query::new().select("id").eq("user_id", user_id),
        )
        .await?;
        if attempts.is_empty() {
            return Ok(BTreeMap::new());
        }

        let answers: Vec<Answer> = fetch(
            self.db.as_ref(),
            source.answers,
            &Query::new().is_in("attempt_id", attempts.iter().map(|a| a.id)),
        )
        .await?;
        if answers.is_empty() {
            return Ok(BTreeMap::new());
        }

        let question_ids: HashSet<Uuid> = answers.iter().map(|a| a.question_id).collect();
        let questions: Vec<Question> = fetch(
            self.db.as_ref(),
            source.questions,
            &Query::new().is_in("id", question_ids),
        )
        .await?;
        let topics: HashMap<Uuid, String> = questions
            .into_iter()
            .filter_map(|q| q.topic.map(|topic| (q.id, topic)))
            .collect();

        let mut tally = BTreeMap::new();
        for answer in &answers {
            let Some(topic) = topics.get(&answer.question_id) else {
                continue;
            };
            let entry: &mut (u32, u32) = tally.entry(topic.clone()).or_insert((0, 0));
            entry.0 += 1;
            if answer.is_correct {
                entry.1 += 1;
            }
        }
        Ok(tally)
    }

    /// Appends to the activity log, then evaluates the badge catalog.
    pub async fn record_activity(
        &self,
        user_id: Uuid,
        activity_type: &str,
        metadata: Option<JsonValue>,
    ) -> Result<Vec<AwardedBadge>> {
        let mut row = json!({
            "user_id": user_id,
            "type": activity_type,
            "created_at": to_rfc3339(now()),
        });
        if let Some(metadata) = metadata {
            row["metadata"] = metadata;
        }
        self.db
            .insert(tables::USER_ACTIVITIES, vec![row], Returning::Minimal)
            .await?;

        tracing::debug!(%user_id, activity_type, "Activity recorded");
        self.award_badges(user_id).await
    }

    pub async fn award_badges(&self, user_id: Uuid) -> Result<Vec<AwardedBadge>> {
        let db = self.db.as_ref();
        let catalog_query = Query::new().eq("is_active", true);
        let owned_query = Query::new().eq("user_id", user_id);
        let (catalog, owned, stats, topics) = tokio::try_join!(
            fetch::<Badge>(db, tables::BADGES, &catalog_query),
            fetch::<UserBadge>(db, tables::USER_BADGES, &owned_query),
            self.interaction_stats(user_id),
            self.topic_progress(user_id),
        )?;

        let owned: HashSet<Uuid> = owned.into_iter().map(|ub| ub.badge_id).collect();
        let qualifying = badge_rules::evaluate(&catalog, &owned, &stats, &topics);
        if qualifying.is_empty() {
            return Ok(Vec::new());
        }

        let awarded_at = now();
        let rows = qualifying
            .iter()
            .map(|badge| {
                json!({
                    "user_id": user_id,
                    "badge_id": badge.id,
                    "awarded_at": to_rfc3339(awarded_at),
                })
            })
            .collect();
        self.db
            .upsert(
                tables::USER_BADGES,
                rows,
                &tables::USER_BADGE_CONFLICT_KEY,
                Resolution::IgnoreDuplicates,
                Returning::Minimal,
            )
            .await?;

        for badge in &qualifying {
            tracing::info!(%user_id, badge_id = %badge.id, code = %badge.code, "Badge awarded");
        }
        Ok(qualifying
            .into_iter()
            .map(|badge| AwardedBadge::from_badge(badge, Some(awarded_at)))
            .collect())
    }

    pub async fn list_user_badges(&self, user_id: Uuid) -> Result<Vec<AwardedBadge>> {
        let owned: Vec<UserBadge> = fetch(
            self.db.as_ref(),
            tables::USER_BADGES,
            &Query::new().eq("user_id", user_id),
        )
        .await?;
        if owned.is_empty() {
            return Ok(Vec::new());
        }

        let awarded_at: HashMap<Uuid, _> = owned
            .iter()
            .map(|ub| (ub.badge_id, ub.awarded_at))
            .collect();
        let badges: Vec<Badge> = fetch(
            self.db.as_ref(),
            tables::BADGES,
            &Query::new().is_in("id", awarded_at.keys()),
        )
        .await?;

        let mut listed: Vec<AwardedBadge> = badges
            .iter()
            .map(|badge| AwardedBadge::from_badge(badge, awarded_at.get(&badge.id).copied().flatten()))
            .collect();
        listed.sort_by(|a, b| a.awarded_at.cmp(&b.awarded_at).then_with(|| a.code.cmp(&b.code)));
        Ok(listed)
    }

    pub async fn overview(&self, user_id: Uuid) -> Result<ProgressOverview> {
        let (stats, topics, badges) = tokio::try_join!(
            self.interaction_stats(user_id),
            self.topic_progress(user_id),
            self.list_user_badges(user_id),
        )?;
        Ok(ProgressOverview {
            stats,
            topics,
            badges,
        })
    }
}
