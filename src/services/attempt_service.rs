use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::database::{fetch, fetch_one, tables, Filter, Query, Resolution, Returning, TableStore};
use crate::dto::attempt_dto::{
    AnswerFeedback, AttemptResult, PublicOption, PublicQuestion, SetSummary,
    StartAttemptResponse, SubmitAnswerRequest, UserStats,
};
use crate::error::{Error, Result};
use crate::models::activity::ActivityType;
use crate::models::assessment::{Answer, AnswerOption, AssessmentSet, Attempt, Question};
use crate::services::grading_service::{Grade, GradingService};
use crate::services::progress_service::ProgressService;
use crate::utils::best_effort::best_effort;
use crate::utils::time::{now, to_rfc3339};

/// Start → answer → finish lifecycle of multi-step quizzes.
///
/// Holds no state between calls; the table store is the only source of truth.
#[derive(Clone)]
pub struct AttemptService {
    db: Arc<dyn TableStore>,
    progress: ProgressService,
}

impl AttemptService {
    pub fn new(db: Arc<dyn TableStore>, progress: ProgressService) -> Self {
        Self { db, progress }
    }

    pub async fn list_sets(&self) -> Result<Vec<SetSummary>> {
        let sets: Vec<AssessmentSet> = fetch(
            self.db.as_ref(),
            tables::TRIVIA_SETS,
            &Query::new().eq("is_active", true).order_by("title", false),
        )
        .await?;
        Ok(sets.into_iter().map(SetSummary::from).collect())
    }

    pub async fn list_questions(&self, set_id: Uuid) -> Result<Vec<PublicQuestion>> {
        let questions: Vec<Question> = fetch(
            self.db.as_ref(),
            tables::TRIVIA_QUESTIONS,
            &Query::new().eq("set_id", set_id).eq("is_active", true),
        )
        .await?;
        with_public_options(self.db.as_ref(), tables::TRIVIA_OPTIONS, questions).await
    }

    pub async fn start(&self, user_id: Uuid, set_id: Uuid) -> Result<StartAttemptResponse> {
        let set: Option<AssessmentSet> = fetch_one(
            self.db.as_ref(),
            tables::TRIVIA_SETS,
            &Query::new().eq("id", set_id),
        )
        .await?;
        if !set.is_some_and(|s| s.is_active) {
            return Err(Error::SetUnavailable);
        }

        let row = json!({
            "user_id": user_id,
            "set_id": set_id,
            "started_at": to_rfc3339(now()),
        });
        let inserted = self
            .db
            .insert(tables::TRIVIA_ATTEMPTS, vec![row], Returning::Representation)
            .await?;
        let attempt: Attempt = crate::database::decode_rows(tables::TRIVIA_ATTEMPTS, inserted)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Upstream("Attempt insert returned no row".to_string()))?;

        tracing::info!(%user_id, %set_id, attempt_id = %attempt.id, "Attempt started");
        Ok(StartAttemptResponse {
            attempt_id: attempt.id,
            set_id: attempt.set_id,
            started_at: attempt.started_at,
        })
    }

    pub async fn answer(
        &self,
        user_id: Uuid,
        attempt_id: Uuid,
        request: &SubmitAnswerRequest,
    ) -> Result<AnswerFeedback> {
        let db = self.db.as_ref();
        let attempt_query = Query::new().eq("id", attempt_id);
        let option_query = Query::new().eq("id", request.selected_option_id);
        let question_query = Query::new().eq("id", request.question_id);
        let (attempt, option, question) = tokio::try_join!(
            fetch_one::<Attempt>(db, tables::TRIVIA_ATTEMPTS, &attempt_query),
            fetch_one::<AnswerOption>(db, tables::TRIVIA_OPTIONS, &option_query),
            fetch_one::<Question>(db, tables::TRIVIA_QUESTIONS, &question_query),
        )?;

        let attempt = attempt.ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;
        if attempt.user_id != user_id {
            return Err(Error::Forbidden("Attempt belongs to another user".to_string()));
        }
        if attempt.is_completed() {
            return Err(Error::AttemptClosed);
        }
        let option = option
            .filter(|o| o.question_id == request.question_id)
            .ok_or(Error::InvalidOption)?;
        let question =
            question.ok_or_else(|| Error::NotFound("Question not found".to_string()))?;
        if question.set_id != Some(attempt.set_id) {
            return Err(Error::QuestionSetMismatch);
        }

        // Judge against the current correct option, not the flag on the selected row.
        let correct_option: Option<AnswerOption> = fetch_one(
            db,
            tables::TRIVIA_OPTIONS,
            &Query::new()
                .eq("question_id", question.id)
                .eq("is_correct", true),
        )
        .await?;
        let correct_option_id = correct_option.map(|o| o.id);
        let is_correct = correct_option_id == Some(option.id);

        let row = json!({
            "attempt_id": attempt.id,
            "question_id": question.id,
            "selected_option_id": option.id,
            "is_correct": is_correct,
        });
        self.db
            .upsert(
                tables::TRIVIA_ANSWERS,
                vec![row],
                &tables::ANSWER_CONFLICT_KEY,
                Resolution::MergeDuplicates,
                Returning::Minimal,
            )
            .await?;

        Ok(AnswerFeedback {
            attempt_id: attempt.id,
            question_id: question.id,
            selected_option_id: option.id,
            correct: is_correct,
            correct_option_id,
            explanation: option.explanation,
        })
    }

    pub async fn finish(&self, user_id: Uuid, attempt_id: Uuid) -> Result<AttemptResult> {
        let attempt = self.load_owned_attempt(user_id, attempt_id).await?;
        if attempt.is_completed() {
            return Err(Error::AttemptClosed);
        }

        let grade = self.grade(&attempt).await?;
        let completed_at = now();
        self.db
            .update(
                tables::TRIVIA_ATTEMPTS,
                &[Filter::eq("id", attempt.id)],
                json!({
                    "completed_at": to_rfc3339(completed_at),
                    "score_percent": grade.score_percent,
                }),
            )
            .await?;
        tracing::info!(
            %user_id,
            attempt_id = %attempt.id,
            score = grade.score_percent,
            correct = grade.total_correct,
            total = grade.total_questions,
            "Attempt finished"
        );

        let metadata = json!({
            "attemptId": attempt.id,
            "setId": attempt.set_id,
            "score": grade.score_percent,
            "totalQuestions": grade.total_questions,
            "correct": grade.total_correct,
        });
        let awarded_badges = best_effort(
            "record trivia completion",
            self.progress.record_activity(
                user_id,
                ActivityType::TriviaCompleted.as_str(),
                Some(metadata),
            ),
        )
        .await
        .unwrap_or_default();

        let score = grade.score_percent;
        Ok(into_result(&attempt, grade, score, Some(completed_at), awarded_badges))
    }

    pub async fn get_result(&self, user_id: Uuid, attempt_id: Uuid) -> Result<AttemptResult> {
        let attempt = self.load_owned_attempt(user_id, attempt_id).await?;
        let grade = self.grade(&attempt).await?;
        let score = attempt.score_percent.unwrap_or(grade.score_percent);
        Ok(into_result(&attempt, grade, score, attempt.completed_at, Vec::new()))
    }

    /// Aggregates over the user's completed attempts.
    pub async fn user_stats(&self, user_id: Uuid) -> Result<UserStats> {
        let attempts: Vec<Attempt> = fetch(
            self.db.as_ref(),
            tables::TRIVIA_ATTEMPTS,
            &Query::new().eq("user_id", user_id),
        )
        .await?;
        let completed: Vec<&Attempt> = attempts.iter().filter(|a| a.is_completed()).collect();

        let mut stats = UserStats {
            user_id,
            total_attempts: completed.len(),
            avg_score: 0.0,
            best_score: 0.0,
            last_attempt_at: completed.iter().filter_map(|a| a.completed_at).max(),
            total_questions_answered: 0,
            total_correct: 0,
        };
        if completed.is_empty() {
            return Ok(stats);
        }

        let scores: Vec<f64> = completed
            .iter()
            .map(|a| a.score_percent.unwrap_or(0.0))
            .collect();
        stats.avg_score = scores.iter().sum::<f64>() / scores.len() as f64;
        stats.best_score = scores.iter().copied().fold(0.0, f64::max);

        let answers: Vec<Answer> = fetch(
            self.db.as_ref(),
            tables::TRIVIA_ANSWERS,
            &Query::new().is_in("attempt_id", completed.iter().map(|a| a.id)),
        )
        .await?;
        stats.total_questions_answered = answers.len();
        stats.total_correct = answers.iter().filter(|a| a.is_correct).count();
        Ok(stats)
    }

    async fn load_owned_attempt(&self, user_id: Uuid, attempt_id: Uuid) -> Result<Attempt> {
        let attempt: Attempt = fetch_one(
            self.db.as_ref(),
            tables::TRIVIA_ATTEMPTS,
            &Query::new().eq("id", attempt_id),
        )
        .await?
        .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;
        if attempt.user_id != user_id {
            return Err(Error::Forbidden("Attempt belongs to another user".to_string()));
        }
        Ok(attempt)
    }

    /// Scores stored answers against every question in the attempt's set.
    async fn grade(&self, attempt: &Attempt) -> Result<Grade> {
        let db = self.db.as_ref();
        let answers_query = Query::new().eq("attempt_id", attempt.id);
        let questions_query = Query::new().eq("set_id", attempt.set_id);
        let (answers, questions) = tokio::try_join!(
            fetch::<Answer>(db, tables::TRIVIA_ANSWERS, &answers_query),
            fetch::<Question>(db, tables::TRIVIA_QUESTIONS, &questions_query),
        )?;
        let topics = GradingService::topic_index(&questions);
        Ok(GradingService::grade(&answers, &topics, questions.len()))
    }
}

fn into_result(
    attempt: &Attempt,
    grade: Grade,
    score_percent: f64,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    awarded_badges: Vec<crate::dto::progress_dto::AwardedBadge>,
) -> AttemptResult {
    AttemptResult {
        attempt_id: attempt.id,
        user_id: attempt.user_id,
        set_id: attempt.set_id,
        score_percent,
        total_correct: grade.total_correct,
        total_questions: grade.total_questions,
        completed_at,
        topic_breakdown: grade.topic_breakdown,
        recommended_topics: grade.recommended_topics,
        awarded_badges,
    }
}

/// Attaches options to questions without revealing correctness or explanations.
pub async fn with_public_options(
    db: &dyn TableStore,
    options_table: &str,
    questions: Vec<Question>,
) -> Result<Vec<PublicQuestion>> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }
    let options: Vec<AnswerOption> = fetch(
        db,
        options_table,
        &Query::new()
            .select("id,question_id,text")
            .is_in("question_id", questions.iter().map(|q| q.id)),
    )
    .await?;

    let mut by_question: HashMap<Uuid, Vec<PublicOption>> = HashMap::new();
    for option in options {
        by_question
            .entry(option.question_id)
            .or_default()
            .push(PublicOption {
                id: option.id,
                text: option.text,
            });
    }

    Ok(questions
        .into_iter()
        .map(|q| PublicQuestion {
            options: by_question.remove(&q.id).unwrap_or_default(),
            id: q.id,
            prompt: q.prompt,
            topic: q.topic,
            difficulty: q.difficulty,
        })
        .collect())
}
