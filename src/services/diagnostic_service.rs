use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::database::{decode_rows, fetch, fetch_one, tables, Filter, Query, Returning, TableStore};
use crate::dto::attempt_dto::PublicQuestion;
use crate::dto::diagnostic_dto::{DiagnosticResult, DiagnosticStatus, DiagnosticSubmitRequest};
use crate::error::{Error, Result};
use crate::models::activity::ActivityType;
use crate::models::assessment::{Answer, AnswerOption, DiagnosticAttempt, Question};
use crate::models::user::UserProfile;
use crate::services::attempt_service::with_public_options;
use crate::services::grading_service::GradingService;
use crate::services::progress_service::ProgressService;
use crate::utils::best_effort::best_effort;
use crate::utils::time::{now, to_rfc3339};

/// Single-shot placement assessment over the implicit diagnostic set.
#[derive(Clone)]
pub struct DiagnosticService {
    db: Arc<dyn TableStore>,
    progress: ProgressService,
}

impl DiagnosticService {
    pub fn new(db: Arc<dyn TableStore>, progress: ProgressService) -> Self {
        Self { db, progress }
    }

    pub async fn list_questions(&self) -> Result<Vec<PublicQuestion>> {
        let questions: Vec<Question> = fetch(
            self.db.as_ref(),
            tables::DIAGNOSTIC_QUESTIONS,
            &Query::new().eq("is_active", true),
        )
        .await?;
        with_public_options(self.db.as_ref(), tables::DIAGNOSTIC_OPTIONS, questions).await
    }

    pub async fn submit(
        &self,
        user_id: Uuid,
        request: &DiagnosticSubmitRequest,
    ) -> Result<DiagnosticResult> {
        if request.answers.is_empty() {
            return Err(Error::NoAnswers);
        }
        let mut seen = HashSet::new();
        if let Some(dup) = request.answers.iter().find(|a| !seen.insert(a.question_id)) {
            return Err(Error::InvalidInput(format!(
                "Question {} was answered more than once",
                dup.question_id
            )));
        }

        let db = self.db.as_ref();
        let options_query =
            Query::new().is_in("id", request.answers.iter().map(|a| a.option_id));
        let questions_query =
            Query::new().is_in("id", request.answers.iter().map(|a| a.question_id));
        let (options, questions) = tokio::try_join!(
            fetch::<AnswerOption>(db, tables::DIAGNOSTIC_OPTIONS, &options_query),
            fetch::<Question>(db, tables::DIAGNOSTIC_QUESTIONS, &questions_query),
        )?;

        let options: HashMap<Uuid, AnswerOption> =
            options.into_iter().map(|o| (o.id, o)).collect();
        let known_questions: HashSet<Uuid> = questions.iter().map(|q| q.id).collect();

        let mut answers = Vec::with_capacity(request.answers.len());
        for input in &request.answers {
            if !known_questions.contains(&input.question_id) {
                return Err(Error::NotFound(format!(
                    "Diagnostic question {} not found",
                    input.question_id
                )));
            }
            let option = options
                .get(&input.option_id)
                .filter(|o| o.question_id == input.question_id)
                .ok_or(Error::InvalidOption)?;
            answers.push(Answer {
                attempt_id: Uuid::nil(),
                question_id: input.question_id,
                selected_option_id: Some(option.id),
                is_correct: option.is_correct,
            });
        }

        let topics = GradingService::topic_index(&questions);
        let grade = GradingService::grade(&answers, &topics, answers.len());
        let level = GradingService::diagnostic_level(grade.score_percent);
        let completed_at = now();
        let stamp = to_rfc3339(completed_at);

        let inserted = self
            .db
            .insert(
                tables::DIAGNOSTIC_ATTEMPTS,
                vec![json!({
                    "user_id": user_id,
                    "started_at": stamp,
                    "completed_at": stamp,
                    "score_percent": grade.score_percent,
                    "level": level.as_str(),
                })],
                Returning::Representation,
            )
            .await?;
        let attempt: DiagnosticAttempt = decode_rows(tables::DIAGNOSTIC_ATTEMPTS, inserted)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Upstream("Diagnostic attempt insert returned no row".to_string()))?;

        let rows = answers
            .iter()
            .map(|a| {
                json!({
                    "attempt_id": attempt.id,
                    "question_id": a.question_id,
                    "selected_option_id": a.selected_option_id,
                    "is_correct": a.is_correct,
                })
            })
            .collect();
        self.db
            .insert(tables::DIAGNOSTIC_ANSWERS, rows, Returning::Minimal)
            .await?;

        tracing::info!(
            %user_id,
            attempt_id = %attempt.id,
            score = grade.score_percent,
            level = %level,
            "Diagnostic submitted"
        );

        best_effort(
            "mark diagnostic completed on profile",
            self.db.update(
                tables::PROFILES,
                &[Filter::eq("id", user_id)],
                json!({
                    "has_completed_diagnostic": true,
                    "diagnostic_level": level.as_str(),
                    "diagnostic_completed_at": stamp,
                }),
            ),
        )
        .await;

        best_effort(
            "record diagnostic completion",
            self.progress.record_activity(
                user_id,
                ActivityType::DiagnosticCompleted.as_str(),
                Some(json!({
                    "attemptId": attempt.id,
                    "score": grade.score_percent,
                    "level": level.as_str(),
                    "totalQuestions": grade.total_questions,
                    "correct": grade.total_correct,
                })),
            ),
        )
        .await;

        Ok(DiagnosticResult {
            user_id,
            attempt_id: attempt.id,
            score_percent: grade.score_percent,
            level: Some(level.as_str().to_string()),
            recommended_topics: grade.recommended_topics,
            topic_breakdown: grade.topic_breakdown,
            total_correct: grade.total_correct,
            total_questions: grade.total_questions,
            completed_at: Some(completed_at),
        })
    }

    pub async fn status(&self, user_id: Uuid) -> Result<DiagnosticStatus> {
        let profile: Option<UserProfile> = fetch_one(
            self.db.as_ref(),
            tables::PROFILES,
            &Query::new().eq("id", user_id),
        )
        .await?;
        Ok(match profile {
            Some(p) => DiagnosticStatus {
                completed: p.has_completed_diagnostic.unwrap_or(false),
                level: p.diagnostic_level,
                completed_at: p.diagnostic_completed_at,
            },
            None => DiagnosticStatus {
                completed: false,
                level: None,
                completed_at: None,
            },
        })
    }

    /// Latest diagnostic attempt, re-aggregated from its stored answers.
    pub async fn last_result(&self, user_id: Uuid) -> Result<DiagnosticResult> {
        let attempt: DiagnosticAttempt = fetch_one(
            self.db.as_ref(),
            tables::DIAGNOSTIC_ATTEMPTS,
            &Query::new()
                .eq("user_id", user_id)
                .order_by("completed_at", true)
                .limit(1),
        )
        .await?
        .ok_or_else(|| Error::NotFound("No diagnostic attempts yet".to_string()))?;

        let answers: Vec<Answer> = fetch(
            self.db.as_ref(),
            tables::DIAGNOSTIC_ANSWERS,
            &Query::new().eq("attempt_id", attempt.id),
        )
        .await?;
        let questions: Vec<Question> = if answers.is_empty() {
            Vec::new()
        } else {
            let ids: HashSet<Uuid> = answers.iter().map(|a| a.question_id).collect();
            fetch(
                self.db.as_ref(),
                tables::DIAGNOSTIC_QUESTIONS,
                &Query::new().is_in("id", ids),
            )
            .await?
        };

        let topics = GradingService::topic_index(&questions);
        let grade = GradingService::grade(&answers, &topics, answers.len());
        Ok(DiagnosticResult {
            user_id,
            attempt_id: attempt.id,
            score_percent: attempt.score_percent.unwrap_or(grade.score_percent),
            level: attempt.level,
            recommended_topics: grade.recommended_topics,
            topic_breakdown: grade.topic_breakdown,
            total_correct: grade.total_correct,
            total_questions: grade.total_questions,
            completed_at: attempt.completed_at,
        })
    }
}
