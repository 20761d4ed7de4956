mod common;

use std::sync::Arc;

use assessment_backend::database::memory::MemoryStore;
use assessment_backend::database::{tables, TableStore};
use assessment_backend::dto::attempt_dto::SubmitAnswerRequest;
use assessment_backend::error::{Error, ErrorKind};
use assessment_backend::services::attempt_service::AttemptService;
use serde_json::json;
use uuid::Uuid;

use common::{progress, seed_badge, seed_set, SeededQuestion};

fn service(store: &Arc<MemoryStore>) -> AttemptService {
    let db: Arc<dyn TableStore> = store.clone();
    AttemptService::new(db, progress(store))
}

fn pick(question: &SeededQuestion, correct: bool) -> SubmitAnswerRequest {
    SubmitAnswerRequest {
        question_id: question.id,
        selected_option_id: if correct {
            question.correct_option
        } else {
            question.wrong_option
        },
    }
}

#[tokio::test]
async fn full_attempt_scores_and_recommends_the_weakest_scored_topic() {
    let store = Arc::new(MemoryStore::new());
    let set = seed_set(&store, "ecology-101", true, &["ecology", "ecology", "climate", "oceans"]);
    seed_badge(&store, "FIRST_QUIZ", "TRIVIA_COMPLETED_COUNT", json!({"count": 1}));
    let svc = service(&store);
    let user_id = Uuid::new_v4();

    let started = svc.start(user_id, set.set_id).await.expect("start");
    assert_eq!(started.set_id, set.set_id);

    for (question, correct) in set.questions.iter().zip([true, true, true, false]) {
        let feedback = svc
            .answer(user_id, started.attempt_id, &pick(question, correct))
            .await
            .expect("answer");
        assert_eq!(feedback.correct, correct);
        assert_eq!(feedback.correct_option_id, Some(question.correct_option));
    }

    let result = svc.finish(user_id, started.attempt_id).await.expect("finish");
    assert_eq!(result.score_percent, 75.0);
    assert_eq!(result.total_correct, 3);
    assert_eq!(result.total_questions, 4);
    assert_eq!(result.topic_breakdown.get("ecology"), Some(&2));
    assert_eq!(result.topic_breakdown.get("climate"), Some(&1));
    assert!(!result.topic_breakdown.contains_key("oceans"));
    assert_eq!(result.recommended_topics, vec!["climate".to_string()]);
    assert_eq!(result.awarded_badges.len(), 1);
    assert_eq!(result.awarded_badges[0].code, "FIRST_QUIZ");

    let stored = store.rows(tables::TRIVIA_ATTEMPTS);
    assert_eq!(stored[0]["score_percent"], json!(75.0));
    assert!(stored[0]["completed_at"].is_string());

    let activities = store.rows(tables::USER_ACTIVITIES);
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0]["type"], "TRIVIA_COMPLETED");
    assert_eq!(activities[0]["metadata"]["correct"], 3);

    let fetched = svc.get_result(user_id, started.attempt_id).await.expect("result");
    assert_eq!(fetched.score_percent, 75.0);
    assert!(fetched.awarded_badges.is_empty());
}

#[tokio::test]
async fn completed_attempts_reject_answers_and_second_finish() {
    let store = Arc::new(MemoryStore::new());
    let set = seed_set(&store, "closed", true, &["history"]);
    let svc = service(&store);
    let user_id = Uuid::new_v4();

    let started = svc.start(user_id, set.set_id).await.unwrap();
    svc.finish(user_id, started.attempt_id).await.unwrap();

    let err = svc
        .answer(user_id, started.attempt_id, &pick(&set.questions[0], true))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AttemptClosed));
    let err = svc.finish(user_id, started.attempt_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AttemptClosed);
    assert!(store.rows(tables::TRIVIA_ANSWERS).is_empty());
}

#[tokio::test]
async fn re_answering_overwrites_the_previous_answer() {
    let store = Arc::new(MemoryStore::new());
    let set = seed_set(&store, "retry", true, &["math"]);
    let svc = service(&store);
    let user_id = Uuid::new_v4();
    let started = svc.start(user_id, set.set_id).await.unwrap();

    svc.answer(user_id, started.attempt_id, &pick(&set.questions[0], false))
        .await
        .unwrap();
    svc.answer(user_id, started.attempt_id, &pick(&set.questions[0], true))
        .await
        .unwrap();

    let answers = store.rows(tables::TRIVIA_ANSWERS);
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0]["is_correct"], json!(true));

    let result = svc.finish(user_id, started.attempt_id).await.unwrap();
    assert_eq!(result.score_percent, 100.0);
}

#[tokio::test]
async fn other_users_cannot_touch_an_attempt() {
    let store = Arc::new(MemoryStore::new());
    let set = seed_set(&store, "private", true, &["art"]);
    let svc = service(&store);
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let started = svc.start(owner, set.set_id).await.unwrap();

    let err = svc
        .answer(intruder, started.attempt_id, &pick(&set.questions[0], true))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = svc.finish(intruder, started.attempt_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = svc.get_result(intruder, started.attempt_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn inactive_or_missing_sets_cannot_be_started() {
    let store = Arc::new(MemoryStore::new());
    let inactive = seed_set(&store, "retired", false, &["art"]);
    let svc = service(&store);
    let user_id = Uuid::new_v4();

    let err = svc.start(user_id, inactive.set_id).await.unwrap_err();
    assert!(matches!(err, Error::SetUnavailable));
    let err = svc.start(user_id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::SetUnavailable));
    assert!(store.rows(tables::TRIVIA_ATTEMPTS).is_empty());
}

#[tokio::test]
async fn answers_must_match_the_attempt_set_and_question() {
    let store = Arc::new(MemoryStore::new());
    let set = seed_set(&store, "mine", true, &["art", "music"]);
    let other = seed_set(&store, "theirs", true, &["sport"]);
    let svc = service(&store);
    let user_id = Uuid::new_v4();
    let started = svc.start(user_id, set.set_id).await.unwrap();

    let err = svc
        .answer(user_id, started.attempt_id, &pick(&other.questions[0], true))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::QuestionSetMismatch));

    let crossed = SubmitAnswerRequest {
        question_id: set.questions[0].id,
        selected_option_id: set.questions[1].correct_option,
    };
    let err = svc.answer(user_id, started.attempt_id, &crossed).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOption));

    let err = svc
        .answer(user_id, Uuid::new_v4(), &pick(&set.questions[0], true))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn badge_failures_do_not_fail_finish() {
    let store = Arc::new(MemoryStore::new());
    let set = seed_set(&store, "resilient", true, &["geo"]);
    seed_badge(&store, "FIRST_QUIZ", "TRIVIA_COMPLETED_COUNT", json!({"count": 1}));
    let svc = service(&store);
    let user_id = Uuid::new_v4();
    let started = svc.start(user_id, set.set_id).await.unwrap();
    svc.answer(user_id, started.attempt_id, &pick(&set.questions[0], true))
        .await
        .unwrap();

    store.fail_table(tables::BADGES);
    let result = svc.finish(user_id, started.attempt_id).await.expect("finish");
    assert_eq!(result.score_percent, 100.0);
    assert!(result.awarded_badges.is_empty());
    assert!(store.rows(tables::TRIVIA_ATTEMPTS)[0]["completed_at"].is_string());
}

#[tokio::test]
async fn sets_without_questions_score_zero() {
    let store = Arc::new(MemoryStore::new());
    let set = seed_set(&store, "empty", true, &[]);
    let svc = service(&store);
    let user_id = Uuid::new_v4();

    let started = svc.start(user_id, set.set_id).await.unwrap();
    let result = svc.finish(user_id, started.attempt_id).await.unwrap();
    assert_eq!(result.score_percent, 0.0);
    assert_eq!(result.total_questions, 0);
    assert!(result.recommended_topics.is_empty());
}

#[tokio::test]
async fn catalog_reads_hide_correctness_and_stats_count_completed_only() {
    let store = Arc::new(MemoryStore::new());
    let set = seed_set(&store, "public", true, &["art", "music"]);
    seed_set(&store, "hidden", false, &["art"]);
    let svc = service(&store);

    let sets = svc.list_sets().await.unwrap();
    assert_eq!(sets.len(), 1);
    let questions = svc.list_questions(set.set_id).await.unwrap();
    assert_eq!(questions.len(), 2);
    let body = serde_json::to_value(&questions).unwrap();
    assert!(!body.to_string().contains("is_correct"));
    assert!(!body.to_string().contains("explanation"));

    let user_id = Uuid::new_v4();
    let done = svc.start(user_id, set.set_id).await.unwrap();
    svc.answer(user_id, done.attempt_id, &pick(&set.questions[0], true))
        .await
        .unwrap();
    svc.finish(user_id, done.attempt_id).await.unwrap();
    svc.start(user_id, set.set_id).await.unwrap();

    let stats = svc.user_stats(user_id).await.unwrap();
    assert_eq!(stats.total_attempts, 1);
    assert_eq!(stats.avg_score, 50.0);
    assert_eq!(stats.best_score, 50.0);
    assert_eq!(stats.total_questions_answered, 1);
    assert_eq!(stats.total_correct, 1);
}

#[tokio::test]
async fn failed_score_write_surfaces_and_skips_activity() {
    let store = Arc::new(MemoryStore::new());
    let set = seed_set(&store, "fragile", true, &["geo"]);
    let svc = service(&store);
    let user_id = Uuid::new_v4();
    let started = svc.start(user_id, set.set_id).await.unwrap();
    svc.answer(user_id, started.attempt_id, &pick(&set.questions[0], true))
        .await
        .unwrap();

    store.fail_writes(tables::TRIVIA_ATTEMPTS);
    let err = svc.finish(user_id, started.attempt_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    assert!(store.rows(tables::USER_ACTIVITIES).is_empty());
    assert!(store.rows(tables::TRIVIA_ATTEMPTS)[0]["completed_at"].is_null());
}

#[tokio::test]
async fn stale_correct_flag_on_selected_option_is_not_trusted() {
    let store = Arc::new(MemoryStore::new());
    let set = seed_set(&store, "edited", true, &["bio"]);
    let question = &set.questions[0];
    let stale = Uuid::new_v4();
    store.seed(
        tables::TRIVIA_OPTIONS,
        vec![json!({"id": stale, "question_id": question.id, "text": "Old answer", "is_correct": true})],
    );
    let svc = service(&store);
    let user_id = Uuid::new_v4();
    let started = svc.start(user_id, set.set_id).await.unwrap();

    let request = SubmitAnswerRequest {
        question_id: question.id,
        selected_option_id: stale,
    };
    let feedback = svc.answer(user_id, started.attempt_id, &request).await.unwrap();
    assert!(!feedback.correct);
    assert_eq!(feedback.correct_option_id, Some(question.correct_option));
    assert_eq!(store.rows(tables::TRIVIA_ANSWERS)[0]["is_correct"], json!(false));
}
