#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use assessment_backend::database::memory::MemoryStore;
use assessment_backend::database::{tables, TableStore};
use assessment_backend::error::{Error, Result};
use assessment_backend::services::identity_service::{AuthSession, AuthUser, IdentityProvider};
use assessment_backend::services::progress_service::ProgressService;
use assessment_backend::services::token_service::TokenService;
use assessment_backend::AppState;
use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

pub const SECRET: &str = "integration-test-secret";

pub struct SeededQuestion {
    pub id: Uuid,
    pub topic: String,
    pub correct_option: Uuid,
    pub wrong_option: Uuid,
}

pub struct SeededSet {
    pub set_id: Uuid,
    pub questions: Vec<SeededQuestion>,
}

/// Inserts a set and one question per topic, each with a correct and a wrong option.
pub fn seed_set(store: &MemoryStore, title: &str, active: bool, topics: &[&str]) -> SeededSet {
    let set_id = Uuid::new_v4();
    store.seed(
        tables::TRIVIA_SETS,
        vec![json!({"id": set_id, "title": title, "topic": topics.first(), "is_active": active})],
    );
    let questions = topics
        .iter()
        .enumerate()
        .map(|(idx, topic)| {
            seed_question(
                store,
                tables::TRIVIA_QUESTIONS,
                tables::TRIVIA_OPTIONS,
                Some(set_id),
                &format!("{} question {}", title, idx + 1),
                topic,
            )
        })
        .collect();
    SeededSet { set_id, questions }
}

pub fn seed_diagnostic(store: &MemoryStore, topics: &[&str]) -> Vec<SeededQuestion> {
    topics
        .iter()
        .enumerate()
        .map(|(idx, topic)| {
            seed_question(
                store,
                tables::DIAGNOSTIC_QUESTIONS,
                tables::DIAGNOSTIC_OPTIONS,
                None,
                &format!("Diagnostic question {}", idx + 1),
                topic,
            )
        })
        .collect()
}

fn seed_question(
    store: &MemoryStore,
    questions_table: &str,
    options_table: &str,
    set_id: Option<Uuid>,
    prompt: &str,
    topic: &str,
) -> SeededQuestion {
    let id = Uuid::new_v4();
    let correct_option = Uuid::new_v4();
    let wrong_option = Uuid::new_v4();
    store.seed(
        questions_table,
        vec![json!({
            "id": id,
            "set_id": set_id,
            "prompt": prompt,
            "topic": topic,
            "difficulty": "easy",
            "is_active": true,
        })],
    );
    store.seed(
        options_table,
        vec![
            json!({"id": correct_option, "question_id": id, "text": "Right", "is_correct": true, "explanation": "Because."}),
            json!({"id": wrong_option, "question_id": id, "text": "Wrong", "is_correct": false, "explanation": "Not quite."}),
        ],
    );
    SeededQuestion {
        id,
        topic: topic.to_string(),
        correct_option,
        wrong_option,
    }
}

pub fn seed_badge(store: &MemoryStore, code: &str, criteria_type: &str, criteria_value: serde_json::Value) -> Uuid {
    let id = Uuid::new_v4();
    store.seed(
        tables::BADGES,
        vec![json!({
            "id": id,
            "code": code,
            "name": code.replace('_', " "),
            "criteria_type": criteria_type,
            "criteria_value": criteria_value,
            "is_active": true,
        })],
    );
    id
}

pub fn seed_admin(store: &MemoryStore, email: &str, active: Option<bool>) -> Uuid {
    let id = Uuid::new_v4();
    store.seed(
        tables::ADMIN_USERS,
        vec![json!({"id": id, "email": email, "full_name": "Admin", "is_active": active})],
    );
    id
}

pub fn seed_profile(store: &MemoryStore, user_id: Uuid, email: &str, full_name: &str) {
    store.seed(
        tables::PROFILES,
        vec![json!({"id": user_id, "email": email, "full_name": full_name})],
    );
}

pub fn progress(store: &Arc<MemoryStore>) -> ProgressService {
    let db: Arc<dyn TableStore> = store.clone();
    ProgressService::new(db)
}

/// Identity provider backed by fixed bearer tokens and passwords.
#[derive(Default)]
pub struct FakeIdentity {
    sessions: HashMap<String, AuthUser>,
    passwords: HashMap<String, (String, AuthUser)>,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, token: &str, user: AuthUser) -> Self {
        self.sessions.insert(token.to_string(), user);
        self
    }

    pub fn with_password(mut self, email: &str, password: &str, user: AuthUser) -> Self {
        self.passwords
            .insert(email.to_string(), (password.to_string(), user));
        self
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn current_user(&self, access_token: &str) -> Result<AuthUser> {
        self.sessions
            .get(access_token)
            .cloned()
            .ok_or_else(|| Error::Unauthorized("Invalid session".to_string()))
    }

    async fn password_grant(&self, email: &str, password: &str) -> Result<AuthSession> {
        match self.passwords.get(email) {
            Some((expected, user)) if expected == password => Ok(AuthSession {
                access_token: format!("session-{}", user.id),
                refresh_token: None,
                expires_in: Some(3600),
                user: user.clone(),
            }),
            _ => Err(Error::Unauthorized("Invalid credentials".to_string())),
        }
    }
}

pub fn user(email: &str) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
    }
}

pub fn app_state(store: &Arc<MemoryStore>, identity: FakeIdentity) -> AppState {
    let db: Arc<dyn TableStore> = store.clone();
    AppState::new(db, Arc::new(identity), TokenService::new(SECRET))
}
