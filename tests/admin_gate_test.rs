mod common;

use std::sync::Arc;

use assessment_backend::database::memory::MemoryStore;
use assessment_backend::database::{tables, TableStore};
use assessment_backend::error::{Error, ErrorKind};
use assessment_backend::services::admin_auth_service::AdminAuthService;
use assessment_backend::services::token_service::{TokenService, ROLE_ADMIN};
use serde_json::json;

use common::{seed_admin, SECRET};

fn gate(store: &Arc<MemoryStore>) -> AdminAuthService {
    let db: Arc<dyn TableStore> = store.clone();
    AdminAuthService::new(db, TokenService::new(SECRET))
}

fn tokens() -> TokenService {
    TokenService::new(SECRET)
}

#[tokio::test]
async fn active_admin_passes_and_login_time_is_touched() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = seed_admin(&store, "root@example.com", Some(true));
    let token = tokens()
        .mint_admin_token(&admin_id.to_string(), Some("root@example.com"))
        .unwrap();

    let profile = gate(&store).require_admin(&token).await.expect("admin");
    assert_eq!(profile.id, admin_id);
    assert_eq!(profile.role, "admin");
    assert!(store.rows(tables::ADMIN_USERS)[0]["last_login_at"].is_string());
}

#[tokio::test]
async fn deactivation_revokes_outstanding_tokens() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = seed_admin(&store, "root@example.com", Some(true));
    let token = tokens()
        .mint_admin_token(&admin_id.to_string(), None)
        .unwrap();
    let gate = gate(&store);
    gate.require_admin(&token).await.expect("still active");

    store
        .update(
            tables::ADMIN_USERS,
            &[assessment_backend::database::Filter::eq("id", admin_id)],
            json!({"is_active": false}),
        )
        .await
        .unwrap();
    let err = gate.require_admin(&token).await.unwrap_err();
    assert!(matches!(err, Error::AccountDisabled));
}

#[tokio::test]
async fn null_active_flag_counts_as_disabled() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = seed_admin(&store, "pending@example.com", None);
    let token = tokens()
        .mint_admin_token(&admin_id.to_string(), None)
        .unwrap();

    let err = gate(&store).require_admin(&token).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccountDisabled);
}

#[tokio::test]
async fn app_tokens_and_garbage_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = seed_admin(&store, "root@example.com", Some(true));
    let gate = gate(&store);

    let app_token = tokens()
        .mint_app_token(&admin_id.to_string(), Some("root@example.com"))
        .unwrap();
    let err = gate.require_admin(&app_token).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = gate.require_admin("not.a.token").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidToken);
    let err = gate.require_admin("   ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let foreign = TokenService::new("another-secret")
        .mint_admin_token(&admin_id.to_string(), None)
        .unwrap();
    let err = gate.require_admin(&foreign).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidToken);
}

#[tokio::test]
async fn expired_admin_tokens_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = seed_admin(&store, "root@example.com", Some(true));
    let issued = chrono::Utc::now().timestamp() - 10_000;
    let token = tokens()
        .mint_at(&admin_id.to_string(), None, Some(ROLE_ADMIN), "app-admin", 7200, issued)
        .unwrap();

    let err = gate(&store).require_admin(&token).await.unwrap_err();
    assert!(matches!(err, Error::Expired));
}

#[tokio::test]
async fn email_subjects_resolve_by_email() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = seed_admin(&store, "root@example.com", Some(true));
    let token = tokens()
        .mint_admin_token("root@example.com", None)
        .unwrap();

    let profile = gate(&store).require_admin(&token).await.unwrap();
    assert_eq!(profile.id, admin_id);

    let stranger = tokens().mint_admin_token("nobody@example.com", None).unwrap();
    let err = gate(&store).require_admin(&stranger).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn touch_failure_does_not_block_the_gate() {
    let store = Arc::new(MemoryStore::new());
    let admin_id = seed_admin(&store, "root@example.com", Some(true));
    store.fail_writes(tables::ADMIN_USERS);
    let token = tokens()
        .mint_admin_token(&admin_id.to_string(), None)
        .unwrap();

    let profile = gate(&store).require_admin(&token).await.expect("admin");
    assert_eq!(profile.email, "root@example.com");
    assert!(store.rows(tables::ADMIN_USERS)[0].get("last_login_at").is_none());
}
