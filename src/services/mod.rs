pub mod admin_auth_service;
pub mod attempt_service;
pub mod auth_service;
pub mod badge_rules;
pub mod diagnostic_service;
pub mod grading_service;
pub mod identity_service;
pub mod progress_service;
pub mod ranking_service;
pub mod token_service;
