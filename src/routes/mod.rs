pub mod admin;
pub mod auth;
pub mod diagnostic;
pub mod health;
pub mod progress;
pub mod trivia;
