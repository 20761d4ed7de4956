pub mod activity;
pub mod assessment;
pub mod badge;
pub mod progress;
pub mod user;
