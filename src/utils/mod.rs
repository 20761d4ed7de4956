pub mod best_effort;
pub mod time;
