pub const TRIVIA_SETS: &str = "trivia_sets";
pub const TRIVIA_QUESTIONS: &str = "trivia_questions";
pub const TRIVIA_OPTIONS: &str = "trivia_options";
pub const TRIVIA_ATTEMPTS: &str = "trivia_attempts";
pub const TRIVIA_ANSWERS: &str = "trivia_answers";

pub const DIAGNOSTIC_QUESTIONS: &str = "diagnostic_questions";
pub const DIAGNOSTIC_OPTIONS: &str = "diagnostic_options";
pub const DIAGNOSTIC_ATTEMPTS: &str = "diagnostic_attempts";
pub const DIAGNOSTIC_ANSWERS: &str = "diagnostic_answers";

pub const BADGES: &str = "badges";
pub const USER_BADGES: &str = "user_badges";
pub const USER_ACTIVITIES: &str = "user_activities";

pub const ADMIN_USERS: &str = "admin_users";
pub const PROFILES: &str = "usuarios";

/// Unique key of an answer row.
pub const ANSWER_CONFLICT_KEY: [&str; 2] = ["attempt_id", "question_id"];
/// Unique key of an award row.
pub const USER_BADGE_CONFLICT_KEY: [&str; 2] = ["user_id", "badge_id"];
