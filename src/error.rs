use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification every [`Error`] falls into. Callers branch on this,
/// never on upstream error strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    AttemptClosed,
    InvalidInput,
    Unauthorized,
    AccountDisabled,
    InvalidToken,
    Expired,
    UpstreamFailure,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::AttemptClosed => "attempt_closed",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::AccountDisabled => "account_disabled",
            ErrorKind::InvalidToken => "invalid_token",
            ErrorKind::Expired => "token_expired",
            ErrorKind::UpstreamFailure => "upstream_failure",
            ErrorKind::Internal => "internal_error",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::AttemptClosed => StatusCode::CONFLICT,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized
            | ErrorKind::InvalidToken
            | ErrorKind::Expired => StatusCode::UNAUTHORIZED,
            ErrorKind::AccountDisabled => StatusCode::FORBIDDEN,
            ErrorKind::UpstreamFailure => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Assessment set is inactive or does not exist")]
    SetUnavailable,

    #[error("Selected option does not exist for this question")]
    InvalidOption,

    #[error("Question does not belong to the attempt's set")]
    QuestionSetMismatch,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Attempt has already been completed")]
    AttemptClosed,

    #[error("No answers were submitted")]
    NoAnswers,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Administrator account is disabled")]
    AccountDisabled,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    Expired,

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Failed to decode {table} rows: {source}")]
    Decode {
        table: String,
        source: serde_json::Error,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) | Error::SetUnavailable => ErrorKind::NotFound,
            Error::InvalidOption
            | Error::QuestionSetMismatch
            | Error::NoAnswers
            | Error::InvalidInput(_)
            | Error::Validation(_)
            | Error::Json(_) => ErrorKind::InvalidInput,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::AttemptClosed => ErrorKind::AttemptClosed,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::AccountDisabled => ErrorKind::AccountDisabled,
            Error::InvalidToken => ErrorKind::InvalidToken,
            Error::Expired => ErrorKind::Expired,
            Error::Upstream(_) | Error::Decode { .. } | Error::Reqwest(_) => {
                ErrorKind::UpstreamFailure
            }
            Error::Config(_) | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::UpstreamFailure => "External service error".to_string(),
            ErrorKind::Internal => "An unexpected error occurred".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let kind = self.kind();
        match kind {
            ErrorKind::UpstreamFailure | ErrorKind::Internal => {
                tracing::error!(error = %self, "request failed");
            }
            _ => tracing::debug!(error = %self, "request rejected"),
        }

        let body = Json(json!({
            "error": kind.code(),
            "message": self.public_message(),
        }));
        (kind.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_coarse_kinds() {
        assert_eq!(Error::NoAnswers.kind(), ErrorKind::InvalidInput);
        assert_eq!(Error::SetUnavailable.kind(), ErrorKind::NotFound);
        assert_eq!(Error::AttemptClosed.kind(), ErrorKind::AttemptClosed);
        assert_eq!(Error::Upstream("boom".into()).kind(), ErrorKind::UpstreamFailure);
    }

    #[test]
    fn upstream_detail_is_not_relayed() {
        let err = Error::Upstream("GET trivia_sets returned 500: secret detail".into());
        assert_eq!(err.public_message(), "External service error");

        let err = Error::InvalidInput("duplicate answer for question".into());
        assert!(err.public_message().contains("duplicate answer"));
    }

    #[test]
    fn status_codes_follow_kind() {
        let res = Error::AccountDisabled.into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let res = Error::Expired.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
