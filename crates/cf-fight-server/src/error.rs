use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use cf_fight_core::protocol::ErrorBody;

use crate::config::ConfigError;

/// Failure talking to the judge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JudgeError {
    /// The judge answered, but not with success. Carries its diagnostic.
    #[error("{0}")]
    Upstream(String),
    /// The judge has no user by this handle.
    #[error("{message}")]
    NotFound { handle: String, message: String },
    /// The judge could not be reached (connect failure, timeout, ...).
    #[error("Judge unreachable: {0}")]
    Network(String),
}

pub type JudgeResult<T> = Result<T, JudgeError>;

impl From<reqwest::Error> for JudgeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            JudgeError::Network(format!("request timed out: {}", e))
        } else {
            JudgeError::Network(e.to_string())
        }
    }
}

/// Failure of a session operation, as reported to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] JudgeError),
}

impl SessionError {
    pub fn validation(message: impl Into<String>) -> Self {
        SessionError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SessionError::Validation { .. } => StatusCode::BAD_REQUEST,
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::Upstream(JudgeError::NotFound { .. }) => StatusCode::NOT_FOUND,
            SessionError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            SessionError::Validation { message, details } => ErrorBody {
                error: message,
                details,
            },
            other => ErrorBody {
                error: other.to_string(),
                details: Vec::new(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Errors that stop the server binary.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Judge client error: {0}")]
    Judge(#[from] JudgeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_per_kind() {
        assert_eq!(SessionError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            SessionError::NotFound("Room not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SessionError::from(JudgeError::Network("refused".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn unknown_user_is_not_found() {
        let err = SessionError::from(JudgeError::NotFound {
            handle: "nobody".into(),
            message: "handles: User with handle nobody not found".into(),
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "handles: User with handle nobody not found");
    }

    #[test]
    fn upstream_keeps_judge_message() {
        let err = SessionError::from(JudgeError::Upstream(
            "handles: User with handle nobody not found".into(),
        ));
        assert_eq!(err.to_string(), "handles: User with handle nobody not found");
    }
}
