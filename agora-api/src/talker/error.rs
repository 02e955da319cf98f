//! Talker API errors and their `{ "message" }` rendering.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::server::MessageBody;

/// Errors returned by the talker handlers, rendered as `{ "message" }`.
#[derive(Debug, thiserror::Error)]
pub enum TalkerError {
    #[error("Speaker not found")]
    NotFound,
    #[error(r#"The "email" field is required"#)]
    EmailMissing,
    #[error(r#"The "email" must have the format "email@email.com""#)]
    EmailInvalid,
    #[error(r#"The "password" field is required"#)]
    PasswordMissing,
    #[error(r#"The "password" must have at least 6 characters"#)]
    PasswordInvalid,
    #[error("Token not found")]
    TokenMissing,
    #[error("Invalid token")]
    TokenInvalid,
    #[error(r#"The "name" field is required"#)]
    NameMissing,
    #[error(r#"The "name" must have at least 3 characters"#)]
    NameInvalid,
    #[error(r#"The "age" field is required"#)]
    AgeMissing,
    #[error("The speaker must be of legal age")]
    AgeInvalid,
    #[error(r#"The "talk" field is required and "watchedAt" and "rate" cannot be empty"#)]
    TalkMissing,
    #[error(r#"The "watchedAt" field must have the format "dd/mm/yyyy""#)]
    WatchedAtInvalid,
    #[error(r#"The "rate" field must be an integer from 1 to 5"#)]
    RateInvalid,
    #[error("{0}")]
    BadBody(String),

    /// The talker file could not be read or written.
    #[error("talker file {path}: {source}")]
    Storage {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    /// The talker file does not hold a talker array.
    #[error("talker file {path}: {source}")]
    Corrupt {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    /// The highest id in the file leaves no room for another talker.
    #[error("talker ids exhausted after {0}")]
    IdsExhausted(u64),
}

impl TalkerError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::TokenMissing | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Storage { .. } | Self::Corrupt { .. } | Self::IdsExhausted(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for TalkerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "talker request failed");
            return MessageBody::response(status, format!("Internal server error: {self}"));
        }
        MessageBody::response(status, self.to_string())
    }
}

impl From<JsonRejection> for TalkerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadBody(rejection.body_text())
    }
}
