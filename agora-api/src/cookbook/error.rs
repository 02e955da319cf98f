//! Cookbook API errors and their `{ "message" }` rendering.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::server::MessageBody;

/// Errors returned by the cookbook handlers, rendered as `{ "message" }`.
#[derive(Debug, thiserror::Error)]
pub enum CookbookError {
    #[error("Invalid entries. Try again.")]
    InvalidEntries,
    #[error("Email already registered")]
    EmailTaken,
    #[error("All fields must be filled")]
    EmptyLoginFields,
    #[error("Incorrect username or password")]
    InvalidLogin,
    #[error("missing auth token")]
    MissingToken,
    #[error("jwt malformed")]
    InvalidToken,
    #[error("recipe not found")]
    RecipeNotFound,
    #[error("Only admins can register new admins")]
    AdminOnly,
    #[error("you are not allowed to change this recipe")]
    Forbidden,

    /// Anything the client cannot fix: hashing, signing, disk.
    #[error("{0}")]
    Internal(String),
}

impl CookbookError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEntries => StatusCode::BAD_REQUEST,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::EmptyLoginFields | Self::InvalidLogin | Self::MissingToken | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::RecipeNotFound => StatusCode::NOT_FOUND,
            Self::AdminOnly | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn internal(e: impl std::fmt::Display) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for CookbookError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!(error = %detail, "cookbook request failed");
            return MessageBody::response(
                self.status(),
                format!("Internal server error: {detail}"),
            );
        }
        MessageBody::response(self.status(), self.to_string())
    }
}

impl From<JsonRejection> for CookbookError {
    fn from(_: JsonRejection) -> Self {
        Self::InvalidEntries
    }
}

impl From<MultipartError> for CookbookError {
    fn from(e: MultipartError) -> Self {
        tracing::debug!(error = %e, "unreadable multipart body");
        Self::InvalidEntries
    }
}
