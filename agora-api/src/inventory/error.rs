//! Inventory errors and their `{ "err": { "code", "message" } }` envelope.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::stock::StockError;

/// Errors returned by the inventory handlers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    /// The request body or an id failed validation.
    #[error("{0}")]
    InvalidData(String),

    /// The addressed product or sale does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A sale references a product that does not exist.
    #[error("Product not found")]
    ProductNotFound,

    /// A sale asks for more units than are in stock.
    #[error("Such amount is not permitted to sell")]
    StockProblem,
}

impl InventoryError {
    /// Machine-readable code carried in the envelope.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidData(_) => "invalid_data",
            Self::NotFound(_) => "not_found",
            Self::ProductNotFound => "product_not_found",
            Self::StockProblem => "stock_problem",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidData(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::ProductNotFound | Self::StockProblem => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        let body = json!({ "err": { "code": self.code(), "message": self.to_string() } });
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for InventoryError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidData(rejection.body_text())
    }
}

impl From<StockError> for InventoryError {
    fn from(e: StockError) -> Self {
        match e {
            StockError::ProductNotFound(_) => Self::ProductNotFound,
            StockError::OutOfStock { .. } => Self::StockProblem,
        }
    }
}
