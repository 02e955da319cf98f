//! HTTP plumbing shared by every service: binding, the health route, the
//! `{ "message" }` error body and the panic guard.

use std::any::Any;
use std::net::SocketAddr;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;

/// Error body used by the talker and cookbook services.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    /// Human-readable description.
    pub message: String,
}

impl MessageBody {
    /// Builds a response with the given status and message.
    pub fn response(status: StatusCode, message: impl Into<String>) -> Response {
        let body = Self {
            message: message.into(),
        };
        (status, Json(body)).into_response()
    }
}

/// Layer answering a panicking handler with a 500 `{ "message" }` body
/// instead of dropping the connection.
#[must_use]
pub fn catch_panics() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(panic_response as fn(Box<dyn Any + Send + 'static>) -> Response)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("handler panicked");
    tracing::error!(panic = %detail, "request handler panicked");
    MessageBody::response(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Internal server error: {detail}"),
    )
}

/// `GET /`: empty 200 body.
pub async fn root() {}

/// Binds `addr` and serves `app` on a background task.
///
/// Returns the address actually bound, which differs from `addr` when
/// port `0` was requested.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    app: axum::Router,
) -> Result<(SocketAddr, JoinHandle<()>), Box<dyn std::error::Error + Send + Sync>> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "api server error");
        }
    });

    Ok((bound_addr, handle))
}
