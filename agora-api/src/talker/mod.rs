//! Talker service: speaker CRUD over a JSON file, guarded by login tokens.

pub mod auth;
pub mod error;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::server::{self, MessageBody};

use self::auth::TalkerToken;
use self::error::TalkerError;
use self::store::{Talker, TalkerStore};

/// Shared state of the talker service.
pub struct TalkerState {
    pub store: TalkerStore,
}

impl TalkerState {
    #[must_use]
    pub const fn new(store: TalkerStore) -> Self {
        Self { store }
    }
}

/// `POST /login` response.
#[derive(Debug, Serialize)]
pub struct TokenBody {
    pub token: String,
}

/// `GET /talker/search` query.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Builds the talker router.
pub fn router(state: Arc<TalkerState>) -> Router {
    Router::new()
        .route("/", get(server::root))
        .route("/login", post(login))
        .route("/talker", get(list).post(create))
        .route("/talker/search", get(search))
        .route("/talker/{id}", get(find).put(update).delete(remove))
        .layer(server::catch_panics())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Non-numeric ids can never match a talker.
fn parse_id(raw: &str) -> Result<u64, TalkerError> {
    raw.parse().map_err(|_| TalkerError::NotFound)
}

async fn login(payload: Result<Json<Value>, JsonRejection>) -> Result<Json<TokenBody>, TalkerError> {
    let Json(body) = payload?;
    let credentials = validation::validate_login(&body)?;
    tracing::info!(email = %credentials.email, "talker login");
    Ok(Json(TokenBody {
        token: auth::generate_token(),
    }))
}

async fn list(State(state): State<Arc<TalkerState>>) -> Result<Json<Vec<Talker>>, TalkerError> {
    Ok(Json(state.store.all().await?))
}

async fn find(
    State(state): State<Arc<TalkerState>>,
    Path(id): Path<String>,
) -> Result<Json<Talker>, TalkerError> {
    let id = parse_id(&id)?;
    Ok(Json(state.store.get(id).await?))
}

async fn search(
    State(state): State<Arc<TalkerState>>,
    _token: TalkerToken,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Talker>>, TalkerError> {
    Ok(Json(state.store.search(query.q.trim()).await?))
}

async fn create(
    State(state): State<Arc<TalkerState>>,
    _token: TalkerToken,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Talker>), TalkerError> {
    let Json(body) = payload?;
    let new = validation::validate_talker(&body)?;
    let talker = state.store.create(new).await?;
    Ok((StatusCode::CREATED, Json(talker)))
}

async fn update(
    State(state): State<Arc<TalkerState>>,
    _token: TalkerToken,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Talker>, TalkerError> {
    let Json(body) = payload?;
    let new = validation::validate_talker(&body)?;
    let id = parse_id(&id)?;
    Ok(Json(state.store.replace(id, new).await?))
}

async fn remove(
    State(state): State<Arc<TalkerState>>,
    _token: TalkerToken,
    Path(id): Path<String>,
) -> Result<axum::response::Response, TalkerError> {
    if let Ok(id) = parse_id(&id)
        && !state.store.remove(id).await?
    {
        tracing::debug!(id, "delete of absent talker");
    }
    Ok(MessageBody::response(
        StatusCode::OK,
        "Speaker deleted successfully",
    ))
}
