//! Users: registration, admin registration and login.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{DocId, Document};

use super::CookbookState;
use super::access::{self, Actor, Role};
use super::auth::{self, AuthUser};
use super::error::CookbookError;
use super::validation;

/// A stored user. `password` holds the Argon2 hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl Document for User {
    fn id(&self) -> &DocId {
        &self.id
    }
}

/// A user as shown to clients: everything but the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// `{ "user": ... }` response.
#[derive(Debug, Serialize)]
pub struct UserBody {
    pub user: UserProfile,
}

/// `{ "token": ... }` response.
#[derive(Debug, Serialize)]
pub struct TokenBody {
    pub token: String,
}

/// Registration fields after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Validates a registration body: non-empty `name`, well-formed `email`,
/// non-empty `password`.
///
/// # Errors
///
/// Returns [`CookbookError::InvalidEntries`] on any failure.
pub fn validate_registration(body: &Value) -> Result<Registration, CookbookError> {
    let name = validation::required_str(body, "name")?;
    let email = validation::required_str(body, "email")?;
    let password = validation::required_str(body, "password")?;
    if !validation::is_email(email) {
        return Err(CookbookError::InvalidEntries);
    }
    Ok(Registration {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    })
}

impl CookbookState {
    /// Stores a new user with the given role.
    ///
    /// # Errors
    ///
    /// Returns [`CookbookError::EmailTaken`] if the email is in use.
    pub async fn register(&self, reg: Registration, role: Role) -> Result<User, CookbookError> {
        let Registration {
            name,
            email,
            password,
        } = reg;
        let hash = tokio::task::spawn_blocking(move || auth::hash_password(&password))
            .await
            .map_err(CookbookError::internal)??;

        let _guard = self.registration_lock.lock().await;
        if self.users.find_one(|u| u.email == email).await.is_some() {
            return Err(CookbookError::EmailTaken);
        }
        let user = User {
            id: DocId::new(),
            name,
            email,
            password: hash,
            role,
        };
        tracing::info!(user = %user.id, role = ?role, "user registered");
        Ok(self.users.insert(user).await)
    }

    /// Checks credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`CookbookError::InvalidLogin`] for an unknown email or a
    /// wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, CookbookError> {
        let user = self
            .users
            .find_one(|u| u.email == email)
            .await
            .ok_or(CookbookError::InvalidLogin)?;

        let password = password.to_string();
        let hash = user.password.clone();
        let matches = tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
            .await
            .map_err(CookbookError::internal)?;
        if !matches {
            return Err(CookbookError::InvalidLogin);
        }
        tracing::info!(user = %user.id, "user logged in");
        self.keys.issue(&user)
    }

    /// Resolves the caller's current role. A deleted account acts as a
    /// plain user.
    pub async fn actor(&self, caller: &AuthUser) -> Actor {
        let role = self
            .users
            .find_by_id(&caller.id)
            .await
            .map(|u| u.role)
            .unwrap_or_default();
        Actor {
            id: caller.id.clone(),
            role,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(super) async fn create(
    State(state): State<Arc<CookbookState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<UserBody>), CookbookError> {
    let Json(body) = payload?;
    let reg = validate_registration(&body)?;
    let user = state.register(reg, Role::User).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserBody {
            user: UserProfile::from(&user),
        }),
    ))
}

pub(super) async fn create_admin(
    State(state): State<Arc<CookbookState>>,
    caller: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<UserBody>), CookbookError> {
    let actor = state.actor(&caller).await;
    if !access::authorize_admin_registration(&actor).is_allowed() {
        return Err(CookbookError::AdminOnly);
    }
    let Json(body) = payload?;
    let reg = validate_registration(&body)?;
    let user = state.register(reg, Role::Admin).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserBody {
            user: UserProfile::from(&user),
        }),
    ))
}

pub(super) async fn login(
    State(state): State<Arc<CookbookState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TokenBody>, CookbookError> {
    let Json(body) = payload.map_err(|_| CookbookError::EmptyLoginFields)?;
    let field = |key: &str| {
        body.get(key)
            .filter(|v| !v.is_null())
            .ok_or(CookbookError::EmptyLoginFields)
    };
    let email = field("email")?;
    let password = field("password")?;
    // Present but non-string values cannot match any stored user.
    let (Some(email), Some(password)) = (email.as_str(), password.as_str()) else {
        return Err(CookbookError::InvalidLogin);
    };
    let token = state.login(email, password).await?;
    Ok(Json(TokenBody { token }))
}
