//! Cookbook service: users with roles, JWT login, recipes and recipe images.
//!
//! Uploaded images are written to the uploads directory and served back
//! under `/images`.

pub mod access;
pub mod auth;
pub mod error;
pub mod recipes;
pub mod users;
mod validation;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::AdminSeed;
use crate::db::Collection;
use crate::server;

use self::access::Role;
use self::auth::JwtKeys;
use self::error::CookbookError;
use self::recipes::Recipe;
use self::users::{Registration, User};

/// Shared state of the cookbook service.
pub struct CookbookState {
    pub users: Collection<User>,
    pub recipes: Collection<Recipe>,
    pub keys: JwtKeys,
    pub uploads_dir: PathBuf,
    /// Serializes the email uniqueness check with the insert.
    registration_lock: Mutex<()>,
}

impl CookbookState {
    /// Creates an empty cookbook.
    #[must_use]
    pub fn new(keys: JwtKeys, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            users: Collection::new("users"),
            recipes: Collection::new("recipes"),
            keys,
            uploads_dir: uploads_dir.into(),
            registration_lock: Mutex::new(()),
        }
    }

    /// Creates the configured administrator unless the email is taken.
    ///
    /// # Errors
    ///
    /// Returns [`CookbookError::Internal`] if the password cannot be hashed.
    pub async fn seed_admin(&self, seed: &AdminSeed) -> Result<(), CookbookError> {
        let reg = Registration {
            name: seed.name.clone(),
            email: seed.email.clone(),
            password: seed.password.clone(),
        };
        match self.register(reg, Role::Admin).await {
            Ok(user) => {
                tracing::info!(user = %user.id, email = %user.email, "administrator seeded");
                Ok(())
            }
            Err(CookbookError::EmailTaken) => Ok(()),
            Err(e) => Err(e),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        let uploads = std::env::temp_dir().join(format!("agora-uploads-{}", crate::db::DocId::new()));
        Self::new(JwtKeys::new("test-secret", 1), uploads)
    }
}

/// Builds the cookbook router.
pub fn router(state: Arc<CookbookState>) -> Router {
    let images = ServeDir::new(&state.uploads_dir);
    Router::new()
        .route("/", get(server::root))
        .route("/users", post(users::create))
        .route("/users/admin", post(users::create_admin))
        .route("/login", post(users::login))
        .route("/recipes", get(recipes::list).post(recipes::create))
        .route(
            "/recipes/{id}",
            get(recipes::get)
                .put(recipes::update)
                .delete(recipes::remove),
        )
        .route("/recipes/{id}/image", put(recipes::add_image))
        .nest_service("/images", images)
        .layer(server::catch_panics())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
