//! Passwords and tokens for the cookbook.
//!
//! Passwords are stored as Argon2id PHC strings. Tokens are HS256 JWTs whose
//! `sub` is the user's document id.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::db::DocId;

use super::CookbookState;
use super::access::Role;
use super::error::CookbookError;
use super::users::User;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Hashes a password with a fresh random salt.
///
/// # Errors
///
/// Returns [`CookbookError::Internal`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, CookbookError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(CookbookError::internal)
}

/// Checks a password against a stored hash. A corrupt hash never matches.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: DocId,
    pub email: String,
    /// Role at login time. Authorization re-reads the stored role.
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys plus token lifetime.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtKeys {
    /// Builds keys from a shared secret.
    #[must_use]
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        let ttl_secs = i64::try_from(ttl_hours.saturating_mul(3600)).unwrap_or(i64::MAX);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Issues a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`CookbookError::Internal`] if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, CookbookError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        jsonwebtoken::encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(CookbookError::internal)
    }

    /// Verifies signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns [`CookbookError::InvalidToken`] for any bad token.
    pub fn verify(&self, token: &str) -> Result<Claims, CookbookError> {
        let validation = Validation::new(JWT_ALGORITHM);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                CookbookError::InvalidToken
            })
    }
}

/// The caller identified by a valid token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: DocId,
    pub email: String,
}

impl FromRequestParts<Arc<CookbookState>> for AuthUser {
    type Rejection = CookbookError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<CookbookState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(CookbookError::MissingToken)?
            .to_str()
            .map_err(|_| CookbookError::InvalidToken)?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        if token.is_empty() {
            return Err(CookbookError::MissingToken);
        }
        let claims = state.keys.verify(token)?;
        Ok(Self {
            id: claims.sub,
            email: claims.email,
        })
    }
}
