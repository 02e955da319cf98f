//! Talker login tokens.
//!
//! Tokens are opaque: any 16-character `Authorization` value is accepted.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use rand::Rng;

use super::error::TalkerError;

/// Token length in characters.
pub const TOKEN_LEN: usize = 16;

/// Tokens are drawn from the ASCII range `'0'..='z'`.
const TOKEN_CHARS: std::ops::RangeInclusive<u8> = b'0'..=b'z';

/// Generates a fresh random token.
#[must_use]
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| char::from(rng.random_range(TOKEN_CHARS)))
        .collect()
}

/// Proof that the request carried a well-formed token.
#[derive(Debug, Clone)]
pub struct TalkerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for TalkerToken {
    type Rejection = TalkerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(TalkerError::TokenMissing)?
            .to_str()
            .map_err(|_| TalkerError::TokenInvalid)?;
        if token.chars().count() != TOKEN_LEN {
            return Err(TalkerError::TokenInvalid);
        }
        Ok(Self(token.to_string()))
    }
}
