//! Body validation for talker and login requests.
//!
//! Checks run in a fixed order and the first failure wins.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::error::TalkerError;
use super::store::{NewTalker, Talk};

pub const NAME_MIN_LENGTH: usize = 3;
pub const MIN_AGE: u64 = 18;
pub const PASSWORD_MIN_LENGTH: usize = 6;

#[allow(clippy::expect_used)]
static WATCHED_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("valid regex"));

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.+-]+@[A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)*\.[a-z]{2,}$")
        .expect("valid regex")
});

/// Credentials accepted by `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A field counts as missing when absent, `null`, `false`, `0` or `""`.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

/// Validates a login body.
///
/// # Errors
///
/// Returns the first of: email missing, password missing, email malformed,
/// password too short.
pub fn validate_login(body: &Value) -> Result<Credentials, TalkerError> {
    let email = present(body.get("email")).ok_or(TalkerError::EmailMissing)?;
    let password = present(body.get("password")).ok_or(TalkerError::PasswordMissing)?;

    let email = email
        .as_str()
        .filter(|e| EMAIL.is_match(e))
        .ok_or(TalkerError::EmailInvalid)?;
    let password = password
        .as_str()
        .filter(|p| p.chars().count() >= PASSWORD_MIN_LENGTH)
        .ok_or(TalkerError::PasswordInvalid)?;

    Ok(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Validates a talker body.
///
/// # Errors
///
/// Returns the first failing rule, checked in the order name, age, talk,
/// `watchedAt`, rate.
pub fn validate_talker(body: &Value) -> Result<NewTalker, TalkerError> {
    let name = present(body.get("name")).ok_or(TalkerError::NameMissing)?;
    let name = name
        .as_str()
        .filter(|n| n.chars().count() >= NAME_MIN_LENGTH)
        .ok_or(TalkerError::NameInvalid)?;

    let age = present(body.get("age")).ok_or(TalkerError::AgeMissing)?;
    let age = age
        .as_u64()
        .filter(|a| *a >= MIN_AGE)
        .ok_or(TalkerError::AgeInvalid)?;

    let talk = present(body.get("talk")).ok_or(TalkerError::TalkMissing)?;
    let watched_at = present(talk.get("watchedAt")).ok_or(TalkerError::TalkMissing)?;
    let rate = talk
        .get("rate")
        .filter(|r| !r.is_null())
        .ok_or(TalkerError::TalkMissing)?;

    let watched_at = watched_at
        .as_str()
        .filter(|w| WATCHED_AT.is_match(w))
        .ok_or(TalkerError::WatchedAtInvalid)?;
    let rate = rate
        .as_u64()
        .filter(|r| (1..=5).contains(r))
        .and_then(|r| u8::try_from(r).ok())
        .ok_or(TalkerError::RateInvalid)?;

    Ok(NewTalker {
        name: name.to_string(),
        age,
        talk: Talk {
            watched_at: watched_at.to_string(),
            rate,
        },
    })
}
