use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::error::CookbookError;

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid regex")
});

/// A non-empty string field.
pub(super) fn required_str<'a>(body: &'a Value, key: &str) -> Result<&'a str, CookbookError> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(CookbookError::InvalidEntries)
}

pub(super) fn is_email(s: &str) -> bool {
    EMAIL.is_match(s)
}
