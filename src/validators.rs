use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use regex::Regex;

use crate::error::ApiError;

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.@+-]+$").unwrap()
});

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap()
});

/// Rules the `username` field must satisfy everywhere it is writable.
///
/// `me` is reserved because `/users/me` addresses the caller's own record.
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username == "me" {
        return Err(ApiError::field("username", "\"me\" is a reserved username."));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(ApiError::field(
            "username",
            "Username may only contain letters, digits and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

/// Slugs identify categories and genres in URLs.
pub fn validate_slug(slug: &str) -> Result<(), ApiError> {
    if !SLUG_RE.is_match(slug) {
        return Err(ApiError::field(
            "slug",
            "Slug may only contain letters, digits, hyphens and underscores.",
        ));
    }
    Ok(())
}

/// Titles cannot be dated after the current year.
pub fn validate_year(year: i32) -> Result<(), ApiError> {
    if year > Utc::now().year() {
        return Err(ApiError::field("year", "Year cannot be in the future."));
    }
    Ok(())
}
