//! Handler Module Index
//!
//! Groups the HTTP handlers by resource. Every handler follows the same control
//! flow: permission check, payload validation, business rules, repository call,
//! serialized response. Failures short-circuit through `ApiError`, which owns
//! the wire format for every error status.

use axum::Json;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;

/// Registration and token issuance (public).
pub mod auth;

/// Category and genre management.
pub mod catalog;

/// Comments nested under a review.
pub mod comments;

/// Reviews nested under a title.
pub mod reviews;

/// Title catalogue management.
pub mod titles;

/// Account administration and the self-service `/users/me` endpoints.
pub mod users;

/// method_not_allowed
///
/// Shared fallback for requests that matched a path but used a method the path
/// does not support (e.g. GET on /categories/{slug}, which only accepts DELETE).
pub async fn method_not_allowed(method: Method) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "detail": format!("Method \"{method}\" not allowed.") })),
    )
}
