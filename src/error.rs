use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::mailer::MailerError;

/// Application-level error for HTTP handlers.
///
/// Implements [`IntoResponse`] with the wire conventions the API uses
/// everywhere: field-level validation failures render as
/// `{"<field>": ["<message>", ...]}` with status 400, everything else as
/// `{"detail": "<message>"}` with the matching status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Per-field validation failures (400).
    #[error("validation failed")]
    Fields(BTreeMap<String, Vec<String>>),

    /// A malformed request or broken business rule (400).
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403).
    #[error("{0}")]
    Forbidden(String),

    /// Missing resource, or a nested resource outside its parent (404).
    #[error("{0}")]
    NotFound(String),

    /// Database failure from sqlx (500, unique violations map to 400).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Confirmation email could not be handed to the mailer (500).
    #[error("email delivery failed: {0}")]
    Mail(#[from] MailerError),

    /// Anything else that should surface as a sanitized 500.
    #[error("{0}")]
    Internal(String),
}

/// Handler return type used across the crate.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), vec![message.into()]);
        ApiError::Fields(fields)
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{what} not found."))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = BTreeMap::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({}).", e.code),
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        ApiError::Fields(fields)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Fields(fields) => {
                let body: serde_json::Map<String, serde_json::Value> = fields
                    .into_iter()
                    .map(|(field, messages)| (field, json!(messages)))
                    .collect();
                (StatusCode::BAD_REQUEST, Json(serde_json::Value::Object(body))).into_response()
            }
            ApiError::BadRequest(message) => detail(StatusCode::BAD_REQUEST, &message),
            ApiError::Unauthorized(message) => detail(StatusCode::UNAUTHORIZED, &message),
            ApiError::Forbidden(message) => detail(StatusCode::FORBIDDEN, &message),
            ApiError::NotFound(message) => detail(StatusCode::NOT_FOUND, &message),
            ApiError::Database(err) => {
                if let sqlx::Error::RowNotFound = err {
                    return detail(StatusCode::NOT_FOUND, "Not found.");
                }
                if is_unique_violation(&err) {
                    return detail(
                        StatusCode::BAD_REQUEST,
                        "A record with these unique fields already exists.",
                    );
                }
                tracing::error!(error = %err, "database error");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
            ApiError::Mail(err) => {
                tracing::error!(error = %err, "confirmation email delivery failed");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "internal error");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
        }
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation),
        _ => false,
    }
}

/// Lets handlers turn `Option<T>` lookups into 404s inline.
pub trait OptionExt<T> {
    fn ok_or_not_found(self, what: &str) -> Result<T, ApiError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, what: &str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(what))
    }
}
