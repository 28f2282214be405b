use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::ApiError;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The RBAC field carried by every user record. Stored as lowercase text in the
/// `users` table and rendered the same way on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Moderators and admins may edit or remove anyone's reviews and comments.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

/// User
///
/// Represents the user's canonical identity record stored in the `users` table.
/// The confirmation-code digest lives in the same table but is not part of
/// this struct, so it can never leak through a serializer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: i64,
    // The user's primary identifier, unique across the system.
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
}

/// Category
///
/// A catalogue grouping (e.g. "Films", "Books"); `slug` is the URL identifier.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Genre
///
/// Same shape as `Category`; a title carries any number of genres.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Title
///
/// The read representation of a catalogued work. `rating` is computed from the
/// title's reviews at query time and is null while the title has none; `genre`
/// and `category` are resolved to full objects.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Title {
    pub id: i64,
    pub name: String,
    pub year: i32,
    // Integer-rounded average of review scores, never persisted.
    pub rating: Option<i64>,
    pub description: Option<String>,
    pub genre: Vec<Genre>,
    pub category: Option<Category>,
}

/// TitleRow
///
/// Raw Database Row (Internal Use). One row of the titles listing query with the
/// category columns and the rating subquery flattened in. The repository folds
/// the genre list in afterwards and hands out a `Title`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct TitleRow {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub rating: Option<i64>,
}

/// Review
///
/// A user's scored opinion of a title, augmented with the author's username
/// (a join operation). At most one review per (title, author) pair.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Review {
    pub id: i64,
    pub text: String,
    // This field is loaded via a JOIN in the repository query.
    pub author: String,
    pub score: i32,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
}

/// Comment
///
/// A reply attached to a review, augmented with the author's username.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub author: String,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
}

/// ContentAuthor
///
/// Internal structure pairing a review/comment id with its author. Only used by
/// the repository and the permission checks; never serialized to clients.
#[derive(Debug, Clone, FromRow, Default)]
pub struct ContentAuthor {
    pub id: i64,
    pub author_id: i64,
}

/// TitleGenreRow
///
/// Raw Database Row (Internal Use). One (title, genre) pairing from the join
/// table, used to fold genre lists into titles after the main listing query.
#[derive(Debug, Clone, FromRow, Default)]
pub struct TitleGenreRow {
    pub title_id: i64,
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// TitleChanges
///
/// Internal partial update for a title, with category and genres already
/// resolved from slugs to ids by the handler. `genre_ids: Some(..)` replaces
/// the whole genre set.
#[derive(Debug, Clone, Default)]
pub struct TitleChanges {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub genre_ids: Option<Vec<i64>>,
}

// --- Auth Flow Schemas ---

/// SignUpRequest
///
/// Input payload for the public registration endpoint (POST /auth/signup).
/// Re-posting an existing (email, username) pair re-issues the confirmation code.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct SignUpRequest {
    #[validate(
        length(min = 1, max = 254, message = "Email must be 254 characters or fewer."),
        email(message = "Enter a valid email address.")
    )]
    pub email: String,
    #[validate(length(min = 1, max = 150, message = "Username must be 150 characters or fewer."))]
    pub username: String,
}

/// SignUpResponse
///
/// Echo of the accepted registration pair; the confirmation code itself only
/// travels by email.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignUpResponse {
    pub email: String,
    pub username: String,
}

/// TokenRequest
///
/// Input payload for exchanging an emailed confirmation code for a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct TokenRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 150 characters or fewer."))]
    pub username: String,
    #[validate(length(min = 1, message = "Confirmation code is required."))]
    pub confirmation_code: String,
}

/// TokenResponse
///
/// The issued JWT. Clients send it back as `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

// --- Request Payloads (Input Schemas) ---

/// CreateUserRequest
///
/// Input payload for the administrative user-creation endpoint (POST /users).
/// No email round-trip happens here; admins create accounts directly.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 150 characters or fewer."))]
    pub username: String,
    #[validate(
        length(min = 1, max = 254, message = "Email must be 254 characters or fewer."),
        email(message = "Enter a valid email address.")
    )]
    pub email: String,
    #[validate(length(max = 150, message = "First name must be 150 characters or fewer."))]
    pub first_name: Option<String>,
    #[validate(length(max = 150, message = "Last name must be 150 characters or fewer."))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
    // Defaults to `user` when omitted.
    pub role: Option<Role>,
}

/// UpdateUserRequest
///
/// Partial update payload for the administrative PATCH /users/{username}.
///
/// Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// so only the provided fields travel in the JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 150, message = "Username must be 150 characters or fewer."))]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        length(min = 1, max = 254, message = "Email must be 254 characters or fewer."),
        email(message = "Enter a valid email address.")
    )]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 150, message = "First name must be 150 characters or fewer."))]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 150, message = "Last name must be 150 characters or fewer."))]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// UpdateMeRequest
///
/// Partial update payload for PATCH /users/me. Deliberately has no `role`
/// field: a user cannot escalate their own role, whatever they send.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateMeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 150, message = "Username must be 150 characters or fewer."))]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        length(min = 1, max = 254, message = "Email must be 254 characters or fewer."),
        email(message = "Enter a valid email address.")
    )]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 150, message = "First name must be 150 characters or fewer."))]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 150, message = "Last name must be 150 characters or fewer."))]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// CreateCategoryRequest
///
/// Input payload for POST /categories. The slug must be unique.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 256, message = "Name must be 256 characters or fewer."))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Slug must be 50 characters or fewer."))]
    pub slug: String,
}

/// CreateGenreRequest
///
/// Input payload for POST /genres; same rules as categories.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateGenreRequest {
    #[validate(length(min = 1, max = 256, message = "Name must be 256 characters or fewer."))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Slug must be 50 characters or fewer."))]
    pub slug: String,
}

/// CreateTitleRequest
///
/// Input payload for POST /titles. `category` and `genre` reference existing
/// records by slug; unknown slugs are rejected.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateTitleRequest {
    #[validate(length(min = 1, max = 256, message = "Name must be 256 characters or fewer."))]
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub genre: Vec<String>,
    pub category: String,
}

/// UpdateTitleRequest
///
/// Partial update payload for PATCH /titles/{title_id}. When `genre` is
/// present it replaces the whole genre set.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateTitleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 256, message = "Name must be 256 characters or fewer."))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// CreateReviewRequest
///
/// Input payload for posting a review under a title.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, message = "Text is required."))]
    pub text: String,
    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10."))]
    pub score: i32,
}

/// UpdateReviewRequest
///
/// Partial update payload for a review.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Text is required."))]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10."))]
    pub score: Option<i32>,
}

/// CreateCommentRequest
///
/// Input payload for posting a new comment under a review.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, message = "Text is required."))]
    pub text: String,
}

/// UpdateCommentRequest
///
/// Partial update payload for a comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateCommentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Text is required."))]
    pub text: Option<String>,
}

// --- Listing Parameters & Envelope (Output) ---

/// PageParams
///
/// 1-based page selection shared by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, IntoParams, Default)]
#[into_params(parameter_in = Query)]
#[ts(export)]
pub struct PageParams {
    /// Page number, starting at 1.
    pub page: Option<u32>,
    /// Rows per page (default 10, capped at 100).
    pub page_size: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(10).clamp(1, 100)
    }

    pub fn limit(&self) -> i64 {
        self.page_size() as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * self.page_size() as i64
    }
}

/// SearchParams
///
/// Substring search used by the users, categories and genres listings.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, IntoParams, Default)]
#[into_params(parameter_in = Query)]
#[ts(export)]
pub struct SearchParams {
    pub search: Option<String>,
}

/// TitleFilter
///
/// Filter set for the titles listing; all fields combine with AND.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, IntoParams, Default)]
#[into_params(parameter_in = Query)]
#[ts(export)]
pub struct TitleFilter {
    /// Category slug, exact match.
    pub category: Option<String>,
    /// Genre slug; matches titles carrying that genre.
    pub genre: Option<String>,
    /// Substring of the title name.
    pub name: Option<String>,
    /// Exact release year.
    pub year: Option<i32>,
}

/// Page
///
/// Standard list envelope: the total row count plus links to the adjacent pages
/// and the rows of the requested window.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Builds the envelope for one window of `count` total rows.
    ///
    /// Asking for a page past the end of the collection is an error, matching
    /// the rest of the API's 404 semantics; the first page may be empty.
    pub fn build(
        path: &str,
        params: &PageParams,
        count: i64,
        results: Vec<T>,
    ) -> Result<Self, ApiError> {
        let page = params.page() as i64;
        let size = params.page_size() as i64;
        if page > 1 && params.offset() >= count {
            return Err(ApiError::NotFound("Invalid page.".to_string()));
        }
        let next = if page * size < count {
            Some(format!("{path}?page={}&page_size={size}", page + 1))
        } else {
            None
        };
        let previous = if page > 1 {
            Some(format!("{path}?page={}&page_size={size}", page - 1))
        } else {
            None
        };
        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }
}
