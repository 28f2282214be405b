use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer: self-service profile access plus posting, editing and
/// removing reviews and comments.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module. This guarantees that
/// all handlers receive a validated `AuthUser` struct containing the user's ID
/// and role, which the review/comment handlers then use for their
/// author-or-staff authorization checks.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/PATCH /users/me
        // The caller's own account record. The PATCH payload type has no role
        // field, so self-service edits can never escalate privileges.
        .route(
            "/users/me",
            get(handlers::users::get_me).patch(handlers::users::update_me),
        )
        // POST /titles/{title_id}/reviews
        // Posts a review; the one-review-per-title rule is enforced here.
        .route(
            "/titles/{title_id}/reviews",
            post(handlers::reviews::create_review),
        )
        // PATCH/DELETE /titles/{title_id}/reviews/{review_id}
        // Author-or-staff edits and removals of a review.
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            patch(handlers::reviews::update_review).delete(handlers::reviews::delete_review),
        )
        // POST /titles/{title_id}/reviews/{review_id}/comments
        // Posts a comment under a review.
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            post(handlers::comments::create_comment),
        )
        // PATCH/DELETE /titles/{title_id}/reviews/{review_id}/comments/{comment_id}
        // Author-or-staff edits and removals of a comment.
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
            patch(handlers::comments::update_comment).delete(handlers::comments::delete_comment),
        )
}
