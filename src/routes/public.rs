use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in): the signup/token gateway and all read-only views
/// of the catalogue.
///
/// Anonymous access is read-only by construction. Every write route lives in
/// the authenticated or admin module, so nothing here can mutate state beyond
/// the registration flow itself.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // POST /auth/signup
        // Registers an account (or re-sends its confirmation code) and emails the code.
        .route("/auth/signup", post(handlers::auth::signup))
        // POST /auth/token
        // Exchanges username + confirmation code for a bearer JWT.
        .route("/auth/token", post(handlers::auth::obtain_token))
        // GET /categories?search=...&page=...
        // Paginated category listing with name search.
        .route("/categories", get(handlers::catalog::list_categories))
        // GET /genres?search=...&page=...
        // Paginated genre listing with name search.
        .route("/genres", get(handlers::catalog::list_genres))
        // GET /titles?category=...&genre=...&name=...&year=...
        // Paginated title listing; every row carries its computed rating.
        .route("/titles", get(handlers::titles::list_titles))
        // GET /titles/{title_id}
        // Detail view of one title.
        .route("/titles/{title_id}", get(handlers::titles::get_title))
        // GET /titles/{title_id}/reviews
        // Paginated reviews under a title; 404 if the title is unknown.
        .route(
            "/titles/{title_id}/reviews",
            get(handlers::reviews::list_reviews),
        )
        // GET /titles/{title_id}/reviews/{review_id}
        // Detail view of one review, scoped by its parent title.
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            get(handlers::reviews::get_review),
        )
        // GET /titles/{title_id}/reviews/{review_id}/comments
        // Paginated comments under a review; the whole parent chain is checked.
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            get(handlers::comments::list_comments),
        )
        // GET /titles/{title_id}/reviews/{review_id}/comments/{comment_id}
        // Detail view of one comment.
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
            get(handlers::comments::get_comment),
        )
}
