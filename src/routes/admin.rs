use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the admin role:
/// the account administration endpoints and every catalogue write.
///
/// Access Control:
/// Authentication happens through the `AuthUser` extractor in each handler's
/// signature (a missing or invalid token never reaches the handler body), and
/// each handler then explicitly checks `require_admin` before touching the
/// repository. The role check stays inside the handlers so the 403 carries
/// the API's standard error body.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /users
        // Paginated account listing with search, and direct account creation.
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        // GET/PATCH/DELETE /users/{username}
        // Account administration by username. The static /users/me route in the
        // authenticated module takes precedence over this parameterized one.
        .route(
            "/users/{username}",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        // POST /categories
        // Adds a category; the read side of /categories is public.
        .route("/categories", post(handlers::catalog::create_category))
        // DELETE /categories/{slug}
        // Removes a category. There is no GET here: the detail view does not
        // exist, and other methods fall through to the 405 handler.
        .route(
            "/categories/{slug}",
            delete(handlers::catalog::delete_category),
        )
        // POST /genres
        .route("/genres", post(handlers::catalog::create_genre))
        // DELETE /genres/{slug}
        .route("/genres/{slug}", delete(handlers::catalog::delete_genre))
        // POST /titles
        // Adds a title, resolving category and genre slugs.
        .route("/titles", post(handlers::titles::create_title))
        // PATCH/DELETE /titles/{title_id}
        // Title edits and removal; reviews cascade away on delete.
        .route(
            "/titles/{title_id}",
            delete(handlers::titles::delete_title).patch(handlers::titles::update_title),
        )
}
