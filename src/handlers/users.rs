use axum::{
    Json,
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, OptionExt},
    models::{
        CreateUserRequest, Page, PageParams, SearchParams, UpdateMeRequest, UpdateUserRequest,
        User,
    },
    permissions, validators,
};

/// list_users
///
/// [Admin Route] Lists every account, paginated and ordered by username, with
/// an optional username substring search.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageParams, SearchParams),
    responses((status = 200, description = "Paginated accounts", body = Page<User>))
)]
pub async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(page): Query<PageParams>,
    Query(search): Query<SearchParams>,
) -> ApiResult<Json<Page<User>>> {
    permissions::require_admin(&user)?;
    let (users, count) = state
        .repo
        .list_users(search.search, page.limit(), page.offset())
        .await?;
    Ok(Json(Page::build(uri.path(), &page, count, users)?))
}

/// create_user
///
/// [Admin Route] Creates an account directly, with no email confirmation
/// round-trip. The role defaults to `user` when omitted.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Validation failed or identifier taken")
    )
)]
pub async fn create_user(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    permissions::require_admin(&user)?;
    payload.validate()?;
    validators::validate_username(&payload.username)?;

    if state
        .repo
        .get_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::field(
            "username",
            "A user with that username already exists.",
        ));
    }
    if state.repo.get_user_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::field(
            "email",
            "A user with that email already exists.",
        ));
    }

    let role = payload.role.unwrap_or_default();
    let created = state.repo.create_user(payload, role).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// get_user
///
/// [Admin Route] Retrieves one account by username.
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    responses(
        (status = 200, description = "Account", body = User),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn get_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<User>> {
    permissions::require_admin(&user)?;
    let target = state
        .repo
        .get_user_by_username(&username)
        .await?
        .ok_or_not_found("User")?;
    Ok(Json(target))
}

/// update_user
///
/// [Admin Route] Partially updates an account, including its role. Changing
/// the username or email re-runs the uniqueness checks against other accounts.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated account", body = User),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn update_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    permissions::require_admin(&user)?;
    let target = state
        .repo
        .get_user_by_username(&username)
        .await?
        .ok_or_not_found("User")?;

    payload.validate()?;
    if let Some(new_username) = &payload.username {
        validators::validate_username(new_username)?;
        if let Some(existing) = state.repo.get_user_by_username(new_username).await? {
            if existing.id != target.id {
                return Err(ApiError::field(
                    "username",
                    "A user with that username already exists.",
                ));
            }
        }
    }
    if let Some(new_email) = &payload.email {
        if let Some(existing) = state.repo.get_user_by_email(new_email).await? {
            if existing.id != target.id {
                return Err(ApiError::field(
                    "email",
                    "A user with that email already exists.",
                ));
            }
        }
    }

    let updated = state
        .repo
        .update_user(&username, payload)
        .await?
        .ok_or_not_found("User")?;
    Ok(Json(updated))
}

/// delete_user
///
/// [Admin Route] Removes an account. The account's reviews and comments go
/// with it through the database cascades.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn delete_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<StatusCode> {
    permissions::require_admin(&user)?;
    if state.repo.delete_user(&username).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("User"))
    }
}

/// get_me
///
/// [Authenticated Route] Returns the caller's own account record.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses((status = 200, description = "Own account", body = User))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<User>> {
    let me = state.repo.get_user_by_id(id).await?.ok_or_not_found("User")?;
    Ok(Json(me))
}

/// update_me
///
/// [Authenticated Route] Lets the caller edit their own profile fields.
///
/// *Note*: the payload type has no `role` field, so a role change can never be
/// smuggled through this endpoint regardless of what the client sends.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = UpdateMeRequest,
    responses((status = 200, description = "Updated account", body = User))
)]
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateMeRequest>,
) -> ApiResult<Json<User>> {
    payload.validate()?;
    if let Some(new_username) = &payload.username {
        validators::validate_username(new_username)?;
        if let Some(existing) = state.repo.get_user_by_username(new_username).await? {
            if existing.id != user.id {
                return Err(ApiError::field(
                    "username",
                    "A user with that username already exists.",
                ));
            }
        }
    }
    if let Some(new_email) = &payload.email {
        if let Some(existing) = state.repo.get_user_by_email(new_email).await? {
            if existing.id != user.id {
                return Err(ApiError::field(
                    "email",
                    "A user with that email already exists.",
                ));
            }
        }
    }

    let changes = UpdateUserRequest {
        username: payload.username,
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        bio: payload.bio,
        role: None,
    };
    let updated = state
        .repo
        .update_user(&user.username, changes)
        .await?
        .ok_or_not_found("User")?;
    Ok(Json(updated))
}
