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
    models::{CreateReviewRequest, Page, PageParams, Review, UpdateReviewRequest},
    permissions,
};

/// list_reviews
///
/// [Public Route] Lists a title's reviews, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews",
    params(("title_id" = i64, Path, description = "Title ID"), PageParams),
    responses(
        (status = 200, description = "Paginated reviews", body = Page<Review>),
        (status = 404, description = "Unknown title")
    )
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(title_id): Path<i64>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Page<Review>>> {
    if !state.repo.title_exists(title_id).await? {
        return Err(ApiError::not_found("Title"));
    }
    let (reviews, count) = state
        .repo
        .list_reviews(title_id, page.limit(), page.offset())
        .await?;
    Ok(Json(Page::build(uri.path(), &page, count, reviews)?))
}

/// create_review
///
/// [Authenticated Route] Posts a review under a title. One review per author
/// per title; a second attempt is a 400. The new score shows up in the title's
/// rating on the next read.
#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews",
    params(("title_id" = i64, Path, description = "Title ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review posted", body = Review),
        (status = 400, description = "Validation failed or already reviewed"),
        (status = 404, description = "Unknown title")
    )
)]
pub async fn create_review(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
    Json(payload): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    if !state.repo.title_exists(title_id).await? {
        return Err(ApiError::not_found("Title"));
    }
    payload.validate()?;
    if state.repo.user_has_review(title_id, author_id).await? {
        return Err(ApiError::BadRequest(
            "You have already reviewed this title.".to_string(),
        ));
    }

    let review = state
        .repo
        .create_review(title_id, author_id, payload.text, payload.score)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// get_review
///
/// [Public Route] Retrieves one review. The title id in the path must be the
/// review's actual parent, otherwise this is a 404.
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Review", body = Review),
        (status = 404, description = "Unknown title or review")
    )
)]
pub async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Review>> {
    if !state.repo.title_exists(title_id).await? {
        return Err(ApiError::not_found("Title"));
    }
    let review = state
        .repo
        .get_review(title_id, review_id)
        .await?
        .ok_or_not_found("Review")?;
    Ok(Json(review))
}

/// update_review
///
/// [Authenticated Route] Partially updates a review.
///
/// *Authorization*: the author may edit their own review; moderators and
/// admins may edit anyone's. Everyone else gets a 403.
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Updated review", body = Review),
        (status = 403, description = "Not the author or staff"),
        (status = 404, description = "Unknown title or review")
    )
)]
pub async fn update_review(
    user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateReviewRequest>,
) -> ApiResult<Json<Review>> {
    if !state.repo.title_exists(title_id).await? {
        return Err(ApiError::not_found("Title"));
    }
    let author = state
        .repo
        .get_review_author(title_id, review_id)
        .await?
        .ok_or_not_found("Review")?;
    permissions::require_author_or_staff(&user, author.author_id)?;

    payload.validate()?;
    let updated = state
        .repo
        .update_review(title_id, review_id, payload.text, payload.score)
        .await?
        .ok_or_not_found("Review")?;
    Ok(Json(updated))
}

/// delete_review
///
/// [Authenticated Route] Removes a review and its comments. Same authorization
/// tiers as editing.
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author or staff"),
        (status = 404, description = "Unknown title or review")
    )
)]
pub async fn delete_review(
    user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    if !state.repo.title_exists(title_id).await? {
        return Err(ApiError::not_found("Title"));
    }
    let author = state
        .repo
        .get_review_author(title_id, review_id)
        .await?
        .ok_or_not_found("Review")?;
    permissions::require_author_or_staff(&user, author.author_id)?;

    if state.repo.delete_review(title_id, review_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Review"))
    }
}
