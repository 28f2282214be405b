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
    models::{Comment, CreateCommentRequest, Page, PageParams, UpdateCommentRequest},
    permissions,
};

/// Walks the title/review parent chain shared by every comment endpoint;
/// either link missing is a 404 naming the broken link.
async fn require_parent_chain(
    state: &AppState,
    title_id: i64,
    review_id: i64,
) -> Result<(), ApiError> {
    if !state.repo.title_exists(title_id).await? {
        return Err(ApiError::not_found("Title"));
    }
    if !state.repo.review_exists(title_id, review_id).await? {
        return Err(ApiError::not_found("Review"));
    }
    Ok(())
}

/// list_comments
///
/// [Public Route] Lists a review's comments, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID"),
        PageParams
    ),
    responses(
        (status = 200, description = "Paginated comments", body = Page<Comment>),
        (status = 404, description = "Unknown title or review")
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Page<Comment>>> {
    require_parent_chain(&state, title_id, review_id).await?;
    let (comments, count) = state
        .repo
        .list_comments(review_id, page.limit(), page.offset())
        .await?;
    Ok(Json(Page::build(uri.path(), &page, count, comments)?))
}

/// create_comment
///
/// [Authenticated Route] Posts a comment under a review. Unlike reviews there
/// is no per-author limit.
#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment posted", body = Comment),
        (status = 404, description = "Unknown title or review")
    )
)]
pub async fn create_comment(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    require_parent_chain(&state, title_id, review_id).await?;
    payload.validate()?;

    let comment = state
        .repo
        .create_comment(review_id, author_id, payload.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// get_comment
///
/// [Public Route] Retrieves one comment through its full parent chain.
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Comment", body = Comment),
        (status = 404, description = "Unknown title, review or comment")
    )
)]
pub async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> ApiResult<Json<Comment>> {
    require_parent_chain(&state, title_id, review_id).await?;
    let comment = state
        .repo
        .get_comment(review_id, comment_id)
        .await?
        .ok_or_not_found("Comment")?;
    Ok(Json(comment))
}

/// update_comment
///
/// [Authenticated Route] Edits a comment's text.
///
/// *Authorization*: author, moderator or admin, same as reviews.
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated comment", body = Comment),
        (status = 403, description = "Not the author or staff"),
        (status = 404, description = "Unknown title, review or comment")
    )
)]
pub async fn update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    Json(payload): Json<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    require_parent_chain(&state, title_id, review_id).await?;
    let author = state
        .repo
        .get_comment_author(review_id, comment_id)
        .await?
        .ok_or_not_found("Comment")?;
    permissions::require_author_or_staff(&user, author.author_id)?;

    payload.validate()?;
    let updated = state
        .repo
        .update_comment(review_id, comment_id, payload.text)
        .await?
        .ok_or_not_found("Comment")?;
    Ok(Json(updated))
}

/// delete_comment
///
/// [Authenticated Route] Removes a comment. Same authorization tiers as
/// editing.
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author or staff"),
        (status = 404, description = "Unknown title, review or comment")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> ApiResult<StatusCode> {
    require_parent_chain(&state, title_id, review_id).await?;
    let author = state
        .repo
        .get_comment_author(review_id, comment_id)
        .await?
        .ok_or_not_found("Comment")?;
    permissions::require_author_or_staff(&user, author.author_id)?;

    if state.repo.delete_comment(review_id, comment_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Comment"))
    }
}
