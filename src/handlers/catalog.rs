use axum::{
    Json,
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::{
        Category, CreateCategoryRequest, CreateGenreRequest, Genre, Page, PageParams, SearchParams,
    },
    permissions, validators,
};

// Categories and genres are the two halves of the catalogue taxonomy. They
// share a shape and a rule set, so their handlers live together.

/// list_categories
///
/// [Public Route] Lists categories ordered by slug, with an optional name
/// substring search.
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(PageParams, SearchParams),
    responses((status = 200, description = "Paginated categories", body = Page<Category>))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(page): Query<PageParams>,
    Query(search): Query<SearchParams>,
) -> ApiResult<Json<Page<Category>>> {
    let (categories, count) = state
        .repo
        .list_categories(search.search, page.limit(), page.offset())
        .await?;
    Ok(Json(Page::build(uri.path(), &page, count, categories)?))
}

/// create_category
///
/// [Admin Route] Adds a category. The slug doubles as the URL identifier and
/// must be unique.
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Validation failed or slug taken")
    )
)]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    permissions::require_admin(&user)?;
    payload.validate()?;
    validators::validate_slug(&payload.slug)?;

    if state
        .repo
        .get_category_by_slug(&payload.slug)
        .await?
        .is_some()
    {
        return Err(ApiError::field(
            "slug",
            "category with this slug already exists.",
        ));
    }

    let created = state.repo.create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// delete_category
///
/// [Admin Route] Removes a category by slug. Titles that referenced it keep
/// existing with no category.
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown slug")
    )
)]
pub async fn delete_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    permissions::require_admin(&user)?;
    if state.repo.delete_category(&slug).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Category"))
    }
}

/// list_genres
///
/// [Public Route] Lists genres ordered by slug, with an optional name
/// substring search.
#[utoipa::path(
    get,
    path = "/api/v1/genres",
    params(PageParams, SearchParams),
    responses((status = 200, description = "Paginated genres", body = Page<Genre>))
)]
pub async fn list_genres(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(page): Query<PageParams>,
    Query(search): Query<SearchParams>,
) -> ApiResult<Json<Page<Genre>>> {
    let (genres, count) = state
        .repo
        .list_genres(search.search, page.limit(), page.offset())
        .await?;
    Ok(Json(Page::build(uri.path(), &page, count, genres)?))
}

/// create_genre
///
/// [Admin Route] Adds a genre.
#[utoipa::path(
    post,
    path = "/api/v1/genres",
    request_body = CreateGenreRequest,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Validation failed or slug taken")
    )
)]
pub async fn create_genre(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateGenreRequest>,
) -> ApiResult<(StatusCode, Json<Genre>)> {
    permissions::require_admin(&user)?;
    payload.validate()?;
    validators::validate_slug(&payload.slug)?;

    if state.repo.get_genre_by_slug(&payload.slug).await?.is_some() {
        return Err(ApiError::field(
            "slug",
            "genre with this slug already exists.",
        ));
    }

    let created = state.repo.create_genre(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// delete_genre
///
/// [Admin Route] Removes a genre by slug and its links to titles. The titles
/// themselves stay.
#[utoipa::path(
    delete,
    path = "/api/v1/genres/{slug}",
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown slug")
    )
)]
pub async fn delete_genre(
    user: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    permissions::require_admin(&user)?;
    if state.repo.delete_genre(&slug).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Genre"))
    }
}
