use std::collections::HashSet;

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
        CreateTitleRequest, Page, PageParams, Title, TitleChanges, TitleFilter, UpdateTitleRequest,
    },
    permissions, validators,
};

// --- Slug Resolution ---

/// Maps a category slug from the payload to its id, or a field-level 400.
async fn resolve_category(state: &AppState, slug: &str) -> Result<i64, ApiError> {
    match state.repo.get_category_by_slug(slug).await? {
        Some(category) => Ok(category.id),
        None => Err(ApiError::field(
            "category",
            format!("Object with slug={slug} does not exist."),
        )),
    }
}

/// Maps genre slugs to ids in one query; the first unknown slug fails the
/// whole request.
async fn resolve_genres(state: &AppState, slugs: &[String]) -> Result<Vec<i64>, ApiError> {
    let genres = state.repo.get_genres_by_slugs(slugs.to_vec()).await?;
    let found: HashSet<&str> = genres.iter().map(|g| g.slug.as_str()).collect();
    if let Some(missing) = slugs.iter().find(|slug| !found.contains(slug.as_str())) {
        return Err(ApiError::field(
            "genre",
            format!("Object with slug={missing} does not exist."),
        ));
    }
    Ok(genres.into_iter().map(|g| g.id).collect())
}

// --- Handlers ---

/// list_titles
///
/// [Public Route] Lists titles with their computed ratings. The filters
/// combine with AND: category slug, genre slug, name substring, exact year.
#[utoipa::path(
    get,
    path = "/api/v1/titles",
    params(PageParams, TitleFilter),
    responses((status = 200, description = "Paginated titles", body = Page<Title>))
)]
pub async fn list_titles(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(page): Query<PageParams>,
    Query(filter): Query<TitleFilter>,
) -> ApiResult<Json<Page<Title>>> {
    let (titles, count) = state
        .repo
        .list_titles(filter, page.limit(), page.offset())
        .await?;
    Ok(Json(Page::build(uri.path(), &page, count, titles)?))
}

/// create_title
///
/// [Admin Route] Adds a title. `category` and `genre` are slugs referencing
/// existing records; unknown slugs are field-level 400s, and a release year in
/// the future is rejected.
#[utoipa::path(
    post,
    path = "/api/v1/titles",
    request_body = CreateTitleRequest,
    responses(
        (status = 201, description = "Title created", body = Title),
        (status = 400, description = "Validation failed or unknown slug")
    )
)]
pub async fn create_title(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTitleRequest>,
) -> ApiResult<(StatusCode, Json<Title>)> {
    permissions::require_admin(&user)?;
    payload.validate()?;
    validators::validate_year(payload.year)?;

    let category_id = resolve_category(&state, &payload.category).await?;
    let genre_ids = resolve_genres(&state, &payload.genre).await?;

    let created = state
        .repo
        .create_title(
            payload.name,
            payload.year,
            payload.description,
            category_id,
            genre_ids,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// get_title
///
/// [Public Route] Retrieves one title with its rating, category and genres.
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}",
    params(("title_id" = i64, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Title", body = Title),
        (status = 404, description = "Unknown title")
    )
)]
pub async fn get_title(
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
) -> ApiResult<Json<Title>> {
    let title = state.repo.get_title(title_id).await?.ok_or_not_found("Title")?;
    Ok(Json(title))
}

/// update_title
///
/// [Admin Route] Partially updates a title. A `genre` list in the payload
/// replaces the previous genre set wholesale.
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}",
    params(("title_id" = i64, Path, description = "Title ID")),
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Updated title", body = Title),
        (status = 404, description = "Unknown title")
    )
)]
pub async fn update_title(
    user: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
    Json(payload): Json<UpdateTitleRequest>,
) -> ApiResult<Json<Title>> {
    permissions::require_admin(&user)?;
    if !state.repo.title_exists(title_id).await? {
        return Err(ApiError::not_found("Title"));
    }

    payload.validate()?;
    if let Some(year) = payload.year {
        validators::validate_year(year)?;
    }
    let category_id = match &payload.category {
        Some(slug) => Some(resolve_category(&state, slug).await?),
        None => None,
    };
    let genre_ids = match &payload.genre {
        Some(slugs) => Some(resolve_genres(&state, slugs).await?),
        None => None,
    };

    let changes = TitleChanges {
        name: payload.name,
        year: payload.year,
        description: payload.description,
        category_id,
        genre_ids,
    };
    let updated = state
        .repo
        .update_title(title_id, changes)
        .await?
        .ok_or_not_found("Title")?;
    Ok(Json(updated))
}

/// delete_title
///
/// [Admin Route] Removes a title; its reviews and their comments cascade away.
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}",
    params(("title_id" = i64, Path, description = "Title ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown title")
    )
)]
pub async fn delete_title(
    user: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
) -> ApiResult<StatusCode> {
    permissions::require_admin(&user)?;
    if state.repo.delete_title(title_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Title"))
    }
}
