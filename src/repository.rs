use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqlitePool, query_builder::QueryBuilder};

use crate::models::{
    Category, Comment, ContentAuthor, CreateCategoryRequest, CreateGenreRequest,
    CreateUserRequest, Genre, Review, Role, Title, TitleChanges, TitleFilter, TitleGenreRow,
    TitleRow, UpdateUserRequest, User,
};

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (SQLite, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable and usable across Axum's asynchronous
/// task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users & Auth ---
    // Paginated listing with username substring search; returns the window plus
    // the total match count.
    async fn list_users(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), sqlx::Error>;
    async fn create_user(&self, req: CreateUserRequest, role: Role) -> Result<User, sqlx::Error>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    // Partial update keyed by the current username. Uses COALESCE semantics.
    async fn update_user(
        &self,
        username: &str,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, sqlx::Error>;
    async fn delete_user(&self, username: &str) -> Result<bool, sqlx::Error>;
    // Stores the SHA-256 digest of the latest confirmation code.
    async fn set_confirmation_code(&self, user_id: i64, code_hash: String)
    -> Result<(), sqlx::Error>;
    async fn get_confirmation_hash(&self, user_id: i64) -> Result<Option<String>, sqlx::Error>;

    // --- Categories ---
    async fn list_categories(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Category>, i64), sqlx::Error>;
    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, sqlx::Error>;
    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, sqlx::Error>;
    async fn delete_category(&self, slug: &str) -> Result<bool, sqlx::Error>;

    // --- Genres ---
    async fn list_genres(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Genre>, i64), sqlx::Error>;
    async fn create_genre(&self, req: CreateGenreRequest) -> Result<Genre, sqlx::Error>;
    async fn get_genre_by_slug(&self, slug: &str) -> Result<Option<Genre>, sqlx::Error>;
    // Resolves a batch of slugs in one round trip; unknown slugs are simply
    // absent from the result, the caller picks out the missing ones.
    async fn get_genres_by_slugs(&self, slugs: Vec<String>) -> Result<Vec<Genre>, sqlx::Error>;
    async fn delete_genre(&self, slug: &str) -> Result<bool, sqlx::Error>;

    // --- Titles ---
    // Filtered listing; every returned Title carries its rating, category and
    // genre list.
    async fn list_titles(
        &self,
        filter: TitleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Title>, i64), sqlx::Error>;
    async fn create_title(
        &self,
        name: String,
        year: i32,
        description: Option<String>,
        category_id: i64,
        genre_ids: Vec<i64>,
    ) -> Result<Title, sqlx::Error>;
    async fn get_title(&self, id: i64) -> Result<Option<Title>, sqlx::Error>;
    async fn title_exists(&self, id: i64) -> Result<bool, sqlx::Error>;
    async fn update_title(
        &self,
        id: i64,
        changes: TitleChanges,
    ) -> Result<Option<Title>, sqlx::Error>;
    async fn delete_title(&self, id: i64) -> Result<bool, sqlx::Error>;

    // --- Reviews ---
    async fn list_reviews(
        &self,
        title_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Review>, i64), sqlx::Error>;
    async fn create_review(
        &self,
        title_id: i64,
        author_id: i64,
        text: String,
        score: i32,
    ) -> Result<Review, sqlx::Error>;
    // All review lookups are scoped by title_id: a review fetched through the
    // wrong title must come back as None.
    async fn get_review(&self, title_id: i64, review_id: i64)
    -> Result<Option<Review>, sqlx::Error>;
    async fn get_review_author(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<ContentAuthor>, sqlx::Error>;
    async fn review_exists(&self, title_id: i64, review_id: i64) -> Result<bool, sqlx::Error>;
    // One review per (title, author); the handler pre-checks with this.
    async fn user_has_review(&self, title_id: i64, author_id: i64) -> Result<bool, sqlx::Error>;
    async fn update_review(
        &self,
        title_id: i64,
        review_id: i64,
        text: Option<String>,
        score: Option<i32>,
    ) -> Result<Option<Review>, sqlx::Error>;
    async fn delete_review(&self, title_id: i64, review_id: i64) -> Result<bool, sqlx::Error>;

    // --- Comments ---
    async fn list_comments(
        &self,
        review_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Comment>, i64), sqlx::Error>;
    async fn create_comment(
        &self,
        review_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Comment, sqlx::Error>;
    async fn get_comment(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, sqlx::Error>;
    async fn get_comment_author(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<ContentAuthor>, sqlx::Error>;
    async fn update_comment(
        &self,
        review_id: i64,
        comment_id: i64,
        text: Option<String>,
    ) -> Result<Option<Comment>, sqlx::Error>;
    async fn delete_comment(&self, review_id: i64, comment_id: i64) -> Result<bool, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// SqliteRepository
///
/// The concrete implementation of the `Repository` trait, backed by the SQLite database.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// attach_genres
    ///
    /// Folds the genre lists into a page of title rows with a single IN query,
    /// then assembles the wire `Title` structs.
    async fn attach_genres(&self, rows: Vec<TitleRow>) -> Result<Vec<Title>, sqlx::Error> {
        let mut by_title: HashMap<i64, Vec<Genre>> = HashMap::new();

        if !rows.is_empty() {
            let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                r#"SELECT tg.title_id AS title_id, g.id AS id, g.name AS name, g.slug AS slug
                   FROM title_genres tg
                   JOIN genres g ON g.id = tg.genre_id
                   WHERE tg.title_id IN ("#,
            );
            {
                let mut separated = builder.separated(", ");
                for row in &rows {
                    separated.push_bind(row.id);
                }
                separated.push_unseparated(") ORDER BY g.slug ASC");
            }

            let genre_rows: Vec<TitleGenreRow> =
                builder.build_query_as().fetch_all(&self.pool).await?;
            for row in genre_rows {
                by_title.entry(row.title_id).or_default().push(Genre {
                    id: row.id,
                    name: row.name,
                    slug: row.slug,
                });
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| Title {
                genre: by_title.remove(&row.id).unwrap_or_default(),
                category: match (row.category_id, row.category_name, row.category_slug) {
                    (Some(id), Some(name), Some(slug)) => Some(Category { id, name, slug }),
                    _ => None,
                },
                id: row.id,
                name: row.name,
                year: row.year,
                rating: row.rating,
                description: row.description,
            })
            .collect())
    }
}

/// push_title_filters
///
/// Appends the WHERE clause for the titles listing to both the page query and
/// the count query, with safe parameterization throughout.
fn push_title_filters(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, filter: &TitleFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(category) = &filter.category {
        builder.push(" AND c.slug = ").push_bind(category.clone());
    }
    if let Some(genre) = &filter.genre {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM title_genres tg \
                 JOIN genres g ON g.id = tg.genre_id \
                 WHERE tg.title_id = t.id AND g.slug = ",
            )
            .push_bind(genre.clone())
            .push(")");
    }
    if let Some(name) = &filter.name {
        builder.push(" AND t.name LIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(year) = filter.year {
        builder.push(" AND t.year = ").push_bind(year);
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    // --- USERS ---

    /// list_users
    ///
    /// Implements search using QueryBuilder for safe parameterization. The same
    /// filter feeds the COUNT query so the pagination envelope stays honest.
    async fn list_users(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
            "SELECT id, username, email, first_name, last_name, bio, role FROM users",
        );
        if let Some(s) = &search {
            builder.push(" WHERE username LIKE ").push_bind(format!("%{s}%"));
        }
        builder
            .push(" ORDER BY username ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let users = builder.build_query_as::<User>().fetch_all(&self.pool).await?;

        let mut count_builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM users");
        if let Some(s) = &search {
            count_builder.push(" WHERE username LIKE ").push_bind(format!("%{s}%"));
        }
        let count: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((users, count))
    }

    /// create_user
    ///
    /// Inserts a new account. Uniqueness of username and email is backed by the
    /// database constraints; the handlers pre-check to produce field errors.
    async fn create_user(&self, req: CreateUserRequest, role: Role) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, email, first_name, last_name, bio, role)
               VALUES (?, ?, ?, ?, ?, ?)
               RETURNING id, username, email, first_name, last_name, bio, role"#,
        )
        .bind(req.username)
        .bind(req.email)
        .bind(req.first_name)
        .bind(req.last_name)
        .bind(req.bio)
        .bind(role)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, first_name, last_name, bio, role FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, first_name, last_name, bio, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, first_name, last_name, bio, role FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// update_user
    ///
    /// Uses COALESCE to efficiently handle `Option<T>` fields, only updating a
    /// column if the corresponding field in `req` is `Some`. Returns the fresh
    /// row, or None when no user matched.
    async fn update_user(
        &self,
        username: &str,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET username = COALESCE(?, username),
                   email = COALESCE(?, email),
                   first_name = COALESCE(?, first_name),
                   last_name = COALESCE(?, last_name),
                   bio = COALESCE(?, bio),
                   role = COALESCE(?, role)
               WHERE username = ?
               RETURNING id, username, email, first_name, last_name, bio, role"#,
        )
        .bind(req.username)
        .bind(req.email)
        .bind(req.first_name)
        .bind(req.last_name)
        .bind(req.bio)
        .bind(req.role)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_user(&self, username: &str) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_confirmation_code(
        &self,
        user_id: i64,
        code_hash: String,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET confirmation_code_hash = ? WHERE id = ?")
            .bind(code_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_confirmation_hash(&self, user_id: i64) -> Result<Option<String>, sqlx::Error> {
        let hash: Option<Option<String>> =
            sqlx::query_scalar("SELECT confirmation_code_hash FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(hash.flatten())
    }

    // --- CATEGORIES ---

    /// list_categories
    ///
    /// Search matches the display name; ordering is by slug so pages are stable.
    async fn list_categories(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Category>, i64), sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT id, name, slug FROM categories");
        if let Some(s) = &search {
            builder.push(" WHERE name LIKE ").push_bind(format!("%{s}%"));
        }
        builder
            .push(" ORDER BY slug ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let categories = builder
            .build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM categories");
        if let Some(s) = &search {
            count_builder.push(" WHERE name LIKE ").push_bind(format!("%{s}%"));
        }
        let count: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((categories, count))
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug) VALUES (?, ?) RETURNING id, name, slug",
        )
        .bind(req.name)
        .bind(req.slug)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    /// delete_category
    ///
    /// Titles referencing the category survive with `category_id` nulled by the
    /// foreign key's SET NULL action.
    async fn delete_category(&self, slug: &str) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM categories WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- GENRES ---

    async fn list_genres(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Genre>, i64), sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT id, name, slug FROM genres");
        if let Some(s) = &search {
            builder.push(" WHERE name LIKE ").push_bind(format!("%{s}%"));
        }
        builder
            .push(" ORDER BY slug ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let genres = builder.build_query_as::<Genre>().fetch_all(&self.pool).await?;

        let mut count_builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM genres");
        if let Some(s) = &search {
            count_builder.push(" WHERE name LIKE ").push_bind(format!("%{s}%"));
        }
        let count: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((genres, count))
    }

    async fn create_genre(&self, req: CreateGenreRequest) -> Result<Genre, sqlx::Error> {
        sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name, slug) VALUES (?, ?) RETURNING id, name, slug",
        )
        .bind(req.name)
        .bind(req.slug)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_genre_by_slug(&self, slug: &str) -> Result<Option<Genre>, sqlx::Error> {
        sqlx::query_as::<_, Genre>("SELECT id, name, slug FROM genres WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    /// get_genres_by_slugs
    ///
    /// Batch slug resolution for title create/update. Unknown slugs are absent
    /// from the result; the caller reports the first missing one.
    async fn get_genres_by_slugs(&self, slugs: Vec<String>) -> Result<Vec<Genre>, sqlx::Error> {
        if slugs.is_empty() {
            return Ok(vec![]);
        }
        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT id, name, slug FROM genres WHERE slug IN (");
        {
            let mut separated = builder.separated(", ");
            for slug in &slugs {
                separated.push_bind(slug.clone());
            }
            separated.push_unseparated(") ORDER BY slug ASC");
        }
        builder.build_query_as::<Genre>().fetch_all(&self.pool).await
    }

    async fn delete_genre(&self, slug: &str) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM genres WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- TITLES ---

    /// list_titles
    ///
    /// The rating is computed inline as a rounded AVG subquery, so a fresh
    /// review is visible on the very next read. Genres are folded in with one
    /// follow-up query for the whole page.
    async fn list_titles(
        &self,
        filter: TitleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Title>, i64), sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
            r#"SELECT t.id, t.name, t.year, t.description,
                      c.id AS category_id, c.name AS category_name, c.slug AS category_slug,
                      (SELECT CAST(ROUND(AVG(r.score)) AS INTEGER)
                       FROM reviews r WHERE r.title_id = t.id) AS rating
               FROM titles t
               LEFT JOIN categories c ON c.id = t.category_id"#,
        );
        push_title_filters(&mut builder, &filter);
        builder
            .push(" ORDER BY t.name ASC, t.id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = builder
            .build_query_as::<TitleRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
            "SELECT COUNT(*) FROM titles t LEFT JOIN categories c ON c.id = t.category_id",
        );
        push_title_filters(&mut count_builder, &filter);
        let count: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let titles = self.attach_genres(rows).await?;
        Ok((titles, count))
    }

    /// create_title
    ///
    /// Inserts the title and its genre links in one transaction, then re-reads
    /// through `get_title` so the response carries the assembled representation.
    async fn create_title(
        &self,
        name: String,
        year: i32,
        description: Option<String>,
        category_id: i64,
        genre_ids: Vec<i64>,
    ) -> Result<Title, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let title_id: i64 = sqlx::query_scalar(
            "INSERT INTO titles (name, year, description, category_id) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(name)
        .bind(year)
        .bind(description)
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await?;

        for genre_id in genre_ids {
            sqlx::query(
                "INSERT INTO title_genres (title_id, genre_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
            )
            .bind(title_id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.get_title(title_id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    async fn get_title(&self, id: i64) -> Result<Option<Title>, sqlx::Error> {
        let row = sqlx::query_as::<_, TitleRow>(
            r#"SELECT t.id, t.name, t.year, t.description,
                      c.id AS category_id, c.name AS category_name, c.slug AS category_slug,
                      (SELECT CAST(ROUND(AVG(r.score)) AS INTEGER)
                       FROM reviews r WHERE r.title_id = t.id) AS rating
               FROM titles t
               LEFT JOIN categories c ON c.id = t.category_id
               WHERE t.id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_genres(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn title_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM titles WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    /// update_title
    ///
    /// COALESCE partial update; when `genre_ids` is present the link rows are
    /// replaced wholesale inside the same transaction.
    async fn update_title(
        &self,
        id: i64,
        changes: TitleChanges,
    ) -> Result<Option<Title>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let res = sqlx::query(
            r#"UPDATE titles
               SET name = COALESCE(?, name),
                   year = COALESCE(?, year),
                   description = COALESCE(?, description),
                   category_id = COALESCE(?, category_id)
               WHERE id = ?"#,
        )
        .bind(changes.name)
        .bind(changes.year)
        .bind(changes.description)
        .bind(changes.category_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if res.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(genre_ids) = changes.genre_ids {
            sqlx::query("DELETE FROM title_genres WHERE title_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for genre_id in genre_ids {
                sqlx::query(
                    "INSERT INTO title_genres (title_id, genre_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
                )
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;

        self.get_title(id).await
    }

    /// delete_title
    ///
    /// Cascades to reviews and their comments through the foreign keys.
    async fn delete_title(&self, id: i64) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM titles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- REVIEWS ---

    /// list_reviews
    ///
    /// Oldest first, with the id as tie-breaker for same-second inserts.
    async fn list_reviews(
        &self,
        title_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Review>, i64), sqlx::Error> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"SELECT r.id, r.text, u.username AS author, r.score, r.pub_date
               FROM reviews r
               JOIN users u ON u.id = r.author_id
               WHERE r.title_id = ?
               ORDER BY r.pub_date ASC, r.id ASC
               LIMIT ? OFFSET ?"#,
        )
        .bind(title_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = ?")
            .bind(title_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((reviews, count))
    }

    async fn create_review(
        &self,
        title_id: i64,
        author_id: i64,
        text: String,
        score: i32,
    ) -> Result<Review, sqlx::Error> {
        let review_id: i64 = sqlx::query_scalar(
            "INSERT INTO reviews (title_id, author_id, text, score, pub_date) VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(title_id)
        .bind(author_id)
        .bind(text)
        .bind(score)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        self.get_review(title_id, review_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    async fn get_review(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"SELECT r.id, r.text, u.username AS author, r.score, r.pub_date
               FROM reviews r
               JOIN users u ON u.id = r.author_id
               WHERE r.id = ? AND r.title_id = ?"#,
        )
        .bind(review_id)
        .bind(title_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_review_author(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<ContentAuthor>, sqlx::Error> {
        sqlx::query_as::<_, ContentAuthor>(
            "SELECT id, author_id FROM reviews WHERE id = ? AND title_id = ?",
        )
        .bind(review_id)
        .bind(title_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn review_exists(&self, title_id: i64, review_id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reviews WHERE id = ? AND title_id = ?)")
            .bind(review_id)
            .bind(title_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn user_has_review(&self, title_id: i64, author_id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE title_id = ? AND author_id = ?)",
        )
        .bind(title_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_review(
        &self,
        title_id: i64,
        review_id: i64,
        text: Option<String>,
        score: Option<i32>,
    ) -> Result<Option<Review>, sqlx::Error> {
        let res = sqlx::query(
            r#"UPDATE reviews
               SET text = COALESCE(?, text),
                   score = COALESCE(?, score)
               WHERE id = ? AND title_id = ?"#,
        )
        .bind(text)
        .bind(score)
        .bind(review_id)
        .bind(title_id)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_review(title_id, review_id).await
    }

    async fn delete_review(&self, title_id: i64, review_id: i64) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM reviews WHERE id = ? AND title_id = ?")
            .bind(review_id)
            .bind(title_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- COMMENTS ---

    async fn list_comments(
        &self,
        review_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Comment>, i64), sqlx::Error> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"SELECT c.id, c.text, u.username AS author, c.pub_date
               FROM comments c
               JOIN users u ON u.id = c.author_id
               WHERE c.review_id = ?
               ORDER BY c.pub_date ASC, c.id ASC
               LIMIT ? OFFSET ?"#,
        )
        .bind(review_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = ?")
            .bind(review_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((comments, count))
    }

    async fn create_comment(
        &self,
        review_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Comment, sqlx::Error> {
        let comment_id: i64 = sqlx::query_scalar(
            "INSERT INTO comments (review_id, author_id, text, pub_date) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(review_id)
        .bind(author_id)
        .bind(text)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        self.get_comment(review_id, comment_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    async fn get_comment(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"SELECT c.id, c.text, u.username AS author, c.pub_date
               FROM comments c
               JOIN users u ON u.id = c.author_id
               WHERE c.id = ? AND c.review_id = ?"#,
        )
        .bind(comment_id)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_comment_author(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<ContentAuthor>, sqlx::Error> {
        sqlx::query_as::<_, ContentAuthor>(
            "SELECT id, author_id FROM comments WHERE id = ? AND review_id = ?",
        )
        .bind(comment_id)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_comment(
        &self,
        review_id: i64,
        comment_id: i64,
        text: Option<String>,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let res = sqlx::query("UPDATE comments SET text = COALESCE(?, text) WHERE id = ? AND review_id = ?")
            .bind(text)
            .bind(comment_id)
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_comment(review_id, comment_id).await
    }

    async fn delete_comment(&self, review_id: i64, comment_id: i64) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM comments WHERE id = ? AND review_id = ?")
            .bind(comment_id)
            .bind(review_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
