use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool};

/// Opens the SQLite pool, creating the database file when missing.
///
/// Foreign keys must be switched on per connection; the cascade deletes
/// (title → reviews → comments) and the category SET NULL behavior depend
/// on them, so that pragma is not best-effort.
pub async fn connect_pool(db_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        Sqlite::create_database(db_url).await?;
    }
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys=ON;")
                    .execute(&mut *conn)
                    .await?;
                let _ = sqlx::query("PRAGMA busy_timeout=10000;")
                    .execute(&mut *conn)
                    .await;
                Ok(())
            })
        })
        .connect(db_url)
        .await
}

/// Creates the schema. Runs at every startup and in every test; all
/// statements are idempotent.
pub async fn init_db(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Durability/performance pragmas (harmless for in-memory databases).
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("failed to set synchronous mode: {}", e);
    }

    // users table
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            first_name TEXT NULL,
            last_name TEXT NULL,
            bio TEXT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            confirmation_code_hash TEXT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    // categories table
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE
        )"#,
    )
    .execute(pool)
    .await?;

    // genres table
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS genres (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE
        )"#,
    )
    .execute(pool)
    .await?;

    // titles table; a deleted category detaches its titles instead of
    // removing them
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS titles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            year INTEGER NOT NULL,
            description TEXT NULL,
            category_id INTEGER NULL,
            FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
        )"#,
    )
    .execute(pool)
    .await?;

    // title_genres join table
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS title_genres (
            title_id INTEGER NOT NULL,
            genre_id INTEGER NOT NULL,
            PRIMARY KEY (title_id, genre_id),
            FOREIGN KEY(title_id) REFERENCES titles(id) ON DELETE CASCADE,
            FOREIGN KEY(genre_id) REFERENCES genres(id) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    // reviews table; one review per (title, author)
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            text TEXT NOT NULL,
            score INTEGER NOT NULL CHECK (score BETWEEN 1 AND 10),
            pub_date TEXT NOT NULL,
            UNIQUE (title_id, author_id),
            FOREIGN KEY(title_id) REFERENCES titles(id) ON DELETE CASCADE,
            FOREIGN KEY(author_id) REFERENCES users(id) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    // comments table
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            review_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            text TEXT NOT NULL,
            pub_date TEXT NOT NULL,
            FOREIGN KEY(review_id) REFERENCES reviews(id) ON DELETE CASCADE,
            FOREIGN KEY(author_id) REFERENCES users(id) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_titles_category", "CREATE INDEX IF NOT EXISTS idx_titles_category ON titles(category_id)"),
        ("idx_titles_name", "CREATE INDEX IF NOT EXISTS idx_titles_name ON titles(name)"),
        ("idx_title_genres_genre", "CREATE INDEX IF NOT EXISTS idx_title_genres_genre ON title_genres(genre_id)"),
        ("idx_reviews_title", "CREATE INDEX IF NOT EXISTS idx_reviews_title ON reviews(title_id)"),
        ("idx_comments_review", "CREATE INDEX IF NOT EXISTS idx_comments_review ON comments(review_id)"),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            tracing::warn!("failed to create index {}: {}", name, e);
        }
    }

    Ok(())
}
