use reviewdb::{
    db,
    models::{
        CreateCategoryRequest, CreateGenreRequest, CreateUserRequest, Role, TitleChanges,
        TitleFilter, UpdateUserRequest, User,
    },
    repository::{Repository, SqliteRepository},
};
use sqlx::SqlitePool;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: SqlitePool,
}

impl DbTestContext {
    /// Opens a fresh in-memory database with the full schema applied. A single
    /// connection keeps every query on the same database instance.
    async fn setup() -> Self {
        let pool = db::connect_pool("sqlite::memory:", 1)
            .await
            .expect("Failed to open in-memory SQLite");
        db::init_db(&pool).await.expect("Failed to apply schema");
        Self { pool }
    }

    fn repository(&self) -> SqliteRepository {
        SqliteRepository::new(self.pool.clone())
    }
}

async fn create_test_user(repo: &SqliteRepository, username: &str, role: Role) -> User {
    repo.create_user(
        CreateUserRequest {
            username: username.to_string(),
            email: format!("{username}@test.com"),
            ..Default::default()
        },
        role,
    )
    .await
    .expect("Failed to create test user")
}

async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}

// --- Users ---

#[tokio::test]
async fn test_user_crud_and_search() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    create_test_user(&repo, "alpha", Role::User).await;
    create_test_user(&repo, "beta", Role::Moderator).await;
    create_test_user(&repo, "gamma", Role::Admin).await;

    let (all, count) = repo.list_users(None, 10, 0).await.unwrap();
    assert_eq!(count, 3);
    // Ordered by username
    assert_eq!(all[0].username, "alpha");
    assert_eq!(all[2].username, "gamma");

    let (hits, hit_count) = repo.list_users(Some("et".to_string()), 10, 0).await.unwrap();
    assert_eq!(hit_count, 1);
    assert_eq!(hits[0].username, "beta");
    assert_eq!(hits[0].role, Role::Moderator);

    // Partial update leaves untouched columns alone
    let updated = repo
        .update_user(
            "alpha",
            UpdateUserRequest {
                bio: Some("Hi.".to_string()),
                role: Some(Role::Moderator),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("alpha exists");
    assert_eq!(updated.bio.as_deref(), Some("Hi."));
    assert_eq!(updated.role, Role::Moderator);
    assert_eq!(updated.email, "alpha@test.com");

    assert!(repo.delete_user("alpha").await.unwrap());
    assert!(!repo.delete_user("alpha").await.unwrap());
    assert!(repo.get_user_by_username("alpha").await.unwrap().is_none());
}

#[tokio::test]
async fn test_user_rename_keeps_id() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let original = create_test_user(&repo, "beta", Role::User).await;
    let renamed = repo
        .update_user(
            "beta",
            UpdateUserRequest {
                username: Some("betty".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("beta exists");

    assert_eq!(renamed.id, original.id);
    assert!(repo.get_user_by_username("beta").await.unwrap().is_none());
    assert!(repo.get_user_by_username("betty").await.unwrap().is_some());
}

#[tokio::test]
async fn test_confirmation_hash_set_and_replace() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = create_test_user(&repo, "signup", Role::User).await;

    assert!(repo.get_confirmation_hash(user.id).await.unwrap().is_none());

    repo.set_confirmation_code(user.id, "digest-1".to_string())
        .await
        .unwrap();
    assert_eq!(
        repo.get_confirmation_hash(user.id).await.unwrap().as_deref(),
        Some("digest-1")
    );

    // Re-signup replaces the stored digest
    repo.set_confirmation_code(user.id, "digest-2".to_string())
        .await
        .unwrap();
    assert_eq!(
        repo.get_confirmation_hash(user.id).await.unwrap().as_deref(),
        Some("digest-2")
    );
}

// --- Categories & Genres ---

#[tokio::test]
async fn test_category_crud_ordering_and_search() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    for (name, slug) in [("Films", "films"), ("Books", "books"), ("Music", "music")] {
        repo.create_category(CreateCategoryRequest {
            name: name.to_string(),
            slug: slug.to_string(),
        })
        .await
        .unwrap();
    }

    let (all, count) = repo.list_categories(None, 10, 0).await.unwrap();
    assert_eq!(count, 3);
    // Ordered by slug
    let slugs: Vec<&str> = all.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(slugs, vec!["books", "films", "music"]);

    let (hits, hit_count) = repo
        .list_categories(Some("ilm".to_string()), 10, 0)
        .await
        .unwrap();
    assert_eq!(hit_count, 1);
    assert_eq!(hits[0].name, "Films");

    let fetched = repo.get_category_by_slug("books").await.unwrap().unwrap();
    assert_eq!(fetched.name, "Books");

    assert!(repo.delete_category("books").await.unwrap());
    assert!(!repo.delete_category("books").await.unwrap());
    assert!(repo.get_category_by_slug("books").await.unwrap().is_none());
}

#[tokio::test]
async fn test_genre_slug_batch_lookup() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    for (name, slug) in [("Drama", "drama"), ("Comedy", "comedy"), ("Noir", "noir")] {
        repo.create_genre(CreateGenreRequest {
            name: name.to_string(),
            slug: slug.to_string(),
        })
        .await
        .unwrap();
    }

    // Unknown slugs are simply absent from the result
    let found = repo
        .get_genres_by_slugs(vec![
            "drama".to_string(),
            "noir".to_string(),
            "western".to_string(),
        ])
        .await
        .unwrap();
    assert_eq!(found.len(), 2);

    let empty = repo.get_genres_by_slugs(vec![]).await.unwrap();
    assert!(empty.is_empty());
}

// --- Titles ---

#[tokio::test]
async fn test_title_carries_category_and_sorted_genres() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let films = repo
        .create_category(CreateCategoryRequest {
            name: "Films".to_string(),
            slug: "films".to_string(),
        })
        .await
        .unwrap();
    let noir = repo
        .create_genre(CreateGenreRequest {
            name: "Noir".to_string(),
            slug: "noir".to_string(),
        })
        .await
        .unwrap();
    let drama = repo
        .create_genre(CreateGenreRequest {
            name: "Drama".to_string(),
            slug: "drama".to_string(),
        })
        .await
        .unwrap();

    let title = repo
        .create_title(
            "Heat".to_string(),
            1995,
            Some("Cops and robbers.".to_string()),
            films.id,
            vec![noir.id, drama.id],
        )
        .await
        .unwrap();

    assert_eq!(title.name, "Heat");
    assert_eq!(title.year, 1995);
    assert!(title.rating.is_none());
    assert_eq!(title.category.as_ref().unwrap().slug, "films");
    let genre_slugs: Vec<&str> = title.genre.iter().map(|g| g.slug.as_str()).collect();
    assert_eq!(genre_slugs, vec!["drama", "noir"]);
}

#[tokio::test]
async fn test_rating_rounds_to_nearest_integer() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let films = repo
        .create_category(CreateCategoryRequest {
            name: "Films".to_string(),
            slug: "films".to_string(),
        })
        .await
        .unwrap();
    let alice = create_test_user(&repo, "alice", Role::User).await;
    let bob = create_test_user(&repo, "bob", Role::User).await;

    let first = repo
        .create_title("Heat".to_string(), 1995, None, films.id, vec![])
        .await
        .unwrap();
    repo.create_review(first.id, alice.id, "Tense.".to_string(), 4)
        .await
        .unwrap();
    repo.create_review(first.id, bob.id, "Sharp.".to_string(), 8)
        .await
        .unwrap();
    // (4 + 8) / 2 = 6
    let fetched = repo.get_title(first.id).await.unwrap().unwrap();
    assert_eq!(fetched.rating, Some(6));

    let second = repo
        .create_title("Ronin".to_string(), 1998, None, films.id, vec![])
        .await
        .unwrap();
    repo.create_review(second.id, alice.id, "Fast.".to_string(), 6)
        .await
        .unwrap();
    repo.create_review(second.id, bob.id, "Faster.".to_string(), 7)
        .await
        .unwrap();
    // 6.5 rounds up to 7
    let fetched = repo.get_title(second.id).await.unwrap().unwrap();
    assert_eq!(fetched.rating, Some(7));
}

#[tokio::test]
async fn test_title_filters_combine() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let films = repo
        .create_category(CreateCategoryRequest {
            name: "Films".to_string(),
            slug: "films".to_string(),
        })
        .await
        .unwrap();
    let books = repo
        .create_category(CreateCategoryRequest {
            name: "Books".to_string(),
            slug: "books".to_string(),
        })
        .await
        .unwrap();
    let drama = repo
        .create_genre(CreateGenreRequest {
            name: "Drama".to_string(),
            slug: "drama".to_string(),
        })
        .await
        .unwrap();
    let comedy = repo
        .create_genre(CreateGenreRequest {
            name: "Comedy".to_string(),
            slug: "comedy".to_string(),
        })
        .await
        .unwrap();

    repo.create_title("Alpha Road".to_string(), 2020, None, films.id, vec![drama.id])
        .await
        .unwrap();
    repo.create_title("Beta Lane".to_string(), 2021, None, films.id, vec![comedy.id])
        .await
        .unwrap();
    repo.create_title(
        "Gamma Street".to_string(),
        2020,
        None,
        books.id,
        vec![drama.id, comedy.id],
    )
    .await
    .unwrap();

    let by_category = TitleFilter {
        category: Some("films".to_string()),
        ..Default::default()
    };
    let (titles, count) = repo.list_titles(by_category, 10, 0).await.unwrap();
    assert_eq!(count, 2);
    // Ordered by name
    assert_eq!(titles[0].name, "Alpha Road");
    assert_eq!(titles[1].name, "Beta Lane");

    let by_genre = TitleFilter {
        genre: Some("drama".to_string()),
        ..Default::default()
    };
    let (titles, count) = repo.list_titles(by_genre, 10, 0).await.unwrap();
    assert_eq!(count, 2);
    assert!(titles.iter().any(|t| t.name == "Gamma Street"));

    let by_name = TitleFilter {
        name: Some("Lane".to_string()),
        ..Default::default()
    };
    let (titles, count) = repo.list_titles(by_name, 10, 0).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(titles[0].name, "Beta Lane");

    let by_year = TitleFilter {
        year: Some(2020),
        ..Default::default()
    };
    let (_, count) = repo.list_titles(by_year, 10, 0).await.unwrap();
    assert_eq!(count, 2);

    let combined = TitleFilter {
        category: Some("films".to_string()),
        year: Some(2020),
        ..Default::default()
    };
    let (titles, count) = repo.list_titles(combined, 10, 0).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(titles[0].name, "Alpha Road");

    // Pagination windows still report the full match count
    let by_category = TitleFilter {
        category: Some("films".to_string()),
        ..Default::default()
    };
    let (window, count) = repo.list_titles(by_category, 1, 1).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].name, "Beta Lane");
}

#[tokio::test]
async fn test_title_update_replaces_genre_set() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let films = repo
        .create_category(CreateCategoryRequest {
            name: "Films".to_string(),
            slug: "films".to_string(),
        })
        .await
        .unwrap();
    let books = repo
        .create_category(CreateCategoryRequest {
            name: "Books".to_string(),
            slug: "books".to_string(),
        })
        .await
        .unwrap();
    let drama = repo
        .create_genre(CreateGenreRequest {
            name: "Drama".to_string(),
            slug: "drama".to_string(),
        })
        .await
        .unwrap();
    let comedy = repo
        .create_genre(CreateGenreRequest {
            name: "Comedy".to_string(),
            slug: "comedy".to_string(),
        })
        .await
        .unwrap();

    let title = repo
        .create_title("Heat".to_string(), 1995, None, films.id, vec![drama.id])
        .await
        .unwrap();

    // Name-only change keeps year, category and genres
    let updated = repo
        .update_title(
            title.id,
            TitleChanges {
                name: Some("Heat (Director's Cut)".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("title exists");
    assert_eq!(updated.name, "Heat (Director's Cut)");
    assert_eq!(updated.year, 1995);
    assert_eq!(updated.genre.len(), 1);
    assert_eq!(updated.category.as_ref().unwrap().slug, "films");

    // A provided genre list replaces the whole set
    let updated = repo
        .update_title(
            title.id,
            TitleChanges {
                genre_ids: Some(vec![comedy.id]),
                category_id: Some(books.id),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("title exists");
    assert_eq!(updated.genre.len(), 1);
    assert_eq!(updated.genre[0].slug, "comedy");
    assert_eq!(updated.category.as_ref().unwrap().slug, "books");

    // Unknown id is a miss, not an error
    let missing = repo
        .update_title(
            9999,
            TitleChanges {
                name: Some("Nothing".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(missing.is_none());

    assert!(repo.delete_title(title.id).await.unwrap());
    assert!(!repo.delete_title(title.id).await.unwrap());
}

// --- Reviews ---

#[tokio::test]
async fn test_review_scoping_and_uniqueness() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let films = repo
        .create_category(CreateCategoryRequest {
            name: "Films".to_string(),
            slug: "films".to_string(),
        })
        .await
        .unwrap();
    let heat = repo
        .create_title("Heat".to_string(), 1995, None, films.id, vec![])
        .await
        .unwrap();
    let ronin = repo
        .create_title("Ronin".to_string(), 1998, None, films.id, vec![])
        .await
        .unwrap();
    let alice = create_test_user(&repo, "alice", Role::User).await;

    let review = repo
        .create_review(heat.id, alice.id, "Tense.".to_string(), 8)
        .await
        .unwrap();
    assert_eq!(review.author, "alice");
    assert_eq!(review.score, 8);

    // Lookups are scoped by title
    assert!(repo.get_review(heat.id, review.id).await.unwrap().is_some());
    assert!(repo.get_review(ronin.id, review.id).await.unwrap().is_none());
    assert!(repo.review_exists(heat.id, review.id).await.unwrap());
    assert!(!repo.review_exists(ronin.id, review.id).await.unwrap());

    assert!(repo.user_has_review(heat.id, alice.id).await.unwrap());
    assert!(!repo.user_has_review(ronin.id, alice.id).await.unwrap());

    // The (title, author) unique constraint backstops the handler check
    let err = repo
        .create_review(heat.id, alice.id, "Again.".to_string(), 9)
        .await
        .unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert!(matches!(
                db_err.kind(),
                sqlx::error::ErrorKind::UniqueViolation
            ));
        }
        other => panic!("Expected a unique violation, got {other:?}"),
    }

    // Text-only update keeps the score
    let updated = repo
        .update_review(heat.id, review.id, Some("Tenser.".to_string()), None)
        .await
        .unwrap()
        .expect("review exists");
    assert_eq!(updated.text, "Tenser.");
    assert_eq!(updated.score, 8);

    // Deleting through the wrong title does nothing
    assert!(!repo.delete_review(ronin.id, review.id).await.unwrap());
    assert!(repo.delete_review(heat.id, review.id).await.unwrap());
    assert!(!repo.user_has_review(heat.id, alice.id).await.unwrap());
}

#[tokio::test]
async fn test_review_listing_is_oldest_first() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let films = repo
        .create_category(CreateCategoryRequest {
            name: "Films".to_string(),
            slug: "films".to_string(),
        })
        .await
        .unwrap();
    let heat = repo
        .create_title("Heat".to_string(), 1995, None, films.id, vec![])
        .await
        .unwrap();
    let alice = create_test_user(&repo, "alice", Role::User).await;
    let bob = create_test_user(&repo, "bob", Role::User).await;

    let first = repo
        .create_review(heat.id, alice.id, "First.".to_string(), 5)
        .await
        .unwrap();
    let second = repo
        .create_review(heat.id, bob.id, "Second.".to_string(), 7)
        .await
        .unwrap();

    let (reviews, count) = repo.list_reviews(heat.id, 10, 0).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(reviews[0].id, first.id);
    assert_eq!(reviews[1].id, second.id);

    let author = repo
        .get_review_author(heat.id, first.id)
        .await
        .unwrap()
        .expect("author row exists");
    assert_eq!(author.author_id, alice.id);
}

// --- Comments ---

#[tokio::test]
async fn test_comment_crud_scoped_by_review() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let films = repo
        .create_category(CreateCategoryRequest {
            name: "Films".to_string(),
            slug: "films".to_string(),
        })
        .await
        .unwrap();
    let heat = repo
        .create_title("Heat".to_string(), 1995, None, films.id, vec![])
        .await
        .unwrap();
    let alice = create_test_user(&repo, "alice", Role::User).await;
    let bob = create_test_user(&repo, "bob", Role::User).await;
    let review = repo
        .create_review(heat.id, alice.id, "Tense.".to_string(), 8)
        .await
        .unwrap();
    let other_review = repo
        .create_review(heat.id, bob.id, "Loud.".to_string(), 6)
        .await
        .unwrap();

    let first = repo
        .create_comment(review.id, bob.id, "Agreed.".to_string())
        .await
        .unwrap();
    let second = repo
        .create_comment(review.id, alice.id, "Thanks.".to_string())
        .await
        .unwrap();
    assert_eq!(first.author, "bob");

    let (comments, count) = repo.list_comments(review.id, 10, 0).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(comments[0].id, first.id);
    assert_eq!(comments[1].id, second.id);

    // Scoped by review
    assert!(
        repo.get_comment(other_review.id, first.id)
            .await
            .unwrap()
            .is_none()
    );

    let updated = repo
        .update_comment(review.id, first.id, Some("Strongly agreed.".to_string()))
        .await
        .unwrap()
        .expect("comment exists");
    assert_eq!(updated.text, "Strongly agreed.");

    let author = repo
        .get_comment_author(review.id, first.id)
        .await
        .unwrap()
        .expect("author row exists");
    assert_eq!(author.author_id, bob.id);

    assert!(repo.delete_comment(review.id, first.id).await.unwrap());
    assert!(repo.get_comment(review.id, first.id).await.unwrap().is_none());
}

// --- Cascades ---

#[tokio::test]
async fn test_deletes_cascade_and_detach() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let films = repo
        .create_category(CreateCategoryRequest {
            name: "Films".to_string(),
            slug: "films".to_string(),
        })
        .await
        .unwrap();
    let heat = repo
        .create_title("Heat".to_string(), 1995, None, films.id, vec![])
        .await
        .unwrap();
    let alice = create_test_user(&repo, "alice", Role::User).await;
    let bob = create_test_user(&repo, "bob", Role::User).await;
    let review = repo
        .create_review(heat.id, alice.id, "Tense.".to_string(), 8)
        .await
        .unwrap();
    repo.create_comment(review.id, bob.id, "Agreed.".to_string())
        .await
        .unwrap();

    // Deleting the category detaches the title instead of removing it
    assert!(repo.delete_category("films").await.unwrap());
    let detached = repo.get_title(heat.id).await.unwrap().expect("title kept");
    assert!(detached.category.is_none());

    // Deleting the review takes its comments with it
    assert!(repo.delete_review(heat.id, review.id).await.unwrap());
    assert_eq!(count_rows(&ctx.pool, "comments").await, 0);

    // Deleting the author removes their reviews
    let review = repo
        .create_review(heat.id, bob.id, "Loud.".to_string(), 6)
        .await
        .unwrap();
    assert!(repo.delete_user("bob").await.unwrap());
    assert!(repo.get_review(heat.id, review.id).await.unwrap().is_none());

    // Deleting the title clears the rest
    repo.create_review(heat.id, alice.id, "Still tense.".to_string(), 7)
        .await
        .unwrap();
    assert!(repo.delete_title(heat.id).await.unwrap());
    assert_eq!(count_rows(&ctx.pool, "reviews").await, 0);
    assert_eq!(count_rows(&ctx.pool, "title_genres").await, 0);
}
