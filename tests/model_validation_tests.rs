use chrono::{Datelike, Utc};
use reviewdb::error::ApiError;
use reviewdb::models::{
    Category, CreateReviewRequest, Genre, Page, PageParams, Role, SignUpRequest, Title,
    UpdateUserRequest, User,
};
use reviewdb::validators::{validate_slug, validate_username, validate_year};
use validator::Validate;

// --- Serialization Shapes ---

#[test]
fn test_role_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    assert_eq!(
        serde_json::to_string(&Role::Moderator).unwrap(),
        "\"moderator\""
    );
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");

    let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
    assert_eq!(parsed, Role::Admin);
}

#[test]
fn test_role_defaults_to_user() {
    assert_eq!(Role::default(), Role::User);
    assert!(Role::Admin.is_admin());
    assert!(!Role::Moderator.is_admin());
    assert!(Role::Moderator.is_staff());
    assert!(!Role::User.is_staff());
}

#[test]
fn test_user_serializes_all_fields() {
    let user = User {
        id: 1,
        username: "reader".to_string(),
        email: "reader@example.com".to_string(),
        first_name: Some("Rae".to_string()),
        last_name: None,
        bio: None,
        role: Role::User,
    };

    let json = serde_json::to_string(&user).unwrap();
    assert!(json.contains("\"username\":\"reader\""));
    assert!(json.contains("\"role\":\"user\""));
    // Unset profile fields still appear as nulls
    assert!(json.contains("\"last_name\":null"));
    assert!(json.contains("\"bio\":null"));
}

#[test]
fn test_update_user_request_omits_missing_fields() {
    let req = UpdateUserRequest {
        bio: Some("Hi.".to_string()),
        ..Default::default()
    };

    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains("\"bio\":\"Hi.\""));
    // skip_serializing_if drops every unset field
    assert!(!json.contains("username"));
    assert!(!json.contains("email"));
    assert!(!json.contains("role"));
}

#[test]
fn test_title_serializes_null_rating_and_empty_genres() {
    let title = Title {
        id: 3,
        name: "Heat".to_string(),
        year: 1995,
        rating: None,
        description: None,
        genre: vec![],
        category: None,
    };

    let json = serde_json::to_string(&title).unwrap();
    assert!(json.contains("\"rating\":null"));
    assert!(json.contains("\"genre\":[]"));
    assert!(json.contains("\"category\":null"));

    let rated = Title {
        rating: Some(7),
        category: Some(Category {
            id: 1,
            name: "Films".to_string(),
            slug: "films".to_string(),
        }),
        genre: vec![Genre {
            id: 1,
            name: "Drama".to_string(),
            slug: "drama".to_string(),
        }],
        ..title
    };
    let json = serde_json::to_string(&rated).unwrap();
    assert!(json.contains("\"rating\":7"));
    assert!(json.contains("\"slug\":\"films\""));
}

// --- Derive-Level Validation ---

#[test]
fn test_signup_request_rejects_bad_email() {
    let req = SignUpRequest {
        email: "not-an-email".to_string(),
        username: "reader".to_string(),
    };

    let errors = req.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("email"));
}

#[test]
fn test_signup_request_rejects_oversized_username() {
    let req = SignUpRequest {
        email: "reader@example.com".to_string(),
        username: "a".repeat(151),
    };

    let errors = req.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("username"));
}

#[test]
fn test_review_score_bounds() {
    let too_high = CreateReviewRequest {
        text: "Great.".to_string(),
        score: 11,
    };
    let errors = too_high.validate().unwrap_err();
    let field_errors = errors.field_errors();
    let score_errors = field_errors.get("score").expect("score should be flagged");
    assert_eq!(
        score_errors[0].message.as_deref(),
        Some("Score must be between 1 and 10.")
    );

    let ok = CreateReviewRequest {
        text: "Great.".to_string(),
        score: 10,
    };
    assert!(ok.validate().is_ok());
}

#[test]
fn test_validation_errors_map_to_field_payload() {
    let req = CreateReviewRequest {
        text: String::new(),
        score: 0,
    };

    let err: ApiError = req.validate().unwrap_err().into();
    match err {
        ApiError::Fields(fields) => {
            assert!(fields.contains_key("text"));
            assert!(fields.contains_key("score"));
        }
        other => panic!("Expected a field error, got {other:?}"),
    }
}

// --- Custom Validators ---

#[test]
fn test_username_rules() {
    assert!(validate_username("reader").is_ok());
    assert!(validate_username("first.last+tag@host").is_ok());

    match validate_username("me").unwrap_err() {
        ApiError::Fields(fields) => {
            assert_eq!(fields["username"][0], "\"me\" is a reserved username.");
        }
        other => panic!("Expected a field error, got {other:?}"),
    }

    assert!(validate_username("no spaces").is_err());
    assert!(validate_username("bang!").is_err());
}

#[test]
fn test_slug_rules() {
    assert!(validate_slug("films-2024_x").is_ok());
    assert!(validate_slug("bad slug").is_err());
    assert!(validate_slug("ünïcode").is_err());
}

#[test]
fn test_year_rules() {
    let current = Utc::now().year();
    assert!(validate_year(current).is_ok());
    assert!(validate_year(1888).is_ok());

    match validate_year(current + 1).unwrap_err() {
        ApiError::Fields(fields) => {
            assert_eq!(fields["year"][0], "Year cannot be in the future.");
        }
        other => panic!("Expected a field error, got {other:?}"),
    }
}

// --- Pagination Envelope ---

#[test]
fn test_page_params_defaults_and_clamping() {
    let params = PageParams::default();
    assert_eq!(params.page(), 1);
    assert_eq!(params.page_size(), 10);
    assert_eq!(params.offset(), 0);

    let params = PageParams {
        page: Some(0),
        page_size: Some(1000),
    };
    assert_eq!(params.page(), 1);
    assert_eq!(params.page_size(), 100);

    let params = PageParams {
        page: Some(3),
        page_size: Some(5),
    };
    assert_eq!(params.limit(), 5);
    assert_eq!(params.offset(), 10);
}

#[test]
fn test_page_envelope_links() {
    let params = PageParams {
        page: Some(2),
        page_size: Some(5),
    };
    let page = Page::build("/api/v1/titles", &params, 12, vec![6, 7, 8, 9, 10]).unwrap();

    assert_eq!(page.count, 12);
    assert_eq!(
        page.next.as_deref(),
        Some("/api/v1/titles?page=3&page_size=5")
    );
    assert_eq!(
        page.previous.as_deref(),
        Some("/api/v1/titles?page=1&page_size=5")
    );
    assert_eq!(page.results.len(), 5);
}

#[test]
fn test_page_envelope_edges() {
    // Last page has no next link
    let params = PageParams {
        page: Some(3),
        page_size: Some(5),
    };
    let page = Page::build("/api/v1/titles", &params, 12, vec![11, 12]).unwrap();
    assert!(page.next.is_none());
    assert_eq!(
        page.previous.as_deref(),
        Some("/api/v1/titles?page=2&page_size=5")
    );

    // An empty collection still serves page 1
    let page = Page::build("/api/v1/titles", &PageParams::default(), 0, Vec::<i64>::new()).unwrap();
    assert_eq!(page.count, 0);
    assert!(page.next.is_none());
    assert!(page.previous.is_none());
}

#[test]
fn test_page_envelope_rejects_page_past_end() {
    let params = PageParams {
        page: Some(3),
        page_size: Some(10),
    };
    let err = Page::build("/api/v1/users", &params, 5, Vec::<i64>::new()).unwrap_err();

    match err {
        ApiError::NotFound(message) => assert_eq!(message, "Invalid page."),
        other => panic!("Expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_page_envelope_serialized_shape() {
    let page = Page {
        count: 2,
        next: None,
        previous: None,
        results: vec!["a", "b"],
    };

    let json = serde_json::to_string(&page).unwrap();
    assert!(json.contains("\"count\":2"));
    assert!(json.contains("\"next\":null"));
    assert!(json.contains("\"previous\":null"));
    assert!(json.contains("\"results\":[\"a\",\"b\"]"));
}
