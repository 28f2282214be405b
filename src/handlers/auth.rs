use std::collections::BTreeMap;

use axum::{Json, extract::State};
use validator::Validate;

use crate::{
    AppState, auth,
    error::{ApiError, ApiResult, OptionExt},
    models::{CreateUserRequest, Role, SignUpRequest, SignUpResponse, TokenRequest, TokenResponse},
    validators,
};

/// signup
///
/// [Public Route] Registers a new account and emails it a confirmation code.
///
/// Re-posting a (username, email) pair that already belongs to one account is
/// not an error: the account gets a fresh code, so the flow doubles as
/// "resend my code". A pair that collides with someone else's username or
/// email is rejected with a field-level 400.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Confirmation code sent", body = SignUpResponse),
        (status = 400, description = "Validation failed or identifier taken")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> ApiResult<Json<SignUpResponse>> {
    payload.validate()?;
    validators::validate_username(&payload.username)?;

    let by_username = state.repo.get_user_by_username(&payload.username).await?;
    let by_email = state.repo.get_user_by_email(&payload.email).await?;

    let user = match (by_username, by_email) {
        // The exact pair already exists: fall through and re-issue the code.
        (Some(by_username), Some(by_email)) if by_username.id == by_email.id => by_username,
        (Some(_), Some(_)) => {
            let mut fields = BTreeMap::new();
            fields.insert(
                "username".to_string(),
                vec!["A user with that username already exists.".to_string()],
            );
            fields.insert(
                "email".to_string(),
                vec!["A user with that email already exists.".to_string()],
            );
            return Err(ApiError::Fields(fields));
        }
        (Some(_), None) => {
            return Err(ApiError::field(
                "username",
                "A user with that username already exists.",
            ));
        }
        (None, Some(_)) => {
            return Err(ApiError::field(
                "email",
                "A user with that email already exists.",
            ));
        }
        (None, None) => {
            let req = CreateUserRequest {
                username: payload.username.clone(),
                email: payload.email.clone(),
                ..Default::default()
            };
            state.repo.create_user(req, Role::User).await?
        }
    };

    // Only the digest is stored; the plain code travels by email alone.
    let code = auth::generate_confirmation_code();
    state
        .repo
        .set_confirmation_code(user.id, auth::hash_confirmation_code(&code))
        .await?;
    state
        .mailer
        .send_confirmation_code(&user.email, &user.username, &code)
        .await?;

    Ok(Json(SignUpResponse {
        email: user.email,
        username: user.username,
    }))
}

/// obtain_token
///
/// [Public Route] Exchanges a username and emailed confirmation code for a JWT.
///
/// *Note*: an unknown username is a 404, while a known username with the wrong
/// code is a field-level 400. The distinction lets clients tell "you never
/// signed up" apart from "check your inbox again".
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Wrong confirmation code"),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    payload.validate()?;

    let user = state
        .repo
        .get_user_by_username(&payload.username)
        .await?
        .ok_or_not_found("User")?;

    let stored = state.repo.get_confirmation_hash(user.id).await?;
    let presented = auth::hash_confirmation_code(&payload.confirmation_code);
    if stored.as_deref() != Some(presented.as_str()) {
        return Err(ApiError::field(
            "confirmation_code",
            "Invalid confirmation code.",
        ));
    }

    let token = auth::issue_token(user.id, &state.config)?;
    Ok(Json(TokenResponse { token }))
}
