use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::Role,
    repository::RepositoryState,
};

/// Claims
///
/// Represents the payload structure carried inside a JSON Web Token (JWT).
/// These claims are signed by the server's secret and validated upon every
/// authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): The database id of the user. This is the primary key used
    /// to fetch the user's details and role from the users table.
    pub sub: i64,
    /// Expiration Time (exp): Timestamp after which the JWT must not be accepted.
    /// This is crucial for preventing replay attacks and maintaining session freshness.
    pub exp: usize,
    /// Issued At (iat): Timestamp when the JWT was issued.
    pub iat: usize,
}

/// issue_token
///
/// Signs a fresh bearer token for the given user id, valid for the configured
/// TTL. Called by the token-exchange endpoint once the confirmation code has
/// been verified.
pub fn issue_token(user_id: i64, config: &AppConfig) -> Result<String, ApiError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::hours(config.token_ttl_hours);
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
}

/// generate_confirmation_code
///
/// Produces the random code emailed at signup: a v4 UUID in compact hex form.
/// The code is single-use per account and replaced on every signup request.
pub fn generate_confirmation_code() -> String {
    Uuid::new_v4().simple().to_string()
}

/// hash_confirmation_code
///
/// Computes the SHA-256 hex digest that is stored instead of the plaintext
/// code. Verification hashes the submitted code and compares digests.
pub fn hash_confirmation_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// AuthUser Extractor Result
///
/// This struct represents the resolved identity of an authenticated request.
/// Handlers use it to retrieve the caller's id and verify permissions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The unique identifier of the user, mapped to users.id.
    pub id: i64,
    /// The username, needed by the /users/me handlers.
    pub username: String,
    /// The user's role, used for Role-Based Access Control (RBAC).
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a function
/// argument in any authenticated handler. This cleanly separates authentication
/// (middleware/extractor) from business logic (the handler).
///
/// The entire process involves:
/// 1. Dependency Resolution: Accessing Repository and AppConfig from the application state.
/// 2. Local Bypass: Allowing development-time access using the 'x-user-id' header.
/// 3. Token Validation: Standard Bearer token extraction and JWT decoding.
/// 4. DB Lookup: Fetching the user's current role and existence from the database.
///
/// Rejection: Returns a 401 `{"detail": ...}` body on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    // S must allow sending across threads and sharing.
    S: Send + Sync,
    // Allows the extractor to pull the Repository State from the app state.
    RepositoryState: FromRef<S>,
    // Allows the extractor to pull the AppConfig (for JWT secret and Env check).
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Local Development Bypass Check
        // If the application is running in Env::Local, we allow authentication by
        // providing a known user id in the 'x-user-id' header. This accelerates
        // development but is guarded by the Env check.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = id_str.parse::<i64>() {
                        // The id must still map to an actual user in the local
                        // database so that roles are correctly loaded.
                        if let Ok(Some(user)) = repo.get_user_by_id(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                username: user.username,
                                role: user.role,
                            });
                        }
                    }
                }
            }
        }
        // If Env is Production, or if the bypass failed (e.g., header was bad or user
        // not found), execution falls through to the standard JWT validation flow.

        // 3. Token Extraction
        // Attempt to retrieve the Authorization header and ensure it is prefixed
        // with "Bearer ".
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::unauthorized("Authentication credentials were not provided.")
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization header format."))?;

        // 4. JWT Decoding Setup
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();

        // Ensure expiration time validation is always active.
        validation.validate_exp = true;

        // 5. Decode and Validate the Token
        let token_data = match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                return Err(match e.kind() {
                    // Token expired: the most common failure for a valid-but-old token.
                    ErrorKind::ExpiredSignature => ApiError::unauthorized("Token has expired."),
                    // Catch all other failure types (bad signature, malformed token, etc.).
                    _ => ApiError::unauthorized("Invalid token."),
                });
            }
        };

        let user_id = token_data.claims.sub;

        // 6. Database Lookup (Final Verification)
        // Check the database for the user's existence and retrieve their current
        // role. This prevents access if the user was deleted after the token was
        // issued.
        let user = repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User for this token no longer exists."))?;

        // Success: Return the resolved identity.
        Ok(AuthUser {
            id: user.id,
            username: user.username,
            role: user.role,
        })
    }
}
