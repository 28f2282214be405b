use crate::auth::AuthUser;
use crate::error::ApiError;

/// Gate for user administration and catalogue writes (categories, genres,
/// titles). Moderators do not pass this check.
pub fn require_admin(user: &AuthUser) -> Result<(), ApiError> {
    if user.role.is_admin() {
        return Ok(());
    }
    Err(ApiError::forbidden(
        "You do not have permission to perform this action.",
    ))
}

/// Gate for mutating a review or comment: the author may edit their own
/// content, staff (moderator or admin) may edit anyone's.
pub fn require_author_or_staff(user: &AuthUser, author_id: i64) -> Result<(), ApiError> {
    if user.id == author_id || user.role.is_staff() {
        return Ok(());
    }
    Err(ApiError::forbidden(
        "You do not have permission to perform this action.",
    ))
}
