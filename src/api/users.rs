//! Profile and credential endpoints for the signed-in user.

use super::{
    types::{MessageResponse, PasswordChange, ProfileUpdate, UserProfile},
    ApiClient, ApiError,
};

/// Fetches the current user profile using cookie-based auth.
///
/// # Errors
/// Returns `ApiError::Unauthorized` when the session is gone, or another `ApiError`
/// if the request fails.
pub async fn me(client: &ApiClient) -> Result<UserProfile, ApiError> {
    client.get_json("/api/v1/users/me").await
}

/// Updates the editable profile fields and returns the stored profile.
///
/// # Errors
/// Returns `ApiError::Validation` for an empty update, or an `ApiError` if the request fails.
pub async fn update_profile(
    client: &ApiClient,
    update: &ProfileUpdate,
) -> Result<UserProfile, ApiError> {
    if update.is_empty() {
        return Err(ApiError::Validation("Nothing to update".to_string()));
    }

    client.put_json("/api/v1/users/profile", update).await
}

/// Changes the account password after validating the form locally.
/// Never log the request body.
///
/// # Errors
/// Returns `ApiError::Validation` if the form is invalid, or an `ApiError` if the request fails.
pub async fn change_password(
    client: &ApiClient,
    change: &PasswordChange,
) -> Result<MessageResponse, ApiError> {
    change.validate().map_err(ApiError::Validation)?;

    client
        .post_json("/api/v1/auth/change-password", &change.request())
        .await
}
