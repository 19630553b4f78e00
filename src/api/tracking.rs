//! Opt-in debug tracking consent. Disabling it deletes the recorded data server-side.

use super::{
    types::{TrackingDisabled, TrackingEnabled, TrackingStatus},
    ApiClient, ApiError,
};

/// Current consent state.
///
/// # Errors
/// Returns an `ApiError` if the request fails or the body cannot be decoded.
pub async fn status(client: &ApiClient) -> Result<TrackingStatus, ApiError> {
    client.get_json("/api/v1/users/debug-tracking/status").await
}

/// Grants consent; the response reports how long data is retained.
///
/// # Errors
/// Returns an `ApiError` if the request fails or the body cannot be decoded.
pub async fn enable(client: &ApiClient) -> Result<TrackingEnabled, ApiError> {
    client.post_empty("/api/v1/users/debug-tracking/enable").await
}

/// Revokes consent; the response reports how many records were deleted.
///
/// # Errors
/// Returns an `ApiError` if the request fails or the body cannot be decoded.
pub async fn disable(client: &ApiClient) -> Result<TrackingDisabled, ApiError> {
    client.post_empty("/api/v1/users/debug-tracking/disable").await
}

/// Flips consent based on the current status and returns the new status.
///
/// # Errors
/// Returns an `ApiError` if any of the calls fail.
pub async fn toggle(client: &ApiClient) -> Result<TrackingStatus, ApiError> {
    if status(client).await?.enabled {
        disable(client).await?;
    } else {
        enable(client).await?;
    }

    status(client).await
}
