//! Specialty catalogue and the specialties assigned to the current user.

use super::{types::Specialty, ApiClient, ApiError};

/// Lists every specialty offered by the platform.
///
/// # Errors
/// Returns an `ApiError` if the request fails or the body cannot be decoded.
pub async fn all(client: &ApiClient) -> Result<Vec<Specialty>, ApiError> {
    client.get_json("/api/v1/specialties").await
}

/// Lists the specialties enabled for the signed-in user.
///
/// # Errors
/// Returns an `ApiError` if the request fails or the body cannot be decoded.
pub async fn mine(client: &ApiClient) -> Result<Vec<Specialty>, ApiError> {
    client.get_json("/api/v1/specialtiesuser/me").await
}

/// Fetches a single specialty.
///
/// # Errors
/// Returns an `ApiError` if the request fails or the body cannot be decoded.
pub async fn by_id(client: &ApiClient, id: &str) -> Result<Specialty, ApiError> {
    client.get_json(&format!("/api/v1/specialties/{id}")).await
}
