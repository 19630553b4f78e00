use super::{ApiClient, ApiError};
use serde_json::Value;

/// Backend liveness probe. The body shape is deployment specific.
///
/// # Errors
/// Returns an `ApiError` if the request fails or the body is not JSON.
pub async fn health(client: &ApiClient) -> Result<Value, ApiError> {
    client.get_json("/health").await
}

/// Backend version and build information.
///
/// # Errors
/// Returns an `ApiError` if the request fails or the body is not JSON.
pub async fn info(client: &ApiClient) -> Result<Value, ApiError> {
    client.get_json("/api/v1/info").await
}
