//! HTTP client for the RefertoSicuro REST API with CSRF handling and a fixed timeout.
//!
//! Every request carries session cookies. State-changing requests (`POST`, `PUT`,
//! `PATCH`, `DELETE`) also carry the CSRF token from the shared
//! [`CsrfTokenManager`]. A `403` whose `detail` mentions `CSRF` refreshes the token
//! and retries the request exactly once; the retry's outcome is final. A `401`
//! outside the login endpoint opens the auth modal through [`AuthModalSignal`].
//!
//! Error bodies are sanitized before they reach callers: the backend `detail` is
//! preferred, then the trimmed body, truncated to a fixed length.

pub mod error;
pub mod general;
pub mod specialties;
pub mod tracking;
pub mod types;
pub mod users;

pub use self::error::ApiError;

use crate::{
    auth_modal::{AuthModalMode, AuthModalSignal},
    csrf::{self, CsrfError, CsrfTokenManager, CSRF_HEADER},
    APP_USER_AGENT,
};
use reqwest::{Client, Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info_span, warn, Instrument};
use url::Url;

/// Timeout applied to every request, token fetches included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

const LOGIN_PATH: &str = "/api/v1/auth/login";
const LOGOUT_PATH: &str = "/api/v1/auth/logout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL for API calls.
    pub api_base_url: String,
    /// Base URL of the backend issuing CSRF tokens.
    pub backend_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Config with API calls and token fetches against the same backend.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if `backend_url` is not an http(s) URL.
    pub fn new(backend_url: &str) -> Result<Self, ApiError> {
        let backend_url = normalize_base_url(backend_url)?;

        Ok(Self {
            api_base_url: backend_url.clone(),
            backend_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Send API calls to `api_base_url` while tokens still come from the backend URL.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if `api_base_url` is not an http(s) URL.
    pub fn with_api_base_url(mut self, api_base_url: &str) -> Result<Self, ApiError> {
        self.api_base_url = normalize_base_url(api_base_url)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
    csrf: Arc<CsrfTokenManager>,
    auth_modal: Arc<AuthModalSignal>,
}

impl ApiClient {
    /// Build a client with a cookie store shared between API calls and token fetches.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig, auth_modal: Arc<AuthModalSignal>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .cookie_store(true)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        let csrf = Arc::new(CsrfTokenManager::new(http.clone(), &config.backend_url));

        Ok(Self::from_parts(http, config, csrf, auth_modal))
    }

    /// Assemble a client from existing parts, e.g. a manager with a custom clock.
    #[must_use]
    pub const fn from_parts(
        http: Client,
        config: ApiConfig,
        csrf: Arc<CsrfTokenManager>,
        auth_modal: Arc<AuthModalSignal>,
    ) -> Self {
        Self {
            http,
            config,
            csrf,
            auth_modal,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[must_use]
    pub const fn csrf(&self) -> &Arc<CsrfTokenManager> {
        &self.csrf
    }

    #[must_use]
    pub const fn auth_modal(&self) -> &Arc<AuthModalSignal> {
        &self.auth_modal
    }

    /// Fetches JSON with session cookies.
    ///
    /// # Errors
    /// Returns an `ApiError` if the request fails or the body cannot be decoded.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(Method::GET, path, None).await
    }

    /// Posts a JSON body and parses a JSON response.
    ///
    /// # Errors
    /// Returns an `ApiError` if encoding, the request, or decoding fails.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = encode_body(body)?;
        self.send_json(Method::POST, path, Some(payload)).await
    }

    /// Puts a JSON body and parses a JSON response.
    ///
    /// # Errors
    /// Returns an `ApiError` if encoding, the request, or decoding fails.
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = encode_body(body)?;
        self.send_json(Method::PUT, path, Some(payload)).await
    }

    /// Posts without a body and parses a JSON response.
    ///
    /// # Errors
    /// Returns an `ApiError` if the request fails or the body cannot be decoded.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(Method::POST, path, None).await
    }

    /// Sends a request and parses a JSON response.
    ///
    /// # Errors
    /// Returns an `ApiError` if the request fails or the body cannot be decoded.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let response = self.execute(method, path, body.as_ref()).await?;

        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    }

    /// Sends a request and ignores the response body.
    ///
    /// # Errors
    /// Returns an `ApiError` if the request fails.
    pub async fn send_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(), ApiError> {
        self.execute(method, path, body.as_ref()).await.map(|_| ())
    }

    /// Ends the server session and drops the cached CSRF token, even if the call fails.
    ///
    /// # Errors
    /// Returns the logout request error; the token is cleared regardless.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.send_empty(Method::POST, LOGOUT_PATH, None).await;

        self.csrf.clear_token();

        if let Err(err) = &result {
            warn!("Logout request failed: {}", err);
        }

        result
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let url = build_url_with_base(&self.config.api_base_url, path);

        let csrf_token = if requires_csrf(&method, path) {
            self.csrf_token().await?
        } else {
            None
        };

        let response = self
            .dispatch(&method, &url, body, csrf_token.as_ref())
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status == StatusCode::FORBIDDEN && !is_csrf_endpoint(path) && is_csrf_rejection(&text)
        {
            return self.retry_after_csrf_rejection(&method, &url, path, body, &text).await;
        }

        Err(self.failure(status, path, &text))
    }

    /// Refresh the token and replay the request once. A failed refresh surfaces the
    /// original rejection.
    async fn retry_after_csrf_rejection(
        &self,
        method: &Method,
        url: &str,
        path: &str,
        body: Option<&Value>,
        rejection: &str,
    ) -> Result<Response, ApiError> {
        warn!("CSRF validation failed, refreshing token and retrying");

        let token = match self.csrf.refresh_token().await {
            Ok(token) => token,
            Err(err) => {
                error!("CSRF token refresh failed: {}", err);

                return Err(self.failure(StatusCode::FORBIDDEN, path, rejection));
            }
        };

        let response = self.dispatch(method, url, body, Some(&token)).await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        Err(self.failure(status, path, &text))
    }

    /// Token for a state-changing request. `None` when the backend has CSRF disabled.
    async fn csrf_token(&self) -> Result<Option<SecretString>, ApiError> {
        match self.csrf.get_token().await {
            Ok(token) => {
                debug!(csrf_token = %csrf::redacted(&token), "Added CSRF token to request");
                Ok(Some(token))
            }
            Err(CsrfError::FeatureDisabled) => {
                debug!("CSRF protection disabled on backend, sending request without token");
                Ok(None)
            }
            Err(err) => {
                error!("Failed to fetch CSRF token: {}", err);
                Err(ApiError::Connection(err.to_string()))
            }
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        csrf_token: Option<&SecretString>,
    ) -> Result<Response, ApiError> {
        let mut builder = self.http.request(method.clone(), url);

        if let Some(token) = csrf_token {
            builder = builder.header(CSRF_HEADER, token.expose_secret());
        }

        if let Some(body) = body {
            builder = builder.json(body);
        }

        let span = info_span!("api.request", http.method = %method, url = %url);

        builder
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)
    }

    fn failure(&self, status: StatusCode, path: &str, body: &str) -> ApiError {
        if status == StatusCode::UNAUTHORIZED && !path.contains(LOGIN_PATH) {
            debug!("Authentication failed (401), opening login modal");
            self.auth_modal.trigger(AuthModalMode::Login);

            return ApiError::Unauthorized;
        }

        ApiError::Http {
            status: status.as_u16(),
            message: error_message(body),
        }
    }
}

fn requires_csrf(method: &Method, path: &str) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
        && !is_csrf_endpoint(path)
}

fn is_csrf_endpoint(path: &str) -> bool {
    path.contains("/csrf-token")
}

/// A `403` is a CSRF rejection when its string `detail` mentions CSRF.
fn is_csrf_rejection(body: &str) -> bool {
    serde_json::from_str::<Value>(body).is_ok_and(|json| {
        json.get("detail")
            .and_then(Value::as_str)
            .is_some_and(|detail| detail.contains("CSRF"))
    })
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|err| ApiError::Serialization(format!("Failed to encode request: {err}")))
}

fn normalize_base_url(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();

    let url = Url::parse(trimmed)
        .map_err(|err| ApiError::Config(format!("Invalid base URL {trimmed}: {err}")))?;

    match url.scheme() {
        "http" | "https" => Ok(trimmed.trim_end_matches('/').to_string()),
        scheme => Err(ApiError::Config(format!(
            "Invalid base URL {trimmed}: unsupported scheme {scheme}"
        ))),
    }
}

/// Builds a URL from an explicit base URL and the provided path.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps transport errors into `ApiError` variants with timeout detection.
fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        ApiError::Connection(format!("Unable to reach the server: {err}"))
    }
}

/// Extracts a user-facing message from an error body.
fn error_message(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("detail").and_then(detail_text));

    sanitize_body(detail.as_deref().unwrap_or(body))
}

/// `detail` is either a string or `{"errors": [...]}`.
fn detail_text(detail: &Value) -> Option<String> {
    if let Some(text) = detail.as_str() {
        return Some(text.to_string());
    }

    let errors: Vec<&str> = detail
        .get("errors")?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(errors.join(", "))
    }
}

/// Sanitizes error bodies by trimming and truncating.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
