//! CSRF token cache and fetch protocol.
//!
//! The backend issues a token from `GET /api/v1/auth/csrf-token` (cookies included)
//! and expects it back in the `X-CSRF-Token` header of every state-changing request.
//! Tokens are held in memory for one hour from issuance and never persisted, so a
//! process restart always starts without one.
//!
//! Flow Overview:
//! - `get_token` returns the cached token while `now < expires_at`, otherwise fetches.
//! - `fetch_token` always hits the network and overwrites the cache on success only.
//! - `refresh_token` clears the cache and fetches; used after a CSRF rejection.
//! - `clear_token` drops the cached token, typically on logout.
//!
//! Concurrent cold callers of `get_token` share a single fetch.

pub mod clock;
pub mod error;

pub use self::{
    clock::{Clock, ManualClock, SystemClock},
    error::CsrfError,
};

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::{
    sync::{Arc, PoisonError, RwLock},
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

pub const CSRF_TOKEN_PATH: &str = "/api/v1/auth/csrf-token";
pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Number of token characters that may appear in logs.
const LOG_PREFIX_CHARS: usize = 10;

#[derive(Debug, Clone)]
pub struct CsrfToken {
    value: SecretString,
    issued_at: Instant,
    expires_at: Instant,
}

impl CsrfToken {
    fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    #[must_use]
    pub fn value(&self) -> &SecretString {
        &self.value
    }

    #[must_use]
    pub const fn issued_at(&self) -> Instant {
        self.issued_at
    }

    #[must_use]
    pub const fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

#[derive(Debug)]
pub struct CsrfTokenManager {
    client: Client,
    endpoint: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    cache: RwLock<Option<CsrfToken>>,
    fetch_guard: Mutex<()>,
}

impl CsrfTokenManager {
    /// Build a manager that fetches tokens from `backend_url`.
    ///
    /// `client` must be the same cookie-enabled client used for API calls, otherwise
    /// the cookie half of the double-submit pair never reaches the backend.
    #[must_use]
    pub fn new(client: Client, backend_url: &str) -> Self {
        let base = backend_url.trim().trim_end_matches('/');

        Self {
            client,
            endpoint: format!("{base}{CSRF_TOKEN_PATH}"),
            ttl: DEFAULT_TOKEN_TTL,
            clock: Arc::new(SystemClock),
            cache: RwLock::new(None),
            fetch_guard: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// CSRF protection is always attempted; a 404 from the endpoint reports otherwise.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        true
    }

    /// Fetch a new token from the backend and cache it.
    ///
    /// # Errors
    /// Returns `CsrfError::FeatureDisabled` on 404 and `CsrfError::Fetch` on transport
    /// failure, any other non-success status, a body without `csrf_token`, or a TTL
    /// that overflows the clock. The cached token is left untouched on error.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn fetch_token(&self) -> Result<SecretString, CsrfError> {
        debug!("fetching CSRF token from server");

        let response = self.client.get(&self.endpoint).send().await.map_err(|err| {
            error!("Failed to fetch CSRF token: {}", err);

            CsrfError::Fetch(format!("request failed: {err}"))
        })?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("CSRF token endpoint not found, protection disabled");

            return Err(CsrfError::FeatureDisabled);
        }

        if !status.is_success() {
            error!("Failed to fetch CSRF token: {}", status);

            return Err(CsrfError::Fetch(format!("unexpected status {status}")));
        }

        let json_response: Value = response.json().await.map_err(|err| {
            error!("Failed to decode CSRF token response: {}", err);

            CsrfError::Fetch(format!("invalid response body: {err}"))
        })?;

        let value = json_response
            .get("csrf_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                error!("Invalid CSRF token response, no csrf_token found");

                CsrfError::Fetch("no csrf_token found".to_string())
            })?;

        let issued_at = self.clock.now();
        let expires_at = issued_at.checked_add(self.ttl).ok_or_else(|| {
            error!("CSRF token lifetime out of range: {:?}", self.ttl);

            CsrfError::Fetch("token lifetime out of range".to_string())
        })?;

        let token = CsrfToken {
            value: SecretString::from(value.to_string()),
            issued_at,
            expires_at,
        };

        debug!(
            token = %log_prefix(value),
            ttl_seconds = self.ttl.as_secs(),
            "CSRF token fetched successfully"
        );

        let fresh = token.value.clone();
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(token);

        Ok(fresh)
    }

    /// Return the cached token when still valid, fetching a new one otherwise.
    ///
    /// # Errors
    /// Returns the `fetch_token` error when a fetch was needed and failed.
    pub async fn get_token(&self) -> Result<SecretString, CsrfError> {
        if let Some(token) = self.cached_value() {
            debug!("using cached CSRF token");
            return Ok(token);
        }

        let _guard = self.fetch_guard.lock().await;

        // another caller may have fetched while we waited for the guard
        if let Some(token) = self.cached_value() {
            debug!("using CSRF token fetched by a concurrent caller");
            return Ok(token);
        }

        debug!("CSRF token expired or missing, fetching new one");
        self.fetch_token().await
    }

    /// Drop the cached token. Safe to call at any time.
    pub fn clear_token(&self) {
        debug!("clearing CSRF token");
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Discard the current token and fetch a new one, after a CSRF rejection.
    ///
    /// # Errors
    /// Returns the `fetch_token` error; the cache stays empty in that case.
    pub async fn refresh_token(&self) -> Result<SecretString, CsrfError> {
        debug!("refreshing CSRF token after validation error");
        self.clear_token();
        self.fetch_token().await
    }

    /// Snapshot of the cached token, valid or not.
    #[must_use]
    pub fn cached(&self) -> Option<CsrfToken> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Expiry instant of the cached token, if any.
    #[must_use]
    pub fn cached_expiry(&self) -> Option<Instant> {
        self.cached().map(|token| token.expires_at)
    }

    fn cached_value(&self) -> Option<SecretString> {
        let now = self.clock.now();

        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|token| token.is_valid_at(now))
            .map(|token| token.value.clone())
    }
}

/// Log-safe rendering of a token: a short prefix followed by an ellipsis.
#[must_use]
pub fn log_prefix(token: &str) -> String {
    let prefix: String = token.chars().take(LOG_PREFIX_CHARS).collect();
    format!("{prefix}...")
}

/// Log-safe rendering of a secret token.
#[must_use]
pub fn redacted(token: &SecretString) -> String {
    log_prefix(token.expose_secret())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use serde_json::json;
    use std::{
        net::TcpListener,
        sync::atomic::{AtomicUsize, Ordering},
    };
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    /// Replays `responses` in order, repeating the last one once exhausted.
    struct Scripted {
        calls: AtomicUsize,
        responses: Vec<ResponseTemplate>,
    }

    impl Scripted {
        fn new(responses: Vec<ResponseTemplate>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses,
            }
        }
    }

    impl Respond for Scripted {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let index = call.min(self.responses.len() - 1);
            self.responses[index].clone()
        }
    }

    /// Issues `token-1`, `token-2`, ... on successive calls.
    struct TokenSequence {
        calls: AtomicUsize,
    }

    impl Respond for TokenSequence {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            ResponseTemplate::new(200).set_body_json(json!({ "csrf_token": format!("token-{call}") }))
        }
    }

    fn token_body(token: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "csrf_token": token }))
    }

    async fn mount_sequence(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(CSRF_TOKEN_PATH))
            .respond_with(TokenSequence {
                calls: AtomicUsize::new(0),
            })
            .mount(server)
            .await;
    }

    async fn fetch_count(server: &MockServer) -> Result<usize> {
        let Some(requests) = server.received_requests().await else {
            bail!("wiremock request recording is disabled");
        };

        Ok(requests
            .iter()
            .filter(|request| request.url.path() == CSRF_TOKEN_PATH)
            .count())
    }

    fn manager(server: &MockServer, clock: &Arc<ManualClock>) -> CsrfTokenManager {
        let clock: Arc<dyn Clock> = clock.clone();
        CsrfTokenManager::new(Client::new(), &server.uri()).with_clock(clock)
    }

    #[test]
    fn endpoint_is_built_from_trimmed_base() {
        let manager = CsrfTokenManager::new(Client::new(), " http://localhost:8000/api/ ");
        assert_eq!(
            manager.endpoint(),
            "http://localhost:8000/api/api/v1/auth/csrf-token"
        );
        assert!(manager.is_enabled());
        assert!(manager.cached().is_none());
    }

    #[test]
    fn log_prefix_truncates_to_ten_characters() {
        assert_eq!(log_prefix("abcdefghijklmnop"), "abcdefghij...");
        assert_eq!(log_prefix("abc"), "abc...");
        assert_eq!(redacted(&SecretString::from("0123456789xyz".to_string())), "0123456789...");
    }

    #[tokio::test]
    async fn get_token_uses_cache_after_fetch() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_sequence(&server).await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock);

        let fetched = manager.fetch_token().await?;
        let cached = manager.get_token().await?;

        assert_eq!(fetched.expose_secret(), "token-1");
        assert_eq!(cached.expose_secret(), "token-1");
        assert_eq!(fetch_count(&server).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn get_token_fetches_once_when_expired() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_sequence(&server).await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock);

        manager.get_token().await?;
        clock.advance(DEFAULT_TOKEN_TTL);

        let refreshed = manager.get_token().await?;
        assert_eq!(refreshed.expose_secret(), "token-2");
        assert_eq!(fetch_count(&server).await?, 2);

        let again = manager.get_token().await?;
        assert_eq!(again.expose_secret(), "token-2");
        assert_eq!(fetch_count(&server).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn token_valid_until_expiry_boundary() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CSRF_TOKEN_PATH))
            .respond_with(Scripted::new(vec![token_body("abc123"), token_body("def456")]))
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock);

        assert_eq!(manager.get_token().await?.expose_secret(), "abc123");

        clock.set_elapsed(Duration::from_secs(1800));
        assert_eq!(manager.get_token().await?.expose_secret(), "abc123");
        assert_eq!(fetch_count(&server).await?, 1);

        clock.set_elapsed(Duration::from_secs(3601));
        assert_eq!(manager.get_token().await?.expose_secret(), "def456");
        assert_eq!(fetch_count(&server).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn clear_token_forces_fetch() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_sequence(&server).await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock);

        manager.get_token().await?;
        manager.clear_token();
        manager.clear_token();
        assert!(manager.cached().is_none());

        let token = manager.get_token().await?;
        assert_eq!(token.expose_secret(), "token-2");
        assert_eq!(fetch_count(&server).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_token_fetches_even_when_cache_is_valid() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_sequence(&server).await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock);

        let stale = manager.get_token().await?;
        let fresh = manager.refresh_token().await?;

        assert_ne!(stale.expose_secret(), fresh.expose_secret());
        assert_eq!(fresh.expose_secret(), "token-2");
        assert_eq!(manager.get_token().await?.expose_secret(), "token-2");
        assert_eq!(fetch_count(&server).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn missing_field_keeps_previous_token() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CSRF_TOKEN_PATH))
            .respond_with(Scripted::new(vec![
                token_body("abc123"),
                ResponseTemplate::new(200).set_body_json(json!({ "token": "nope" })),
            ]))
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock);

        manager.fetch_token().await?;
        let before = manager.cached_expiry();

        let result = manager.fetch_token().await;
        assert!(matches!(result, Err(CsrfError::Fetch(_))));

        assert_eq!(manager.cached_expiry(), before);
        assert_eq!(manager.get_token().await?.expose_secret(), "abc123");
        assert_eq!(fetch_count(&server).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn empty_token_is_rejected() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CSRF_TOKEN_PATH))
            .respond_with(token_body(""))
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock);

        let result = manager.get_token().await;
        assert!(matches!(result, Err(CsrfError::Fetch(_))));
        assert!(manager.cached().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn not_found_reports_feature_disabled() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CSRF_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock);

        let err = match manager.get_token().await {
            Ok(_) => bail!("expected a 404 to be reported"),
            Err(err) => err,
        };
        assert!(err.is_feature_disabled());
        Ok(())
    }

    #[tokio::test]
    async fn server_error_is_a_fetch_failure() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CSRF_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "boom" })))
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock);

        let result = manager.refresh_token().await;
        assert!(matches!(result, Err(CsrfError::Fetch(_))));
        assert!(manager.cached().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn server_error_keeps_previous_token() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CSRF_TOKEN_PATH))
            .respond_with(Scripted::new(vec![
                token_body("abc123"),
                ResponseTemplate::new(503),
            ]))
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock);

        manager.fetch_token().await?;
        let before = manager.cached_expiry();

        clock.advance(Duration::from_secs(10));
        let result = manager.fetch_token().await;
        assert!(matches!(result, Err(CsrfError::Fetch(_))));

        assert!(before.is_some());
        assert_eq!(manager.cached_expiry(), before);
        assert_eq!(manager.get_token().await?.expose_secret(), "abc123");
        assert_eq!(fetch_count(&server).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_keeps_previous_token() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CSRF_TOKEN_PATH))
            .respond_with(Scripted::new(vec![
                token_body("abc123"),
                token_body("late").set_delay(Duration::from_secs(2)),
            ]))
            .mount(&server)
            .await;
        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()?;
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
        let manager = CsrfTokenManager::new(client, &server.uri()).with_clock(clock);

        manager.fetch_token().await?;
        let before = manager.cached_expiry();

        // second response arrives after the client timeout
        let result = manager.fetch_token().await;
        assert!(matches!(result, Err(CsrfError::Fetch(_))));

        assert!(before.is_some());
        assert_eq!(manager.cached_expiry(), before);
        assert_eq!(manager.get_token().await?.expose_secret(), "abc123");
        Ok(())
    }

    #[tokio::test]
    async fn overflowing_ttl_is_a_fetch_failure() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CSRF_TOKEN_PATH))
            .respond_with(token_body("abc123"))
            .mount(&server)
            .await;
        let manager =
            CsrfTokenManager::new(Client::new(), &server.uri()).with_ttl(Duration::MAX);

        let result = manager.fetch_token().await;
        assert!(matches!(result, Err(CsrfError::Fetch(_))));
        assert!(manager.cached().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_fetch_failure() {
        let manager = CsrfTokenManager::new(Client::new(), "http://127.0.0.1:9");
        let result = manager.fetch_token().await;
        assert!(matches!(result, Err(CsrfError::Fetch(_))));
    }

    #[tokio::test]
    async fn concurrent_cold_callers_share_one_fetch() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CSRF_TOKEN_PATH))
            .respond_with(token_body("shared").set_delay(Duration::from_millis(100)))
            .mount(&server)
            .await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock);

        let (first, second) = tokio::join!(manager.get_token(), manager.get_token());

        assert_eq!(first?.expose_secret(), "shared");
        assert_eq!(second?.expose_secret(), "shared");
        assert_eq!(fetch_count(&server).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn custom_ttl_controls_expiry() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_sequence(&server).await;
        let clock = Arc::new(ManualClock::new());
        let manager = manager(&server, &clock).with_ttl(Duration::from_secs(60));

        manager.get_token().await?;
        let Some(token) = manager.cached() else {
            bail!("expected a cached token");
        };
        assert_eq!(token.expires_at() - token.issued_at(), Duration::from_secs(60));

        clock.advance(Duration::from_secs(59));
        assert_eq!(manager.get_token().await?.expose_secret(), "token-1");
        clock.advance(Duration::from_secs(1));
        assert_eq!(manager.get_token().await?.expose_secret(), "token-2");
        Ok(())
    }
}
