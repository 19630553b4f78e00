use crate::{
    api::{ApiClient, ApiConfig, DEFAULT_TIMEOUT},
    auth_modal::AuthModalSignal,
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};

/// Connection settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    pub backend_url: String,
    pub api_url: Option<String>,
    pub timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(backend_url: String) -> Self {
        Self {
            backend_url,
            api_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn set_api_url(&mut self, api_url: String) {
        self.api_url = Some(api_url);
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// # Errors
    /// Returns an error if either base URL is invalid.
    pub fn config(&self) -> Result<ApiConfig> {
        let config = ApiConfig::new(&self.backend_url).context("invalid backend URL")?;

        let config = match &self.api_url {
            Some(api_url) => config
                .with_api_base_url(api_url)
                .context("invalid API URL")?,
            None => config,
        };

        Ok(config.with_timeout(self.timeout))
    }

    /// Build an API client. Nobody listens for the auth modal on the command line, so a
    /// `401` only surfaces as an error.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client cannot be built.
    pub fn client(&self) -> Result<ApiClient> {
        let config = self.config()?;

        ApiClient::new(config, Arc::new(AuthModalSignal::new()))
            .context("failed to build API client")
    }
}
