use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsrfError {
    /// The token endpoint answered 404: this deployment does not issue CSRF tokens.
    #[error("CSRF protection is not enabled on this deployment")]
    FeatureDisabled,
    /// The endpoint could not be reached or returned an unexpected body.
    #[error("CSRF token fetch failed: {0}")]
    Fetch(String),
}

impl CsrfError {
    #[must_use]
    pub const fn is_feature_disabled(&self) -> bool {
        matches!(self, Self::FeatureDisabled)
    }
}
