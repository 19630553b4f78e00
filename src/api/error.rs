use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    /// The backend could not be reached, including failed CSRF token fetches. The
    /// message shown to users stays generic; the payload carries the cause.
    #[error("Connection error. Please try again.")]
    Connection(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Session expired")]
    Unauthorized,
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ApiError {
    /// HTTP status carried by the error, when the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }
}
