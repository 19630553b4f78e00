//! Request and response payloads for the wrapped endpoints. Fields the UI does not
//! need are left out; unknown fields are ignored on decode.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum accepted length for a new password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Specialty identifiers are numeric in some deployments and slugs in others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecialtyId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SpecialtyId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(formatter, "{id}"),
            Self::Text(id) => write!(formatter, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialty {
    pub id: SpecialtyId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub mfa_enabled: bool,
    #[serde(default)]
    pub professional_verified: bool,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Partial profile update; `None` fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.phone_number.is_none() && self.display_name.is_none()
    }
}

/// Password change as entered in the form, confirmation included.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current_password: SecretString,
    pub new_password: SecretString,
    pub confirm_password: SecretString,
}

impl PasswordChange {
    /// Check the form before anything goes over the wire.
    ///
    /// # Errors
    /// Returns a user-facing message for the first violated rule.
    pub fn validate(&self) -> Result<(), String> {
        let current = self.current_password.expose_secret();
        let new = self.new_password.expose_secret();
        let confirm = self.confirm_password.expose_secret();

        if current.is_empty() || new.is_empty() || confirm.is_empty() {
            return Err("All fields are required".to_string());
        }

        if new != confirm {
            return Err("New passwords do not match".to_string());
        }

        if new.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "New password must be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }

        Ok(())
    }

    pub(crate) fn request(&self) -> ChangePasswordRequest<'_> {
        ChangePasswordRequest {
            current_password: self.current_password.expose_secret(),
            new_password: self.new_password.expose_secret(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackingStatus {
    pub enabled: bool,
    #[serde(default)]
    pub retention_days: Option<u32>,
    #[serde(default)]
    pub enabled_at: Option<String>,
    #[serde(default)]
    pub tracking_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackingEnabled {
    #[serde(default)]
    pub retention_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackingDisabled {
    #[serde(default)]
    pub deleted_records: u64,
}
