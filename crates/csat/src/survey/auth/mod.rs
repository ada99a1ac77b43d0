//! Administrator authentication.
//!
//! The signed-in administrator is never ambient state: handlers resolve a
//! bearer token into an [`AdminContext`] and pass it to the operation.

mod rest;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::Language;

pub use rest::RestAuthGateway;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
}

/// Authenticated session handed back by sign-in.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AdminUser,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Admin setup page input, checked before any remote call.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSetupForm {
    pub email: String,
    pub password: String,
    #[serde(alias = "confirm_password")]
    pub confirm_password: String,
}

impl AdminSetupForm {
    pub fn validate(self) -> Result<Credentials, SetupError> {
        let email = self.email.trim().to_string();
        if email.is_empty() {
            return Err(SetupError::MissingEmail);
        }
        if self.password != self.confirm_password {
            return Err(SetupError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SetupError::PasswordTooShort);
        }
        Ok(Credentials {
            email,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("email is required")]
    MissingEmail,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("not authenticated")]
    Unauthenticated,
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
    #[error("authentication service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<reqwest::Error> for AuthError {
    fn from(value: reqwest::Error) -> Self {
        Self::Unavailable(value.to_string())
    }
}

/// Explicit per-request context for administrator operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    pub language: Language,
    pub user: AdminUser,
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError>;
    /// Resolve an access token to its user; unknown or expired tokens are
    /// [`AuthError::Unauthenticated`].
    async fn current_session(&self, access_token: &str) -> Result<AdminUser, AuthError>;
    async fn sign_up(&self, credentials: &Credentials) -> Result<AdminUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(password: &str, confirm: &str) -> AdminSetupForm {
        AdminSetupForm {
            email: " admin@example.org ".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn setup_form_checks_match_then_length() {
        assert_eq!(
            form("secret1", "secret2").validate().unwrap_err(),
            SetupError::PasswordMismatch
        );
        assert_eq!(
            form("abc", "abc").validate().unwrap_err(),
            SetupError::PasswordTooShort
        );
        let credentials = form("abcdef", "abcdef").validate().expect("valid form");
        assert_eq!(credentials.email, "admin@example.org");
    }

    #[test]
    fn secrets_stay_out_of_debug_output() {
        let credentials = Credentials {
            email: "admin@example.org".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(!format!("{credentials:?}").contains("hunter22"));
    }
}
