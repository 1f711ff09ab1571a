use std::time::Duration;

use thiserror::Error;

use crate::domain::validation::ValidationErrors;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Error for outbound email delivery
#[derive(Debug, Clone, Error)]
pub enum EmailDeliveryError {
    #[error("Failed to build email: {0}")]
    BuildFailed(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Top-level error for every authentication flow.
///
/// Variants split into three kinds: input validation (`Validation`,
/// `Rejected`), expected domain outcomes (conflict, not found, unauthorized)
/// and internal faults (`is_internal`).
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Validation Error")]
    Validation(ValidationErrors),

    #[error("{0}")]
    Rejected(String),

    #[error("An account with this email already exists")]
    EmailAlreadyExists(String),

    #[error("{0} is not supported yet!")]
    UnknownReference(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Your account has been deactivated")]
    AccountInactive,

    #[error(
        "Please verify your email before logging in. Check your inbox for the verification link."
    )]
    EmailNotVerified,

    #[error("Invalid or expired verification token")]
    InvalidVerificationToken,

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("User not found")]
    NotFound(String),

    // Infrastructure errors
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    #[error("Token signing failed: {0}")]
    Signing(#[from] auth::JwtError),

    #[error("Token generation failed: {0}")]
    Entropy(#[from] auth::TokenError),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AuthError {
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Timeout(_)
                | AuthError::DatabaseError(_)
                | AuthError::Password(_)
                | AuthError::Signing(_)
                | AuthError::Entropy(_)
                | AuthError::Unknown(_)
        )
    }
}

impl From<ValidationErrors> for AuthError {
    fn from(errors: ValidationErrors) -> Self {
        AuthError::Validation(errors)
    }
}
