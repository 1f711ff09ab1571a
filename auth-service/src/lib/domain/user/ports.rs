use std::fmt;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::AuthenticatedSession;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::RefreshSession;
use crate::domain::user::models::SignupCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::VerificationEmail;
use crate::user::errors::AuthError;
use crate::user::errors::EmailDeliveryError;

/// Port for authentication domain service operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new account and send its verification email.
    ///
    /// # Arguments
    /// * `command` - Sanitized, shape-validated signup input
    ///
    /// # Returns
    /// Created user entity, unverified
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered (any letter case)
    /// * `Rejected` - Password policy, confirmation, role or phone check failed
    /// * `UnknownReference` - City, university, major or industry is not in the catalog
    /// * `DatabaseError` / `Timeout` - Store operation failed
    async fn signup(&self, command: SignupCommand) -> Result<User, AuthError>;

    /// Check credentials and open a session.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password
    /// * `AccountInactive` - Account has been deactivated
    /// * `EmailNotVerified` - Address not verified yet
    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, AuthError>;

    /// Redeem a verification token and open a session.
    ///
    /// # Errors
    /// * `InvalidVerificationToken` - Unknown, already used or expired token
    async fn verify_email(&self, token: &str) -> Result<AuthenticatedSession, AuthError>;

    /// Resolve the `Authorization` header value to its user.
    ///
    /// # Errors
    /// * `Unauthenticated` - Missing or malformed header, invalid or expired token
    /// * `NotFound` - Token subject no longer exists
    async fn authenticate(&self, authorization: Option<&str>) -> Result<User, AuthError>;

    /// Apply a partial profile update.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Rejected` - Nothing to update, or a field failed a domain check
    /// * `UnknownReference` - Referenced catalog entry does not exist
    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<User, AuthError>;

    /// Replace the password after checking the current one.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `WrongPassword` - Current password does not verify
    /// * `Rejected` - New password fails the complexity policy
    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), AuthError>;
}

/// Persistence operations for user credentials and profile.
///
/// Every mutation is a single-record operation.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist a new user.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn insert(&self, user: User) -> Result<User, AuthError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError>;

    /// Lookup is case-insensitive because addresses are stored case-folded.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError>;

    /// Atomically mark verified the user holding a live `token`.
    ///
    /// Clears the token and its expiry in the same write.
    ///
    /// # Returns
    /// The updated user, or `None` when no user holds the token or it has
    /// expired at `now`
    async fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AuthError>;

    /// Replace the refresh session only if the stored one still equals
    /// `expected`.
    ///
    /// # Returns
    /// `true` if the write happened, `false` if another writer got there first
    async fn swap_refresh_session(
        &self,
        id: &UserId,
        expected: Option<RefreshSession>,
        next: RefreshSession,
    ) -> Result<bool, AuthError>;

    /// Persist profile fields and the completeness flag.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_profile(&self, user: User) -> Result<User, AuthError>;

    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), AuthError>;
}

/// Reference collection a profile value must exist in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    City,
    University,
    Major,
    Industry,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::City => "city",
            ReferenceKind::University => "university",
            ReferenceKind::Major => "major",
            ReferenceKind::Industry => "industry",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only lookup over the reference collections.
#[async_trait]
pub trait ReferenceCatalog: Send + Sync + 'static {
    /// Whether `name` is a known entry of `kind` (exact match).
    async fn exists(&self, kind: ReferenceKind, name: &str) -> Result<bool, AuthError>;
}

/// Outbound email delivery.
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    /// # Errors
    /// * `BuildFailed` - Message could not be assembled
    /// * `SendFailed` - Transport rejected the message
    async fn send_verification_email(
        &self,
        email: VerificationEmail,
    ) -> Result<(), EmailDeliveryError>;
}
