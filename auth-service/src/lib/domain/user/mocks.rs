use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use mockall::mock;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::RefreshSession;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::VerificationEmail;
use crate::user::errors::AuthError;
use crate::user::errors::EmailDeliveryError;
use crate::user::ports::CredentialStore;
use crate::user::ports::EmailSender;
use crate::user::ports::ReferenceCatalog;
use crate::user::ports::ReferenceKind;

mock! {
    pub TestStore {}

    #[async_trait]
    impl CredentialStore for TestStore {
        async fn insert(&self, user: User) -> Result<User, AuthError>;
        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError>;
        async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError>;
        async fn redeem_verification_token(&self, token: &str, now: DateTime<Utc>) -> Result<Option<User>, AuthError>;
        async fn swap_refresh_session(&self, id: &UserId, expected: Option<RefreshSession>, next: RefreshSession) -> Result<bool, AuthError>;
        async fn update_profile(&self, user: User) -> Result<User, AuthError>;
        async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), AuthError>;
    }
}

mock! {
    pub TestCatalog {}

    #[async_trait]
    impl ReferenceCatalog for TestCatalog {
        async fn exists(&self, kind: ReferenceKind, name: &str) -> Result<bool, AuthError>;
    }
}

mock! {
    pub TestSender {}

    #[async_trait]
    impl EmailSender for TestSender {
        async fn send_verification_email(&self, email: VerificationEmail) -> Result<(), EmailDeliveryError>;
    }
}
