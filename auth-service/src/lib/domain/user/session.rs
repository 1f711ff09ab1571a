use std::sync::Arc;

use auth::TokenIssuer;

use crate::domain::user::deadline::StoreDeadline;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::AuthError;
use crate::user::ports::CredentialStore;

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of an `Authorization` header value.
///
/// # Errors
/// * `Unauthenticated` - Header missing, not a `Bearer ` credential, or empty
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AuthError::Unauthenticated("Authorization(Bearer Token) header not found".to_string())
        })?;

    let token = header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        AuthError::Unauthenticated("header does not start with 'Bearer '".to_string())
    })?;

    match token.trim() {
        "" => Err(AuthError::Unauthenticated(
            "Invalid or expired token".to_string(),
        )),
        token => Ok(token),
    }
}

/// Resolves access tokens on protected requests.
///
/// Account status is not re-checked here; it is enforced at login only.
pub struct SessionAuthenticator<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    tokens: Arc<TokenIssuer>,
    deadline: StoreDeadline,
}

impl<CS> SessionAuthenticator<CS>
where
    CS: CredentialStore,
{
    pub fn new(store: Arc<CS>, tokens: Arc<TokenIssuer>, deadline: StoreDeadline) -> Self {
        Self {
            store,
            tokens,
            deadline,
        }
    }

    /// Verify the bearer token and load its subject.
    ///
    /// # Errors
    /// * `Unauthenticated` - Header or token rejected
    /// * `NotFound` - Token is valid but the user is gone
    pub async fn resolve(&self, authorization: Option<&str>) -> Result<User, AuthError> {
        let token = extract_bearer_token(authorization)?;

        let claims = self.tokens.verify_access_token(token).map_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
            AuthError::Unauthenticated("Invalid or expired token".to_string())
        })?;

        let id = UserId::from_string(&claims.sub).map_err(|e| {
            tracing::debug!(error = %e, "Access token subject is not a user id");
            AuthError::Unauthenticated("Invalid or expired token".to_string())
        })?;

        self.deadline
            .run(self.store.find_by_id(&id))
            .await?
            .ok_or_else(|| AuthError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::Utc;

    use super::*;
    use crate::domain::user::mocks::MockTestStore;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn tokens() -> Arc<TokenIssuer> {
        Arc::new(TokenIssuer::new(SECRET, "talentspal", Duration::hours(1)))
    }

    fn unauthenticated_message(result: Result<impl std::fmt::Debug, AuthError>) -> String {
        match result {
            Err(AuthError::Unauthenticated(message)) => message,
            other => panic!("expected Unauthenticated, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(
            extract_bearer_token(Some("  Bearer   abc.def  ")).unwrap(),
            "abc.def"
        );
    }

    #[test]
    fn test_extract_bearer_token_failures() {
        assert_eq!(
            unauthenticated_message(extract_bearer_token(None)),
            "Authorization(Bearer Token) header not found"
        );
        assert_eq!(
            unauthenticated_message(extract_bearer_token(Some("   "))),
            "Authorization(Bearer Token) header not found"
        );
        assert_eq!(
            unauthenticated_message(extract_bearer_token(Some("Token abc"))),
            "header does not start with 'Bearer '"
        );
        assert_eq!(
            unauthenticated_message(extract_bearer_token(Some("bearer abc"))),
            "header does not start with 'Bearer '"
        );
        assert_eq!(
            unauthenticated_message(extract_bearer_token(Some("Bearer"))),
            "header does not start with 'Bearer '"
        );
    }

    #[tokio::test]
    async fn test_resolve_missing_user_is_not_found() {
        let tokens = tokens();
        let id = UserId::new();
        let token = tokens
            .issue_access_token(&id.to_string(), "gone@example.com", "student")
            .unwrap();

        let mut store = MockTestStore::new();
        store
            .expect_find_by_id()
            .withf(move |candidate| *candidate == id)
            .times(1)
            .returning(|_| Ok(None));

        let authenticator =
            SessionAuthenticator::new(Arc::new(store), tokens, StoreDeadline::default());
        let header = format!("Bearer {}", token);

        let result = authenticator.resolve(Some(&header)).await;
        assert!(matches!(result, Err(AuthError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_rejects_expired_token_without_store_lookup() {
        let tokens = tokens();
        let token = tokens
            .issue_access_token_at(
                &UserId::new().to_string(),
                "sara@example.com",
                "student",
                Utc::now() - Duration::hours(2),
            )
            .unwrap();

        let mut store = MockTestStore::new();
        store.expect_find_by_id().times(0);

        let authenticator =
            SessionAuthenticator::new(Arc::new(store), tokens, StoreDeadline::default());
        let header = format!("Bearer {}", token);

        assert_eq!(
            unauthenticated_message(authenticator.resolve(Some(&header)).await),
            "Invalid or expired token"
        );
    }

    #[tokio::test]
    async fn test_resolve_rejects_non_uuid_subject() {
        let tokens = tokens();
        let token = tokens
            .issue_access_token("not-a-uuid", "sara@example.com", "student")
            .unwrap();

        let mut store = MockTestStore::new();
        store.expect_find_by_id().times(0);

        let authenticator =
            SessionAuthenticator::new(Arc::new(store), tokens, StoreDeadline::default());
        let header = format!("Bearer {}", token);

        assert!(matches!(
            authenticator.resolve(Some(&header)).await,
            Err(AuthError::Unauthenticated(_))
        ));
    }
}
