use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::AccessClaims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::token;
use crate::token::RefreshToken;
use crate::token::TokenError;

/// Issues and verifies session credentials.
///
/// Access tokens are short-lived HS256 JWTs stamped with a fixed issuer;
/// refresh tokens are opaque random secrets (see [`crate::token`]).
pub struct TokenIssuer {
    jwt_handler: JwtHandler,
    issuer: String,
    access_ttl: Duration,
}

impl TokenIssuer {
    /// Create a new token issuer.
    ///
    /// # Arguments
    /// * `secret` - Symmetric secret for signing access tokens
    /// * `issuer` - Value written to, and required in, the `iss` claim
    /// * `access_ttl` - Lifetime of issued access tokens
    pub fn new(secret: &[u8], issuer: impl Into<String>, access_ttl: Duration) -> Self {
        let issuer = issuer.into();
        Self {
            jwt_handler: JwtHandler::new(secret).with_issuer(issuer.clone()),
            issuer,
            access_ttl,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Sign an access token for a subject, valid from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn issue_access_token(
        &self,
        subject: &str,
        email: &str,
        role: &str,
    ) -> Result<String, JwtError> {
        self.issue_access_token_at(subject, email, role, Utc::now())
    }

    /// Sign an access token whose validity window starts at `issued_at`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn issue_access_token_at(
        &self,
        subject: &str,
        email: &str,
        role: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = AccessClaims::new(
            subject,
            email,
            role,
            self.issuer.as_str(),
            issued_at,
            self.access_ttl,
        );
        self.jwt_handler.encode(&claims)
    }

    /// Mint a refresh token: plaintext for the client, hash for storage.
    ///
    /// # Errors
    /// * `EntropyUnavailable` - The OS random source failed
    pub fn issue_refresh_token(&self) -> Result<RefreshToken, TokenError> {
        token::generate_refresh_token()
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    /// * `UnexpectedAlgorithm` - Signed with anything but HS256
    /// * `InvalidSignature` - Signature check failed
    /// * `MissingClaim` - Subject, expiry, issued-at or issuer absent or empty
    /// * `TokenExpired` - Expiry is in the past
    /// * `InvalidToken` - Malformed or foreign-issuer token
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        if token.is_empty() {
            return Err(JwtError::InvalidToken("empty token".to_string()));
        }

        let claims: AccessClaims = self.jwt_handler.decode(token)?;

        if claims.sub.trim().is_empty() {
            return Err(JwtError::MissingClaim("sub".to_string()));
        }
        if claims.is_expired(Utc::now().timestamp()) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }
}
