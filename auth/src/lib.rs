//! Credential primitives for the authentication service.
//!
//! - Password hashing (Argon2id)
//! - Access tokens (HS256 JWT with a pinned algorithm and mandatory claims)
//! - Opaque refresh and email-verification tokens
//!
//! Nothing here knows about users, storage or HTTP; the service crate adapts
//! these pieces to its own domain.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("Sup3r!secret").unwrap();
//! assert!(hasher.verify("Sup3r!secret", &hash).unwrap());
//! assert!(!hasher.verify("wrong", &hash).unwrap());
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::TokenIssuer;
//! use chrono::Duration;
//!
//! let issuer = TokenIssuer::new(b"secret_key_at_least_32_bytes_long!", "talentspal", Duration::hours(1));
//!
//! let access_token = issuer.issue_access_token("user123", "alice@example.com", "student").unwrap();
//! let claims = issuer.verify_access_token(&access_token).unwrap();
//! assert_eq!(claims.sub, "user123");
//!
//! // The client keeps the plaintext, the store keeps the hash.
//! let refresh = issuer.issue_refresh_token().unwrap();
//! assert!(auth::token::refresh_token_matches(&refresh.plaintext, &refresh.hash));
//! ```

pub mod issuer;
pub mod jwt;
pub mod password;
pub mod token;

pub use issuer::TokenIssuer;
pub use jwt::AccessClaims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::RefreshToken;
pub use token::TokenError;
