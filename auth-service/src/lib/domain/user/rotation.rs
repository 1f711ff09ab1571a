use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::domain::user::models::RefreshSession;
use crate::user::errors::AuthError;

/// Whether the stored refresh session can still be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Present and not yet expired
    Fresh,
    /// Missing or expired
    Stale,
}

/// Decision taken for one login or verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    /// Client keeps the refresh token it already holds.
    Keep { expires_at: DateTime<Utc> },
    /// New secret: `plaintext` goes to the client, `session` to the store.
    Rotate {
        plaintext: String,
        session: RefreshSession,
    },
}

impl Rotation {
    pub fn is_new(&self) -> bool {
        matches!(self, Rotation::Rotate { .. })
    }
}

/// Refresh tokens are replaced only once they lapse.
#[derive(Debug, Clone, Copy)]
pub struct RefreshRotationPolicy {
    ttl: Duration,
}

impl RefreshRotationPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn state(current: Option<&RefreshSession>, now: DateTime<Utc>) -> RefreshState {
        match current {
            Some(session) if session.expires_at > now => RefreshState::Fresh,
            _ => RefreshState::Stale,
        }
    }

    /// Keep a fresh session as-is or mint a replacement for a stale one.
    ///
    /// # Errors
    /// * `Entropy` - Random source failed while minting
    pub fn evaluate(
        &self,
        current: Option<&RefreshSession>,
        now: DateTime<Utc>,
    ) -> Result<Rotation, AuthError> {
        if let (RefreshState::Fresh, Some(session)) = (Self::state(current, now), current) {
            return Ok(Rotation::Keep {
                expires_at: session.expires_at,
            });
        }

        let token = auth::token::generate_refresh_token()?;
        Ok(Rotation::Rotate {
            plaintext: token.plaintext,
            session: RefreshSession {
                token_hash: token.hash,
                expires_at: now + self.ttl,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use auth::token::refresh_token_matches;

    use super::*;

    fn policy() -> RefreshRotationPolicy {
        RefreshRotationPolicy::new(Duration::days(30))
    }

    #[test]
    fn test_missing_session_is_stale_and_rotates() {
        let now = Utc::now();

        assert_eq!(RefreshRotationPolicy::state(None, now), RefreshState::Stale);

        match policy().evaluate(None, now).unwrap() {
            Rotation::Rotate { plaintext, session } => {
                assert_eq!(plaintext.len(), 64);
                assert_ne!(plaintext, session.token_hash);
                assert!(refresh_token_matches(&plaintext, &session.token_hash));
                assert_eq!(session.expires_at, now + Duration::days(30));
            }
            other => panic!("expected rotation, got {:?}", other),
        }
    }

    #[test]
    fn test_fresh_session_is_kept_with_its_expiry() {
        let now = Utc::now();
        let current = RefreshSession {
            token_hash: "stored".to_string(),
            expires_at: now + Duration::days(3),
        };

        let rotation = policy().evaluate(Some(&current), now).unwrap();

        assert!(!rotation.is_new());
        assert_eq!(
            rotation,
            Rotation::Keep {
                expires_at: current.expires_at
            }
        );
    }

    #[test]
    fn test_expired_session_rotates_and_old_plaintext_stops_matching() {
        let now = Utc::now();
        let old = auth::token::generate_refresh_token().unwrap();
        let current = RefreshSession {
            token_hash: old.hash.clone(),
            expires_at: now,
        };

        assert_eq!(
            RefreshRotationPolicy::state(Some(&current), now),
            RefreshState::Stale
        );

        let rotation = policy().evaluate(Some(&current), now).unwrap();
        let Rotation::Rotate { session, .. } = rotation else {
            panic!("expected rotation");
        };
        assert!(!refresh_token_matches(&old.plaintext, &session.token_hash));
    }
}
