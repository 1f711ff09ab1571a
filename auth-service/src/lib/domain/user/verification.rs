use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use tokio::sync::oneshot;

use crate::domain::user::deadline::StoreDeadline;
use crate::domain::user::models::User;
use crate::domain::user::models::VerificationEmail;
use crate::domain::user::models::VerificationToken;
use crate::user::errors::AuthError;
use crate::user::errors::EmailDeliveryError;
use crate::user::ports::CredentialStore;
use crate::user::ports::EmailSender;

/// Lifetime of an email verification token.
pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

/// Issues one-time verification tokens, sends them, and redeems them.
pub struct EmailVerificationFlow<CS, ES>
where
    CS: CredentialStore,
    ES: EmailSender,
{
    store: Arc<CS>,
    sender: Arc<ES>,
    deadline: StoreDeadline,
}

impl<CS, ES> EmailVerificationFlow<CS, ES>
where
    CS: CredentialStore,
    ES: EmailSender,
{
    pub fn new(store: Arc<CS>, sender: Arc<ES>, deadline: StoreDeadline) -> Self {
        Self {
            store,
            sender,
            deadline,
        }
    }

    /// Mint a token that stays redeemable for 24 hours from `now`.
    ///
    /// # Errors
    /// * `Entropy` - Random source failed
    pub fn issue(&self, now: DateTime<Utc>) -> Result<VerificationToken, AuthError> {
        Ok(VerificationToken {
            token: auth::token::generate_verification_token()?,
            expires_at: now + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS),
        })
    }

    /// Hand the email to its own task.
    ///
    /// The task owns the message, so dropping the caller does not cancel the
    /// send. Its outcome arrives once on the returned receiver.
    pub fn dispatch(
        &self,
        email: VerificationEmail,
    ) -> oneshot::Receiver<Result<(), EmailDeliveryError>> {
        let sender = Arc::clone(&self.sender);
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(async move {
            let outcome = sender.send_verification_email(email).await;
            // Receiver gone means nobody is watching; nothing left to do.
            let _ = done_tx.send(outcome);
        });

        done_rx
    }

    /// Dispatch and log a failed delivery. Never surfaces the failure.
    pub fn dispatch_and_forget(&self, email: VerificationEmail) {
        let recipient = email.to.to_string();
        let done = self.dispatch(email);

        tokio::spawn(async move {
            match done.await {
                Ok(Ok(())) => {
                    tracing::info!(recipient = %recipient, "Verification email sent");
                }
                Ok(Err(e)) => {
                    tracing::error!(
                        recipient = %recipient,
                        error = %e,
                        "Failed to send verification email"
                    );
                }
                Err(_) => {
                    tracing::error!(
                        recipient = %recipient,
                        "Verification email task ended without reporting"
                    );
                }
            }
        });
    }

    /// Mark verified the user holding `token`, if it is still live.
    ///
    /// Wrong and expired tokens are not told apart.
    ///
    /// # Errors
    /// * `InvalidVerificationToken` - Blank, unknown, used or expired token
    pub async fn redeem(&self, token: &str, now: DateTime<Utc>) -> Result<User, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidVerificationToken);
        }

        self.deadline
            .run(self.store.redeem_verification_token(token, now))
            .await?
            .ok_or(AuthError::InvalidVerificationToken)
    }
}
