use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::config::SmtpConfig;
use crate::domain::user::models::VerificationEmail;
use crate::domain::user::ports::EmailSender;
use crate::user::errors::EmailDeliveryError;

pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    app_name: String,
    frontend_url: String,
}

impl SmtpEmailSender {
    /// # Errors
    /// * `BuildFailed` - Relay host or sender address is unusable
    pub fn new(config: &SmtpConfig, frontend_url: &str) -> Result<Self, EmailDeliveryError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let transport = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| EmailDeliveryError::BuildFailed(e.to_string()))?
                .port(config.port)
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .credentials(creds)
                .build()
        };

        let from = format!("{} <{}>", config.app_name, config.from)
            .parse::<Mailbox>()
            .map_err(|e| EmailDeliveryError::BuildFailed(e.to_string()))?;

        Ok(Self {
            transport,
            from,
            app_name: config.app_name.clone(),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        })
    }

    fn verification_link(&self, token: &str) -> String {
        format!("{}/verify-email?token={}", self.frontend_url, token)
    }

    fn verification_body(&self, email: &VerificationEmail) -> String {
        let link = self.verification_link(&email.token);
        format!(
            r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Welcome to {app}, {name}!</h2>
  <p>Please confirm your email address to activate your account.</p>
  <p><a href="{link}" style="display: inline-block; padding: 12px 24px; background: #2563eb; color: #fff; text-decoration: none; border-radius: 6px;">Verify email</a></p>
  <p>Or paste this link into your browser:<br><a href="{link}">{link}</a></p>
  <p>The link expires in 24 hours. If you did not create an account, ignore this email.</p>
</div>"#,
            app = escape_html(&self.app_name),
            name = escape_html(&email.full_name),
            link = escape_html(&link),
        )
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_verification_email(
        &self,
        email: VerificationEmail,
    ) -> Result<(), EmailDeliveryError> {
        let to = email
            .to
            .as_str()
            .parse::<Mailbox>()
            .map_err(|e| EmailDeliveryError::BuildFailed(e.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(format!("Verify your {} account", self.app_name))
            .header(ContentType::TEXT_HTML)
            .body(self.verification_body(&email))
            .map_err(|e| EmailDeliveryError::BuildFailed(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailDeliveryError::SendFailed(e.to_string()))?;

        tracing::debug!(to = %email.to, "Verification email sent");
        Ok(())
    }
}
