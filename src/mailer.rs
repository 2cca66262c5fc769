use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::AppConfig;

/// Outbound mail delivery. Implementations must not be relied on for
/// request correctness: callers fire and forget, and failures are logged
/// rather than surfaced.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<()>;
}

pub struct SmtpMailer {
    transport: SmtpTransport,
    from: String,
}

impl SmtpMailer {
    pub fn from_config(config: &AppConfig, host: &str) -> Result<Self> {
        let mut builder = SmtpTransport::starttls_relay(host)
            .context("failed to build SMTP transport")?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) =
            (config.smtp_username.clone(), config.smtp_password.clone())
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.mail_from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.parse().context("invalid sender address")?)
            .to(recipient.parse().context("invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .context("failed to build email message")?;

        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .context("mail send task panicked")?
            .context("SMTP delivery failed")?;

        Ok(())
    }
}

/// Used when no SMTP host is configured; keeps notification side effects
/// observable in logs without requiring a mail server.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, recipient: &str, subject: &str, _html_body: &str) -> Result<()> {
        tracing::info!(recipient, subject, "SMTP not configured, email dropped");
        Ok(())
    }
}
