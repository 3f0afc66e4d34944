//! Email delivery for password-reset links
//!
//! Thin wrapper over an async SMTP transport. Delivery failures are the
//! caller's concern to log; the forgot-password handler never lets a mail
//! error change its response.

use anyhow::Result;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

/// Mailer configuration
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP relay port
    pub smtp_port: u16,
    /// SMTP username; when unset the transport connects unauthenticated
    pub smtp_username: Option<String>,
    /// SMTP password
    pub smtp_password: Option<String>,
    /// From address for outgoing mail
    pub from: String,
    /// Base URL the reset token is appended to
    pub reset_link_base: String,
}

impl MailerConfig {
    /// Create a new MailerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SMTP_HOST`: SMTP relay host (default: "localhost")
    /// - `SMTP_PORT`: SMTP relay port (default: 587)
    /// - `SMTP_USERNAME` / `SMTP_PASSWORD`: relay credentials (optional)
    /// - `MAIL_FROM`: From address (default: "Lumen <no-reply@lumenpages.dev>")
    /// - `RESET_LINK_BASE`: base URL for reset links
    ///   (default: "http://localhost:5173/admin/reset-password")
    pub fn from_env() -> Result<Self> {
        let smtp_host = std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string());
        let smtp_port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);
        let smtp_username = std::env::var("SMTP_USERNAME").ok();
        let smtp_password = std::env::var("SMTP_PASSWORD").ok();
        let from = std::env::var("MAIL_FROM")
            .unwrap_or_else(|_| "Lumen <no-reply@lumenpages.dev>".to_string());
        let reset_link_base = std::env::var("RESET_LINK_BASE")
            .unwrap_or_else(|_| "http://localhost:5173/admin/reset-password".to_string());

        Ok(MailerConfig {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from,
            reset_link_base,
        })
    }
}

/// Async SMTP mailer
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    reset_link_base: String,
}

impl Mailer {
    /// Build a mailer from configuration
    pub fn new(config: &MailerConfig) -> Result<Self> {
        let transport = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                    .port(config.smtp_port)
                    .credentials(Credentials::new(username.clone(), password.clone()))
                    .build()
            }
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build(),
        };

        let from = config
            .from
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid MAIL_FROM address: {}", e))?;

        Ok(Mailer {
            transport,
            from,
            reset_link_base: config.reset_link_base.clone(),
        })
    }

    /// Send an HTML email
    pub async fn send(&self, to: &str, subject: &str, html: String) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid recipient address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        self.transport.send(message).await?;
        info!("Sent \"{}\" email to {}", subject, to);
        Ok(())
    }

    /// Send a password-reset link carrying the raw token
    pub async fn send_reset_email(&self, to: &str, raw_token: &str) -> Result<()> {
        let link = format!("{}?token={}", self.reset_link_base, raw_token);
        let html = format!(
            "<p>A password reset was requested for your Lumen admin account.</p>\
             <p><a href=\"{link}\">Reset your password</a></p>\
             <p>The link expires in one hour. If you did not request this, you can ignore this email.</p>"
        );

        self.send(to, "Reset your Lumen admin password", html).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_mailer_config_defaults() {
        unsafe {
            std::env::remove_var("SMTP_HOST");
            std::env::remove_var("SMTP_PORT");
            std::env::remove_var("MAIL_FROM");
        }

        let config = MailerConfig::from_env().unwrap();
        assert_eq!(config.smtp_host, "localhost");
        assert_eq!(config.smtp_port, 587);
        assert!(config.from.contains("no-reply@lumenpages.dev"));
    }

    #[test]
    fn test_invalid_from_address_rejected() {
        let config = MailerConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            from: "not an address".to_string(),
            reset_link_base: "http://localhost/reset".to_string(),
        };

        assert!(Mailer::new(&config).is_err());
    }
}
