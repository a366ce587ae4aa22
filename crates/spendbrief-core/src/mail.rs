//! Report delivery by email
//!
//! `Mailer` is the delivery seam; `SmtpMailer` sends over SMTP with implicit
//! TLS using lettre's async transport.
//!
//! # Configuration
//!
//! - `SMTP_HOST` - outbound mail host (required)
//! - `SMTP_PORT` - port (default: 465)
//! - `SMTP_USER` / `SMTP_PASS` - credentials (required)
//! - `SMTP_FROM` - from address, e.g. `Budget Bot <bot@example.com>` (required)
//! - `EMAIL_RECIPIENTS` - comma-separated recipient addresses (required)

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::ynab::required_env;

pub const SMTP_HOST_ENV: &str = "SMTP_HOST";
pub const SMTP_PORT_ENV: &str = "SMTP_PORT";
pub const SMTP_USER_ENV: &str = "SMTP_USER";
pub const SMTP_PASS_ENV: &str = "SMTP_PASS";
pub const SMTP_FROM_ENV: &str = "SMTP_FROM";
pub const EMAIL_RECIPIENTS_ENV: &str = "EMAIL_RECIPIENTS";

pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const DEFAULT_SUBJECT: &str = "YNAB Weekly Report";

/// A rendered report ready to send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Delivers a rendered report
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &ReportEmail) -> Result<()>;
}

/// SMTP settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub recipients: Vec<String>,
}

impl SmtpConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let host = required_env(SMTP_HOST_ENV)?;
        let port = match std::env::var(SMTP_PORT_ENV).ok().filter(|s| !s.is_empty()) {
            Some(port) => port.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a port number, got {:?}", SMTP_PORT_ENV, port))
            })?,
            None => DEFAULT_SMTP_PORT,
        };
        let username = required_env(SMTP_USER_ENV)?;
        let password = required_env(SMTP_PASS_ENV)?;
        let from = required_env(SMTP_FROM_ENV)?;
        let recipients = parse_recipients(&required_env(EMAIL_RECIPIENTS_ENV)?);

        if recipients.is_empty() {
            return Err(Error::Config(format!(
                "{} must list at least one address",
                EMAIL_RECIPIENTS_ENV
            )));
        }

        Ok(Self {
            host,
            port,
            username,
            password,
            from,
            recipients,
        })
    }
}

/// Split a comma-separated recipient list
pub fn parse_recipients(s: &str) -> Vec<String> {
    s.split(',')
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| Error::Config(format!("Invalid email address {:?}: {}", address, e)))
}

/// SMTP delivery over implicit TLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let from = parse_mailbox(&config.from)?;
        let recipients = config
            .recipients
            .iter()
            .map(|r| parse_mailbox(r))
            .collect::<Result<Vec<_>>>()?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| Error::Mail(format!("Failed to configure SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        Ok(Self {
            transport,
            from,
            recipients,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(SmtpConfig::from_env()?)
    }

    fn build_message(&self, email: &ReportEmail) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email.subject.clone());
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| Error::Mail(format!("Failed to build message: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &ReportEmail) -> Result<()> {
        let message = self.build_message(email)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| Error::Mail(format!("SMTP send failed: {}", e)))?;

        debug!(
            recipients = self.recipients.len(),
            code = %response.code(),
            "Report email accepted"
        );
        Ok(())
    }
}
