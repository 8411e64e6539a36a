//! Outbound alerting: at most one fixed-content mail per run.
//!
//! The alert deliberately carries no board detail; it only says that
//! something changed. Per-board information stays in the store and the run
//! log.

use crate::model::Credentials;
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use tracing::info;

pub const ALERT_SUBJECT: &str = "webDiplomacy alert";
pub const ALERT_BODY: &str = "check webDiplomacy, something happened";

/// Delivery seam for the end-of-run alert.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_alert(&self) -> Result<()>;
}

/// SMTP-backed notifier. Opens one authenticated STARTTLS session per send.
pub struct SmtpNotifier {
    creds: Credentials,
}

impl SmtpNotifier {
    pub fn new(creds: Credentials) -> Self {
        Self { creds }
    }
}

impl fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("server", &self.creds.smtp_server)
            .finish_non_exhaustive()
    }
}

/// Build the fixed alert message from the stored addresses.
pub fn build_alert_message(creds: &Credentials) -> Result<Message> {
    let from: Mailbox = creds
        .smtp_from
        .parse()
        .context("invalid from address in stored credentials")?;
    let to: Mailbox = creds
        .smtp_to
        .parse()
        .context("invalid to address in stored credentials")?;
    Message::builder()
        .from(from)
        .to(to)
        .subject(ALERT_SUBJECT)
        .body(ALERT_BODY.to_string())
        .context("failed to build alert message")
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_alert(&self) -> Result<()> {
        let message = build_alert_message(&self.creds)?;
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.creds.smtp_server)
            .context("invalid SMTP server name")?
            .port(self.creds.smtp_port)
            .credentials(SmtpCredentials::new(
                self.creds.smtp_user.clone(),
                self.creds.smtp_password.clone(),
            ))
            .build();
        mailer
            .send(message)
            .await
            .context("failed to deliver alert mail")?;
        info!(to = %self.creds.smtp_to, "alert mail sent");
        Ok(())
    }
}
