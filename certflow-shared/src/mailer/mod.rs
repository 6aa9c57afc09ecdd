/// Outbound email capability
///
/// This module defines the mailer contract the assignment workflow notifies
/// through, plus the concrete transports:
///
/// - `Mailer`: the async trait seam
/// - `smtp`: production transport over lettre's async SMTP client
/// - `LogMailer`: development fallback that logs instead of sending
/// - `templates`: the notification message bodies
///
/// # Delivery Contract
///
/// Callers treat delivery as best-effort: a failed send is reported as an
/// error for logging, but the workflow never lets it fail the surrounding
/// step. Implementations must not log message bodies - provisioning emails
/// carry temporary credentials.
///
/// # Example
///
/// ```no_run
/// use certflow_shared::mailer::{Mailer, OutboundEmail};
///
/// # async fn example(mailer: &dyn Mailer) -> Result<(), certflow_shared::mailer::MailerError> {
/// mailer
///     .send(OutboundEmail {
///         to: "learner@example.com".to_string(),
///         subject: "Welcome".to_string(),
///         html: "<p>Hello</p>".to_string(),
///         text: "Hello".to_string(),
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```

pub mod smtp;
pub mod templates;

use async_trait::async_trait;

pub use smtp::{SmtpConfig, SmtpMailer};

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// Recipient or sender address failed to parse
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Message assembly failed
    #[error("Failed to build message: {0}")]
    BuildFailed(String),

    /// SMTP transport could not be constructed
    #[error("SMTP transport setup failed: {0}")]
    Transport(String),

    /// The relay rejected or dropped the message
    #[error("Failed to send message: {0}")]
    SendFailed(String),
}

/// A fully rendered outbound message
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    /// Recipient address
    pub to: String,

    /// Subject line
    pub subject: String,

    /// HTML body
    pub html: String,

    /// Plain-text alternative body
    pub text: String,
}

/// Mailer contract
///
/// Implementations deliver one rendered message and report failure without
/// side effects; retries and failure policy belong to the caller.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers a single message
    ///
    /// # Errors
    ///
    /// Returns a `MailerError` if the message cannot be built or the
    /// transport rejects it.
    async fn send(&self, email: OutboundEmail) -> Result<(), MailerError>;
}

/// Development mailer that logs instead of sending
///
/// Used when no SMTP relay is configured so the service stays runnable
/// locally. Logs recipient and subject only - bodies carry credentials.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl LogMailer {
    /// Creates a new log-only mailer
    pub fn new() -> Self {
        LogMailer
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailerError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "SMTP not configured; skipping email delivery"
        );
        Ok(())
    }
}
