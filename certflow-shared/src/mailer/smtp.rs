/// SMTP mailer over lettre
///
/// Production transport for notification email. Uses lettre's async SMTP
/// client on the tokio runtime with a credentialed TLS relay; messages are
/// sent as multipart plain+HTML.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Mailer, MailerError, OutboundEmail};

/// SMTP relay configuration
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Relay hostname (e.g., "smtp.mailgun.org")
    pub host: String,

    /// Relay username
    pub username: String,

    /// Relay password
    pub password: String,

    /// Sender address for all outbound mail
    pub from_address: String,
}

/// Mailer backed by an SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Creates an SMTP mailer from relay configuration
    ///
    /// # Errors
    ///
    /// Returns `MailerError::InvalidAddress` if the sender address does not
    /// parse, or `MailerError::Transport` if the relay transport cannot be
    /// constructed.
    pub fn new(config: SmtpConfig) -> Result<Self, MailerError> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| MailerError::InvalidAddress(format!("sender {}: {}", config.from_address, e)))?;

        let creds = Credentials::new(config.username, config.password);
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| MailerError::Transport(e.to_string()))?
            .credentials(creds)
            .build();

        Ok(SmtpMailer { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailerError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| MailerError::InvalidAddress(format!("recipient {}: {}", email.to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))
            .map_err(|e| MailerError::BuildFailed(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailerError::SendFailed(e.to_string()))?;

        Ok(())
    }
}
