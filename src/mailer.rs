use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::config::Config;

pub const CONTACT_SUBJECT: &str = "New Visitor to Blogs";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp transport failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
}

/// Delivers mail to the site owner.
#[axum::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: String,
}

impl SmtpMailer {
    /// STARTTLS relay authenticated with the sender's credentials.
    pub fn new(config: &Config) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.mail_sender.clone(),
                config.mail_password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: config.mail_sender.clone(),
            to: config.mail_recipient.clone(),
        })
    }
}

#[axum::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let from = self.from.parse::<Mailbox>()?;
        let to = self.to.parse::<Mailbox>()?;
        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.as_str())
            .header(header::ContentType::TEXT_PLAIN)
            .body(mail.body)?;

        self.transport.send(message).await?;
        tracing::info!(subject = %mail.subject, recipient = %self.to, "email sent");
        Ok(())
    }
}
