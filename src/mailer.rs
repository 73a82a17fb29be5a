use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Message;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &Message) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub relay: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Submits through an authenticated STARTTLS relay. Pooling is disabled, so
/// every send opens its own session and closes it when the call returns.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.relay)
            .map_err(|err| Error::Transport(err.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &Message) -> Result<()> {
        let email = lettre::Message::builder()
            .from(parse_mailbox(&message.from)?)
            .to(parse_mailbox(&message.to)?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|err| Error::Transport(err.to_string()))?;

        match self.transport.send(email).await {
            Ok(response) => {
                debug!(code = %response.code(), to = %message.to, "relay accepted message");
                Ok(())
            }
            Err(err) => Err(classify_smtp_error(&err)),
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|_| Error::Transport(format!("invalid mail address {address:?}")))
}

fn classify_smtp_error(err: &lettre::transport::smtp::Error) -> Error {
    let detail = err.to_string();
    let auth_rejected = err.is_permanent()
        && (detail.contains("5.7.8") || detail.to_ascii_lowercase().contains("auth"));

    if auth_rejected {
        Error::Auth(detail)
    } else {
        Error::Transport(detail)
    }
}

/// Prints each message to stdout instead of dispatching it.
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, message: &Message) -> Result<()> {
        println!("From: {}", message.from);
        println!("To: {}", message.to);
        println!("Subject: {}", message.subject);
        println!();
        println!("{}", message.body);
        println!("{}", "=".repeat(60));
        Ok(())
    }
}
