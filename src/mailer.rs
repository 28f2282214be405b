use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::SmtpConfig;

/// MailerError
///
/// Delivery failures surfaced by the mailer implementations.
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("email build error: {0}")]
    Build(String),
}

// 1. Mailer Contract
/// Mailer
///
/// Defines the abstract contract for confirmation-code delivery. This trait allows
/// us to swap the concrete implementation, from the real SMTP client (SmtpMailer)
/// in production to the console writer (LogMailer) or the in-memory Mock
/// (MockMailer) during testing, without affecting the calling handlers.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers the confirmation code issued at signup to the given address.
    async fn send_confirmation_code(
        &self,
        to: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailerError>;
}

// 2. The Real Implementation (SMTP)
/// SmtpMailer
///
/// The concrete implementation using lettre's async SMTP transport with
/// STARTTLS. Credentials are optional so that unauthenticated local relays
/// keep working.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    /// new
    ///
    /// Constructs the mailer from the SMTP block of AppConfig.
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_confirmation_code(
        &self,
        to: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailerError> {
        use lettre::{
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
            message::header::ContentType, transport::smtp::authentication::Credentials,
        };

        let body = format!(
            "Hello {username},\n\nYour confirmation code is: {code}\n\n\
             Exchange it at POST /api/v1/auth/token for an access token.\n"
        );

        let email = Message::builder()
            .from(self.config.from.parse()?)
            .to(to.parse()?)
            .subject("Your confirmation code")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| MailerError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
                .port(self.config.port);

        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport_builder.build().send(email).await?;

        tracing::info!(to = to, "confirmation email sent");
        Ok(())
    }
}

// 3. Console Delivery (Local Development)
/// LogMailer
///
/// Writes the confirmation code to the log instead of sending mail. Used
/// whenever no SMTP relay is configured, so the signup flow stays usable on a
/// developer machine.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation_code(
        &self,
        to: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailerError> {
        tracing::info!(
            to = to,
            username = username,
            code = code,
            "confirmation code (console delivery)"
        );
        Ok(())
    }
}

// 4. The Mock Implementation (For Unit Tests)
/// SentMail
///
/// One captured delivery in the mock outbox.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub username: String,
    pub code: String,
}

/// MockMailer
///
/// A mock implementation of `Mailer` used exclusively for testing. Captured
/// deliveries land in a shared outbox so tests can drive the full
/// signup → code → token flow without a relay.
#[derive(Clone, Default)]
pub struct MockMailer {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    pub outbox: Arc<Mutex<Vec<SentMail>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// The most recently issued code for the given username, if any.
    pub fn last_code_for(&self, username: &str) -> Option<String> {
        self.outbox
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|mail| mail.username == username)
            .map(|mail| mail.code.clone())
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_confirmation_code(
        &self,
        to: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailerError> {
        if self.should_fail {
            return Err(MailerError::Build(
                "Mock Mailer Error: Simulation requested".to_string(),
            ));
        }

        self.outbox.lock().unwrap().push(SentMail {
            to: to.to_string(),
            username: username.to_string(),
            code: code.to_string(),
        });
        Ok(())
    }
}

/// MailerState
///
/// The concrete type used to share the mailer across the application state.
pub type MailerState = Arc<dyn Mailer>;
