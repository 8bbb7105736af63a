//! Email service for account links and enquiries.
//!
//! Uses SMTP via lettre with plain-text Askama templates. Without SMTP
//! configuration the service runs in log mode: messages are built exactly as
//! they would be sent and then written to the log.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::Enquiry;

/// Sender used in log mode.
const LOG_MODE_FROM: &str = "WENDY WOO <noreply@wendywoo.local>";

#[derive(Template)]
#[template(path = "email/verify_email.txt")]
struct VerifyEmailText<'a> {
    first_name: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/enquiry_confirmation.txt")]
struct EnquiryConfirmationText<'a> {
    enquiry: &'a Enquiry,
}

#[derive(Template)]
#[template(path = "email/enquiry_notification.txt")]
struct EnquiryNotificationText<'a> {
    enquiry: &'a Enquiry,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Attachment MIME type could not be parsed.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Clone)]
enum Delivery {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Log,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    delivery: Delivery,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            delivery: Delivery::Smtp(mailer),
            from_address: config.from_address.clone(),
        })
    }

    /// A service that logs messages instead of sending them.
    #[must_use]
    pub fn log_only() -> Self {
        Self {
            delivery: Delivery::Log,
            from_address: LOG_MODE_FROM.to_string(),
        }
    }

    /// Send the account verification link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_verification(
        &self,
        to: &str,
        first_name: &str,
        link: &str,
    ) -> Result<(), EmailError> {
        let body = VerifyEmailText { first_name, link }.render()?;
        let message = self.text_message(to, "Verify Your WENDY WOO Account", body)?;
        self.deliver(message).await
    }

    /// Send the password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        link: &str,
    ) -> Result<(), EmailError> {
        let body = PasswordResetText { name, link }.render()?;
        let message = self.text_message(to, "Password Reset Request - WENDY WOO", body)?;
        self.deliver(message).await
    }

    /// Confirm receipt of an enquiry to the customer, then forward it to the
    /// shop inbox with any photo attached.
    ///
    /// # Errors
    ///
    /// Returns error if either email fails to send.
    pub async fn send_enquiry(&self, enquiry: &Enquiry) -> Result<(), EmailError> {
        let confirmation = self.enquiry_confirmation(enquiry)?;
        self.deliver(confirmation).await?;

        let notification = self.enquiry_notification(enquiry)?;
        self.deliver(notification).await
    }

    fn enquiry_confirmation(&self, enquiry: &Enquiry) -> Result<Message, EmailError> {
        let body = EnquiryConfirmationText { enquiry }.render()?;
        self.text_message(
            enquiry.email.as_str(),
            "Thank you for your enquiry - WENDY WOO",
            body,
        )
    }

    fn enquiry_notification(&self, enquiry: &Enquiry) -> Result<Message, EmailError> {
        let subject = enquiry_subject(enquiry);
        let body = EnquiryNotificationText { enquiry }.render()?;
        let text = SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(body);

        let builder = Message::builder()
            .from(self.sender()?)
            .to(self.sender()?)
            .reply_to(parse_mailbox(enquiry.email.as_str())?)
            .subject(subject);

        let message = match &enquiry.photo {
            Some(photo) => {
                let content_type = ContentType::parse(photo.content_type)
                    .map_err(|_| EmailError::InvalidContentType(photo.content_type.to_string()))?;
                let attachment =
                    Attachment::new(photo.file_name.clone()).body(photo.bytes.clone(), content_type);
                builder.multipart(MultiPart::mixed().singlepart(text).singlepart(attachment))?
            }
            None => builder.singlepart(text)?,
        };
        Ok(message)
    }

    fn text_message(&self, to: &str, subject: &str, body: String) -> Result<Message, EmailError> {
        Ok(Message::builder()
            .from(self.sender()?)
            .to(parse_mailbox(to)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?)
    }

    fn sender(&self) -> Result<Mailbox, EmailError> {
        parse_mailbox(&self.from_address)
    }

    async fn deliver(&self, message: Message) -> Result<(), EmailError> {
        let to = message
            .envelope()
            .to()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let subject = message
            .headers()
            .get_raw("Subject")
            .unwrap_or_default()
            .to_string();

        match &self.delivery {
            Delivery::Smtp(mailer) => {
                mailer.send(message).await?;
                tracing::info!(to = %to, subject = %subject, "Email sent successfully");
            }
            Delivery::Log => {
                let formatted = String::from_utf8_lossy(&message.formatted()).into_owned();
                tracing::info!(to = %to, subject = %subject, "Email delivery disabled; logging message");
                tracing::debug!(message = %formatted, "Unsent email");
            }
        }
        Ok(())
    }
}

/// Subject of the shop-inbox copy of an enquiry.
fn enquiry_subject(enquiry: &Enquiry) -> String {
    if enquiry.photo.is_some() {
        format!("ENQUIRY WITH PHOTO - {}", enquiry.inquiry_type)
    } else {
        format!("Enquiry - {}", enquiry.inquiry_type)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}
