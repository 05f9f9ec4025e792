//! Order email notifications.
//!
//! Best-effort by contract: every send is dispatched on a detached task,
//! is never awaited on the request path, and logs failures without
//! touching the order state that triggered it.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::Order;

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
}

/// Email service for order notifications.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
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
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send an order confirmation.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or sent.
    pub async fn send_order_confirmation(&self, to: &str, order: &Order) -> Result<(), EmailError> {
        let body = format!(
            "Thanks for your order!\n\n\
             Order #{} was placed successfully.\n\
             Items: {}\n\
             Total: {}\n\n\
             We'll email you again when it ships.\n",
            order.id,
            order.items.len(),
            order.total_price,
        );

        self.send_plain(to, &format!("Olive Edge order #{} confirmed", order.id), &body)
            .await
    }

    /// Send a delivery notice.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or sent.
    pub async fn send_delivery_notice(&self, to: &str, order: &Order) -> Result<(), EmailError> {
        let body = format!(
            "Good news!\n\n\
             Order #{} has been delivered.\n\
             If anything is wrong with it, you can request a return from\n\
             your order page.\n",
            order.id,
        );

        self.send_plain(to, &format!("Olive Edge order #{} delivered", order.id), &body)
            .await
    }

    /// Send a plain text email.
    async fn send_plain(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Fire-and-forget order confirmation.
///
/// Spawns a detached task; the caller's response never waits on SMTP, and
/// a failed send only produces a log line. A `None` service (SMTP not
/// configured) is a logged no-op.
pub fn dispatch_order_confirmation(service: Option<&EmailService>, to: String, order: Order) {
    let Some(service) = service.cloned() else {
        tracing::debug!(order_id = %order.id, "SMTP not configured, skipping confirmation email");
        return;
    };

    tokio::spawn(async move {
        if let Err(e) = service.send_order_confirmation(&to, &order).await {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to send order confirmation");
        }
    });
}

/// Fire-and-forget delivery notice.
pub fn dispatch_delivery_notice(service: Option<&EmailService>, to: String, order: Order) {
    let Some(service) = service.cloned() else {
        tracing::debug!(order_id = %order.id, "SMTP not configured, skipping delivery notice");
        return;
    };

    tokio::spawn(async move {
        if let Err(e) = service.send_delivery_notice(&to, &order).await {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to send delivery notice");
        }
    });
}
