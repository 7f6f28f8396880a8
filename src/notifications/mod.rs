// ABOUTME: Email notification dispatcher with bulk all-settle fan-out
// ABOUTME: Renders templates and submits them through a pluggable SMTP transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Notification dispatcher
//!
//! Route handlers never send mail inline with the response; they
//! `tokio::spawn` a dispatch and log failures. Bulk sends fan out all
//! recipients concurrently and collect one outcome per recipient; a
//! failing recipient never aborts or blocks the others.

pub mod templates;

pub use templates::{
    EmailTemplate, MarketProduct, MarketUpdateData, RenderedEmail, WeatherAlertData,
};

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use crate::config::SmtpConfig;
use crate::errors::{AppError, AppResult};

/// A rendered email addressed to one recipient
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
}

/// Transport seam between the dispatcher and the delivery path
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Delivers one email
    async fn deliver(&self, email: &OutboundEmail) -> AppResult<()>;
}

/// SMTP transport backed by lettre
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailTransport {
    /// Builds the transport from SMTP configuration
    ///
    /// # Errors
    /// Returns an error if the relay host or from address is invalid
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let from = config.from_address.parse::<Mailbox>().map_err(|e| {
            AppError::internal(
                "Email configuration error",
                "An unexpected error occurred",
                format!("invalid EMAIL_FROM address: {e}"),
            )
        })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| {
                AppError::internal(
                    "Email configuration error",
                    "An unexpected error occurred",
                    format!("invalid SMTP relay {}: {e}", config.host),
                )
            })?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, email: &OutboundEmail) -> AppResult<()> {
        let to = email.to.parse::<Mailbox>().map_err(|e| {
            AppError::internal(
                "Email sending failed",
                "Unable to send email",
                format!("invalid recipient {}: {e}", email.to),
            )
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| {
                AppError::internal(
                    "Email sending failed",
                    "Unable to send email",
                    format!("failed to build message: {e}"),
                )
            })?;

        self.transport.send(message).await.map_err(|e| {
            AppError::internal(
                "Email sending failed",
                "Unable to send email",
                format!("SMTP delivery to {} failed: {e}", email.to),
            )
        })?;

        Ok(())
    }
}

/// Per-recipient outcome of a bulk send
#[derive(Debug)]
pub struct BulkOutcome {
    /// Recipient address
    pub recipient: String,
    /// Delivery result for this recipient alone
    pub result: AppResult<()>,
}

/// Notification dispatcher: template rendering plus transport submission
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    frontend_url: String,
}

impl Notifier {
    /// Creates a dispatcher over a transport
    #[must_use]
    pub fn new(transport: Arc<dyn MailTransport>, frontend_url: impl Into<String>) -> Self {
        Self {
            transport,
            frontend_url: frontend_url.into(),
        }
    }

    /// Renders and sends one email
    ///
    /// # Errors
    /// Returns the transport failure; callers decide whether to propagate
    /// or log-and-discard
    pub async fn send(&self, to: &str, template: &EmailTemplate) -> AppResult<()> {
        let rendered = template.render(&self.frontend_url);
        let email = OutboundEmail {
            to: to.to_owned(),
            subject: rendered.subject,
            html: rendered.html,
        };

        self.transport.deliver(&email).await?;
        info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }

    /// Sends one template to many recipients concurrently
    ///
    /// All recipients are attempted regardless of individual failures;
    /// the returned outcomes are in recipient order.
    pub async fn send_bulk(
        &self,
        recipients: &[String],
        template: &EmailTemplate,
    ) -> Vec<BulkOutcome> {
        let sends = recipients.iter().map(|recipient| async move {
            let result = self.send(recipient, template).await;
            if let Err(err) = &result {
                error!(recipient = %recipient, error = %err, "bulk email delivery failed");
            }
            BulkOutcome {
                recipient: recipient.clone(),
                result,
            }
        });

        join_all(sends).await
    }
}
