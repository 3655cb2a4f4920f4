use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use log::{debug, error};

use super::{Notification, NotificationSink};
use crate::core::config::EmailConfig;
use crate::crm::CrmError;

/// SMTP delivery through lettre's blocking transport.
#[derive(Clone)]
pub struct SmtpSink {
    mailer: SmtpTransport,
    from: String,
}

impl std::fmt::Debug for SmtpSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSink")
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

impl SmtpSink {
    pub fn from_config(config: &EmailConfig) -> anyhow::Result<Self> {
        let mailer = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => SmtpTransport::relay(&config.smtp_host)
                .map_err(|e| anyhow::anyhow!("SMTP relay error: {e}"))?
                .port(config.smtp_port)
                .credentials(Credentials::new(user.clone(), pass.clone()))
                .build(),
            _ => SmtpTransport::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build(),
        };
        Ok(Self {
            mailer,
            from: config.from.clone(),
        })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, CrmError> {
        Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| CrmError::NotificationFailure(format!("Invalid from address: {e}")))?,
            )
            .to(notification
                .recipient
                .parse()
                .map_err(|e| CrmError::NotificationFailure(format!("Invalid to address: {e}")))?)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| CrmError::NotificationFailure(format!("Failed to build email: {e}")))
    }
}

#[async_trait]
impl NotificationSink for SmtpSink {
    async fn send(&self, notification: Notification) -> Result<(), CrmError> {
        let message = self.build_message(&notification)?;
        let mailer = self.mailer.clone();
        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| CrmError::NotificationFailure(format!("Task join error: {e}")))?
            .map_err(|e| {
                error!("Failed to send email to {}: {e}", notification.recipient);
                CrmError::NotificationFailure(format!("Failed to send email: {e}"))
            })?;
        debug!("Email sent to {}", notification.recipient);
        Ok(())
    }
}
