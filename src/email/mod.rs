//! Outbound notifications for CRM events.
//!
//! Delivery is best effort: the dispatcher spawns each send after the triggering
//! mutation has committed and only logs failures.

#[cfg(feature = "mail")]
pub mod smtp;

use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

use crate::core::shared::models::{AgentProfile, Lead, Organization};
use crate::crm::CrmError;

#[cfg(feature = "mail")]
pub use smtp::SmtpSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn lead_created(recipient: &str, lead: &Lead) -> Self {
        Self::new(
            recipient,
            "A lead has been created",
            format!(
                "{} {} was added to your leads. Go to the site to see it.",
                lead.first_name, lead.last_name
            ),
        )
    }

    pub fn agent_added(agent: &AgentProfile, organization: Option<&Organization>) -> Self {
        let workspace = organization
            .map(|o| format!(" for {}", o.name))
            .unwrap_or_default();
        Self::new(
            agent.user.email.clone(),
            "You are invited to be an agent",
            format!(
                "You were added as an agent{workspace} with the username {}. \
                 Please log in to start working.",
                agent.user.username
            ),
        )
    }

    pub fn lead_assigned(agent: &AgentProfile, lead: &Lead) -> Self {
        Self::new(
            agent.user.email.clone(),
            "A lead has been assigned to you",
            format!(
                "{} {} is now assigned to you.",
                lead.first_name, lead.last_name
            ),
        )
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), CrmError>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, notification: Notification) -> Result<(), CrmError> {
        info!(
            "Notification to {}: {} - {}",
            notification.recipient, notification.subject, notification.body
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub fn log_only() -> Self {
        Self::new(Arc::new(LogSink))
    }

    /// Sends in the background. The returned handle is only awaited by tests.
    pub fn dispatch(&self, notification: Notification) -> tokio::task::JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let recipient = notification.recipient.clone();
            if let Err(e) = sink.send(notification).await {
                warn!("Failed to notify {recipient}: {e}");
            }
        })
    }
}
