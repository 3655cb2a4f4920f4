//! Fixtures for unit tests.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::core::config::AppConfig;
use crate::core::shared::models::Lead;
use crate::core::shared::state::AppState;
use crate::crm::types::{CreateAgentRequest, CreateLeadRequest, SignupRequest};
use crate::crm::{CrmError, CrmServices, CrmStore, MemoryStore};
use crate::email::{Notification, NotificationDispatcher, NotificationSink};
use crate::security::identity::Requester;
use crate::security::jwt::JwtManager;
use crate::security::password::{Argon2Config, CredentialHasher};

pub const TEST_JWT_SECRET: &str = "test-secret-key-with-at-least-32-chars!";
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Forwards every notification to a channel.
#[derive(Debug)]
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl RecordingSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: Notification) -> Result<(), CrmError> {
        self.tx
            .send(notification)
            .map_err(|e| CrmError::NotificationFailure(e.to_string()))
    }
}

pub fn test_hasher() -> CredentialHasher {
    match CredentialHasher::new(&Argon2Config::low_memory()) {
        Ok(hasher) => hasher,
        Err(e) => panic!("low-memory argon2 parameters rejected: {e}"),
    }
}

pub fn test_jwt() -> Arc<JwtManager> {
    match JwtManager::from_secret(TEST_JWT_SECRET, 1) {
        Ok(jwt) => Arc::new(jwt),
        Err(e) => panic!("test secret rejected: {e}"),
    }
}

/// In-memory CRM with a recording notification sink.
pub struct TestHarness {
    pub store: Arc<dyn CrmStore>,
    pub crm: CrmServices,
    notifications: mpsc::UnboundedReceiver<Notification>,
}

impl TestHarness {
    pub fn new() -> Self {
        let (sink, notifications) = RecordingSink::new();
        let store: Arc<dyn CrmStore> = Arc::new(MemoryStore::new());
        let crm = CrmServices::new(
            Arc::clone(&store),
            NotificationDispatcher::new(Arc::new(sink)),
            test_hasher(),
            test_jwt(),
        );
        Self {
            store,
            crm,
            notifications,
        }
    }

    pub fn hasher(&self) -> CredentialHasher {
        test_hasher()
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(AppConfig::default(), self.crm.clone())
    }

    pub fn lead_request(first_name: &str) -> CreateLeadRequest {
        CreateLeadRequest {
            first_name: first_name.to_string(),
            last_name: "Doe".to_string(),
            age: 30,
            email: Some(format!("{}@example.com", first_name.to_lowercase())),
            phone_number: None,
            description: None,
        }
    }

    /// Signs up an organizer with [`TEST_PASSWORD`].
    pub async fn organizer(&self, username: &str) -> Requester {
        let response = self
            .crm
            .accounts
            .signup(SignupRequest {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password: TEST_PASSWORD.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                organization_name: Some(format!("{username} inc")),
            })
            .await
            .unwrap_or_else(|e| panic!("signup of {username} failed: {e}"));
        self.resolve(response.user.id).await
    }

    pub async fn agent(&self, organizer: &Requester, username: &str) -> Requester {
        let created = self
            .crm
            .agents
            .create_agent(
                organizer,
                CreateAgentRequest {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    first_name: String::new(),
                    last_name: String::new(),
                },
            )
            .await
            .unwrap_or_else(|e| panic!("agent {username} not created: {e}"));
        self.resolve(created.agent.user.id).await
    }

    pub async fn lead(&self, organizer: &Requester, first_name: &str) -> Lead {
        self.crm
            .leads
            .create(organizer, Self::lead_request(first_name))
            .await
            .unwrap_or_else(|e| panic!("lead {first_name} not created: {e}"))
    }

    async fn resolve(&self, user_id: uuid::Uuid) -> Requester {
        self.crm
            .accounts
            .resolve(user_id)
            .await
            .unwrap_or_else(|e| panic!("user {user_id} did not resolve: {e}"))
    }

    pub async fn next_notification(&mut self) -> Option<Notification> {
        tokio::time::timeout(Duration::from_secs(2), self.notifications.recv())
            .await
            .ok()
            .flatten()
    }

    /// Discards notifications already queued or in flight.
    pub async fn drain_notifications(&mut self) {
        while tokio::time::timeout(Duration::from_millis(100), self.notifications.recv())
            .await
            .is_ok_and(|n| n.is_some())
        {}
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
