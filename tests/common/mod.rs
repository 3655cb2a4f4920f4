#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crmserver::core::shared::models::Lead;
use crmserver::crm::types::{CreateAgentRequest, CreateLeadRequest, SignupRequest};
use crmserver::crm::{CrmError, CrmServices, CrmStore, MemoryStore};
use crmserver::email::{Notification, NotificationDispatcher, NotificationSink};
use crmserver::security::identity::Requester;
use crmserver::security::jwt::JwtManager;
use crmserver::security::password::{Argon2Config, CredentialHasher};

pub const PASSWORD: &str = "correct horse battery";

struct ChannelSink(mpsc::UnboundedSender<Notification>);

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn send(&self, notification: Notification) -> Result<(), CrmError> {
        self.0
            .send(notification)
            .map_err(|e| CrmError::NotificationFailure(e.to_string()))
    }
}

struct BrokenSink;

#[async_trait]
impl NotificationSink for BrokenSink {
    async fn send(&self, _notification: Notification) -> Result<(), CrmError> {
        Err(CrmError::NotificationFailure("connection refused".to_string()))
    }
}

pub struct Crm {
    pub services: CrmServices,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

pub fn services_over(store: Arc<dyn CrmStore>, sink: Arc<dyn NotificationSink>) -> CrmServices {
    CrmServices::new(
        store,
        NotificationDispatcher::new(sink),
        CredentialHasher::new(&Argon2Config::low_memory()).unwrap(),
        Arc::new(JwtManager::from_secret("integration-secret-with-32-characters", 1).unwrap()),
    )
}

pub fn crm() -> Crm {
    let (tx, notifications) = mpsc::unbounded_channel();
    Crm {
        services: services_over(Arc::new(MemoryStore::new()), Arc::new(ChannelSink(tx))),
        notifications,
    }
}

pub fn crm_with_broken_mail() -> CrmServices {
    services_over(Arc::new(MemoryStore::new()), Arc::new(BrokenSink))
}

pub async fn organizer(crm: &CrmServices, username: &str) -> Requester {
    let response = crm
        .accounts
        .signup(SignupRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: PASSWORD.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            organization_name: None,
        })
        .await
        .unwrap();
    crm.accounts.resolve(response.user.id).await.unwrap()
}

pub async fn agent(crm: &CrmServices, organizer: &Requester, username: &str) -> Requester {
    let created = crm
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
        .unwrap();
    crm.accounts.resolve(created.agent.user.id).await.unwrap()
}

pub fn lead_request(first_name: &str, age: i32) -> CreateLeadRequest {
    CreateLeadRequest {
        first_name: first_name.to_string(),
        last_name: "Doe".to_string(),
        age,
        email: None,
        phone_number: None,
        description: None,
    }
}

pub async fn lead(crm: &CrmServices, organizer: &Requester, first_name: &str) -> Lead {
    crm.leads
        .create(organizer, lead_request(first_name, 30))
        .await
        .unwrap()
}

pub async fn next_notification(
    rx: &mut mpsc::UnboundedReceiver<Notification>,
) -> Option<Notification> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .ok()
        .flatten()
}
