use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use super::error::{CrmError, CrmResult};
use super::scope::TenantScope;
use super::store::CrmStore;
use super::types::{required, validate_email, CreateAgentRequest, CreatedAgent, UpdateAgentRequest};
use crate::core::shared::models::{AgentProfile, NewUser, Organization, UserRole};
use crate::email::{Notification, NotificationDispatcher};
use crate::security::identity::Requester;
use crate::security::password::{generate_initial_credential, CredentialHasher};

#[derive(Clone)]
pub struct AgentService {
    store: Arc<dyn CrmStore>,
    scope: TenantScope,
    hasher: CredentialHasher,
    notifier: NotificationDispatcher,
}

impl AgentService {
    pub fn new(
        store: Arc<dyn CrmStore>,
        hasher: CredentialHasher,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            scope: TenantScope::new(Arc::clone(&store)),
            store,
            hasher,
            notifier,
        }
    }

    /// Creates an agent account with a random credential in the organizer's
    /// organization.
    pub async fn create_agent(
        &self,
        requester: &Requester,
        request: CreateAgentRequest,
    ) -> CrmResult<CreatedAgent> {
        let organization_id = requester.require_organizer()?;
        let username = required("username", &request.username)?;
        let email = request.email.trim().to_string();
        validate_email(&email)?;

        let credential = generate_initial_credential();
        let hasher = self.hasher.clone();
        let secret = credential.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| CrmError::Internal(format!("Task join error: {e}")))??;

        let agent = self
            .store
            .create_agent(
                NewUser {
                    username,
                    email,
                    first_name: request.first_name.trim().to_string(),
                    last_name: request.last_name.trim().to_string(),
                    password_hash,
                    role: UserRole::Agent,
                },
                organization_id,
            )
            .await?;
        info!(
            "Agent {} ({}) added to organization {organization_id}",
            agent.id, agent.user.username
        );

        let organization = self.organization_for_notice(requester.user_id).await;
        self.notifier
            .dispatch(Notification::agent_added(&agent, organization.as_ref()));

        Ok(CreatedAgent {
            agent,
            initial_credential: credential,
        })
    }

    /// The invitation still goes out without the organization name.
    async fn organization_for_notice(&self, owner_id: Uuid) -> Option<Organization> {
        match self.store.organization_owned_by(owner_id).await {
            Ok(Some(organization)) => Some(organization),
            Ok(None) => {
                warn!("No organization owned by {owner_id} for agent invitation");
                None
            }
            Err(e) => {
                warn!("Could not load organization of {owner_id} for agent invitation: {e}");
                None
            }
        }
    }

    pub async fn list_agents(&self, requester: &Requester) -> CrmResult<Vec<AgentProfile>> {
        self.scope.agents(requester).await
    }

    pub async fn get_agent(&self, requester: &Requester, agent_id: Uuid) -> CrmResult<AgentProfile> {
        self.scope.agent(requester, agent_id).await
    }

    pub async fn update_agent(
        &self,
        requester: &Requester,
        agent_id: Uuid,
        request: UpdateAgentRequest,
    ) -> CrmResult<AgentProfile> {
        let organization_id = requester.require_organizer()?;
        let changes = request.into_changes()?;
        self.store
            .update_agent(organization_id, agent_id, changes)
            .await?
            .ok_or(CrmError::NotFound)
    }

    /// Removes the agent; its leads become unassigned.
    pub async fn delete_agent(&self, requester: &Requester, agent_id: Uuid) -> CrmResult<()> {
        let organization_id = requester.require_organizer()?;
        if !self.store.delete_agent(organization_id, agent_id).await? {
            return Err(CrmError::NotFound);
        }
        info!("Agent {agent_id} removed from organization {organization_id}");
        Ok(())
    }
}
