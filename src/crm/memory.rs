//! In-process store used by tests and `--memory` runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{CrmError, CrmResult};
use super::store::{CrmStore, LeadFilter};
use crate::core::shared::models::{
    Agent, AgentProfile, Category, Lead, LeadChanges, NewLead, NewUser, Organization, User,
    UserChanges,
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    organizations: HashMap<Uuid, Organization>,
    agents: HashMap<Uuid, Agent>,
    categories: HashMap<Uuid, Category>,
    leads: HashMap<Uuid, Lead>,
}

impl MemoryState {
    fn ensure_username_free(&self, username: &str) -> CrmResult<()> {
        if self.users.values().any(|u| u.username == username) {
            return Err(CrmError::validation("Username already taken"));
        }
        Ok(())
    }

    fn profile(&self, agent: &Agent) -> CrmResult<AgentProfile> {
        let user = self
            .users
            .get(&agent.user_id)
            .cloned()
            .ok_or_else(|| CrmError::Database(format!("agent {} has no user", agent.id)))?;
        Ok(AgentProfile::new(agent.clone(), user))
    }

    fn agent_in(&self, organization_id: Uuid, agent_id: Uuid) -> Option<&Agent> {
        self.agents
            .get(&agent_id)
            .filter(|a| a.organization_id == organization_id)
    }

    fn category_in(&self, organization_id: Uuid, category_id: Uuid) -> Option<&Category> {
        self.categories
            .get(&category_id)
            .filter(|c| c.organization_id == organization_id)
    }
}

/// Sorted newest first, like the SQL store.
fn newest_first(mut leads: Vec<Lead>) -> Vec<Lead> {
    leads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    leads
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CrmStore for MemoryStore {
    async fn create_organizer(
        &self,
        user: NewUser,
        organization_name: String,
    ) -> CrmResult<(User, Organization)> {
        let mut state = self.state.write().await;
        state.ensure_username_free(&user.username)?;

        let user = user.into_user();
        let organization = Organization {
            id: Uuid::new_v4(),
            owner_id: user.id,
            name: organization_name,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        state.organizations.insert(organization.id, organization.clone());
        Ok((user, organization))
    }

    async fn get_user(&self, user_id: Uuid) -> CrmResult<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> CrmResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn organization_owned_by(&self, user_id: Uuid) -> CrmResult<Option<Organization>> {
        let state = self.state.read().await;
        Ok(state
            .organizations
            .values()
            .find(|o| o.owner_id == user_id)
            .cloned())
    }

    async fn agent_for_user(&self, user_id: Uuid) -> CrmResult<Option<Agent>> {
        let state = self.state.read().await;
        Ok(state.agents.values().find(|a| a.user_id == user_id).cloned())
    }

    async fn create_agent(&self, user: NewUser, organization_id: Uuid) -> CrmResult<AgentProfile> {
        let mut state = self.state.write().await;
        if !state.organizations.contains_key(&organization_id) {
            return Err(CrmError::NotFound);
        }
        state.ensure_username_free(&user.username)?;

        let user = user.into_user();
        let agent = Agent {
            id: Uuid::new_v4(),
            user_id: user.id,
            organization_id,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        state.agents.insert(agent.id, agent.clone());
        Ok(AgentProfile::new(agent, user))
    }

    async fn list_agents(&self, organization_id: Uuid) -> CrmResult<Vec<AgentProfile>> {
        let state = self.state.read().await;
        let mut profiles = state
            .agents
            .values()
            .filter(|a| a.organization_id == organization_id)
            .map(|a| state.profile(a))
            .collect::<CrmResult<Vec<_>>>()?;
        profiles.sort_by(|a, b| a.user.username.cmp(&b.user.username));
        Ok(profiles)
    }

    async fn get_agent(
        &self,
        organization_id: Uuid,
        agent_id: Uuid,
    ) -> CrmResult<Option<AgentProfile>> {
        let state = self.state.read().await;
        state
            .agent_in(organization_id, agent_id)
            .map(|a| state.profile(a))
            .transpose()
    }

    async fn update_agent(
        &self,
        organization_id: Uuid,
        agent_id: Uuid,
        changes: UserChanges,
    ) -> CrmResult<Option<AgentProfile>> {
        let mut state = self.state.write().await;
        let Some(agent) = state.agent_in(organization_id, agent_id).cloned() else {
            return Ok(None);
        };
        if let Some(user) = state.users.get_mut(&agent.user_id) {
            if let Some(email) = changes.email {
                user.email = email;
            }
            if let Some(first_name) = changes.first_name {
                user.first_name = first_name;
            }
            if let Some(last_name) = changes.last_name {
                user.last_name = last_name;
            }
        }
        state.profile(&agent).map(Some)
    }

    async fn delete_agent(&self, organization_id: Uuid, agent_id: Uuid) -> CrmResult<bool> {
        let mut state = self.state.write().await;
        if state.agent_in(organization_id, agent_id).is_none() {
            return Ok(false);
        }
        state.agents.remove(&agent_id);
        for lead in state.leads.values_mut() {
            if lead.agent_id == Some(agent_id) {
                lead.agent_id = None;
                lead.updated_at = Utc::now();
            }
        }
        Ok(true)
    }

    async fn create_category(&self, organization_id: Uuid, name: String) -> CrmResult<Category> {
        let mut state = self.state.write().await;
        if !state.organizations.contains_key(&organization_id) {
            return Err(CrmError::NotFound);
        }
        let category = Category {
            id: Uuid::new_v4(),
            organization_id,
            name,
            created_at: Utc::now(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_categories(&self, organization_id: Uuid) -> CrmResult<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> = state
            .categories
            .values()
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
    ) -> CrmResult<Option<Category>> {
        let state = self.state.read().await;
        Ok(state.category_in(organization_id, category_id).cloned())
    }

    async fn delete_category(&self, organization_id: Uuid, category_id: Uuid) -> CrmResult<bool> {
        let mut state = self.state.write().await;
        if state.category_in(organization_id, category_id).is_none() {
            return Ok(false);
        }
        state.categories.remove(&category_id);
        for lead in state.leads.values_mut() {
            if lead.category_id == Some(category_id) {
                lead.category_id = None;
                lead.updated_at = Utc::now();
            }
        }
        Ok(true)
    }

    async fn insert_lead(&self, lead: NewLead) -> CrmResult<Lead> {
        let mut state = self.state.write().await;
        if !state.organizations.contains_key(&lead.organization_id) {
            return Err(CrmError::NotFound);
        }
        let lead = lead.into_lead();
        state.leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn list_leads(&self, filter: &LeadFilter) -> CrmResult<Vec<Lead>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .leads
                .values()
                .filter(|l| filter.matches(l))
                .cloned()
                .collect(),
        ))
    }

    async fn count_leads(&self, filter: &LeadFilter) -> CrmResult<i64> {
        let state = self.state.read().await;
        let count = state.leads.values().filter(|l| filter.matches(l)).count();
        i64::try_from(count).map_err(CrmError::database)
    }

    async fn get_lead(&self, filter: &LeadFilter, lead_id: Uuid) -> CrmResult<Option<Lead>> {
        let state = self.state.read().await;
        Ok(state
            .leads
            .get(&lead_id)
            .filter(|l| filter.matches(l))
            .cloned())
    }

    async fn update_lead(
        &self,
        filter: &LeadFilter,
        lead_id: Uuid,
        changes: LeadChanges,
    ) -> CrmResult<Option<Lead>> {
        let mut state = self.state.write().await;
        let Some(organization_id) = state
            .leads
            .get(&lead_id)
            .filter(|l| filter.matches(l))
            .map(|l| l.organization_id)
        else {
            return Ok(None);
        };

        if let Some(Some(agent_id)) = changes.agent {
            if state.agent_in(organization_id, agent_id).is_none() {
                return Err(CrmError::validation(
                    "Agent does not belong to the lead's organization",
                ));
            }
        }
        if let Some(Some(category_id)) = changes.category {
            if state.category_in(organization_id, category_id).is_none() {
                return Err(CrmError::validation(
                    "Category does not belong to the lead's organization",
                ));
            }
        }

        let Some(lead) = state.leads.get_mut(&lead_id) else {
            return Ok(None);
        };
        changes.apply_to(lead);
        Ok(Some(lead.clone()))
    }

    async fn delete_lead(&self, organization_id: Uuid, lead_id: Uuid) -> CrmResult<bool> {
        let mut state = self.state.write().await;
        let in_org = state
            .leads
            .get(&lead_id)
            .is_some_and(|l| l.organization_id == organization_id);
        if in_org {
            state.leads.remove(&lead_id);
        }
        Ok(in_org)
    }
}
