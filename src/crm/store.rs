//! Persistence seam for CRM records.
//!
//! Every lookup takes the organization id explicitly; stores never return a
//! record from another organization. Role-based filtering is expressed through
//! [`LeadFilter`], built by the scope layer from the requester identity.
//!
//! Each mutating method is one atomic unit: cross-reference checks (an agent or
//! category belonging to the lead's organization) happen inside the same
//! transaction as the write.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::CrmResult;
use crate::core::shared::models::{
    Agent, AgentProfile, Category, Lead, LeadChanges, NewLead, NewUser, Organization, User,
    UserChanges,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssignmentFilter {
    #[default]
    Any,
    Assigned,
    Unassigned,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    Any,
    Uncategorized,
    Only(Uuid),
}

/// Row filter for lead queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadFilter {
    pub organization_id: Uuid,
    /// Restricts to leads assigned to this agent.
    pub agent_id: Option<Uuid>,
    pub assignment: AssignmentFilter,
    pub category: CategoryFilter,
}

impl LeadFilter {
    pub fn organization(organization_id: Uuid) -> Self {
        Self {
            organization_id,
            agent_id: None,
            assignment: AssignmentFilter::Any,
            category: CategoryFilter::Any,
        }
    }

    pub fn assigned_to(mut self, agent_id: Uuid) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    pub fn with_assignment(mut self, assignment: AssignmentFilter) -> Self {
        self.assignment = assignment;
        self
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        if lead.organization_id != self.organization_id {
            return false;
        }
        if let Some(agent_id) = self.agent_id {
            if lead.agent_id != Some(agent_id) {
                return false;
            }
        }
        let assignment_ok = match self.assignment {
            AssignmentFilter::Any => true,
            AssignmentFilter::Assigned => lead.agent_id.is_some(),
            AssignmentFilter::Unassigned => lead.agent_id.is_none(),
        };
        let category_ok = match self.category {
            CategoryFilter::Any => true,
            CategoryFilter::Uncategorized => lead.category_id.is_none(),
            CategoryFilter::Only(id) => lead.category_id == Some(id),
        };
        assignment_ok && category_ok
    }
}

#[async_trait]
pub trait CrmStore: Send + Sync {
    /// Liveness check used by `/health`.
    async fn ping(&self) -> CrmResult<()> {
        Ok(())
    }

    // Accounts

    /// Inserts an organizer account together with the organization it owns.
    async fn create_organizer(
        &self,
        user: NewUser,
        organization_name: String,
    ) -> CrmResult<(User, Organization)>;

    async fn get_user(&self, user_id: Uuid) -> CrmResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> CrmResult<Option<User>>;

    async fn organization_owned_by(&self, user_id: Uuid) -> CrmResult<Option<Organization>>;

    async fn agent_for_user(&self, user_id: Uuid) -> CrmResult<Option<Agent>>;

    // Agents

    /// Inserts an agent-role user and its agent record in one transaction.
    async fn create_agent(&self, user: NewUser, organization_id: Uuid) -> CrmResult<AgentProfile>;

    async fn list_agents(&self, organization_id: Uuid) -> CrmResult<Vec<AgentProfile>>;

    async fn get_agent(
        &self,
        organization_id: Uuid,
        agent_id: Uuid,
    ) -> CrmResult<Option<AgentProfile>>;

    async fn update_agent(
        &self,
        organization_id: Uuid,
        agent_id: Uuid,
        changes: UserChanges,
    ) -> CrmResult<Option<AgentProfile>>;

    /// Removes the agent record; its leads become unassigned.
    async fn delete_agent(&self, organization_id: Uuid, agent_id: Uuid) -> CrmResult<bool>;

    // Categories

    async fn create_category(&self, organization_id: Uuid, name: String) -> CrmResult<Category>;

    async fn list_categories(&self, organization_id: Uuid) -> CrmResult<Vec<Category>>;

    async fn get_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
    ) -> CrmResult<Option<Category>>;

    /// Removes the category; its leads become uncategorized.
    async fn delete_category(&self, organization_id: Uuid, category_id: Uuid) -> CrmResult<bool>;

    // Leads

    async fn insert_lead(&self, lead: NewLead) -> CrmResult<Lead>;

    async fn list_leads(&self, filter: &LeadFilter) -> CrmResult<Vec<Lead>>;

    async fn count_leads(&self, filter: &LeadFilter) -> CrmResult<i64>;

    async fn get_lead(&self, filter: &LeadFilter, lead_id: Uuid) -> CrmResult<Option<Lead>>;

    /// Applies `changes` to the lead matching `filter`.
    ///
    /// Returns `Ok(None)` when no such lead is visible through `filter`, and
    /// `CrmError::Validation` when a referenced agent or category does not
    /// belong to the lead's organization.
    async fn update_lead(
        &self,
        filter: &LeadFilter,
        lead_id: Uuid,
        changes: LeadChanges,
    ) -> CrmResult<Option<Lead>>;

    async fn delete_lead(&self, organization_id: Uuid, lead_id: Uuid) -> CrmResult<bool>;
}
