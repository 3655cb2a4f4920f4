//! Tenant scoping: which leads, categories and agents a requester may see.
//!
//! Organizers see everything in their organization. Agents see the categories
//! and agents of their organization read-only, and only the leads assigned to
//! themselves. Anything outside scope is reported as `NotFound`.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::error::{CrmError, CrmResult};
use super::store::{AssignmentFilter, CategoryFilter, CrmStore, LeadFilter};
use crate::core::shared::models::{AgentProfile, Category, Lead};
use crate::security::identity::{Requester, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Leads,
    Categories,
    Agents,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum ScopedCollection {
    Leads(Vec<Lead>),
    Categories(Vec<Category>),
    Agents(Vec<AgentProfile>),
}

impl ScopedCollection {
    pub fn len(&self) -> usize {
        match self {
            Self::Leads(items) => items.len(),
            Self::Categories(items) => items.len(),
            Self::Agents(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lead filter for everything the requester may see.
pub fn lead_filter(requester: &Requester) -> LeadFilter {
    match requester.role {
        Role::Organizer { organization_id } => LeadFilter::organization(organization_id),
        Role::Agent {
            agent_id,
            organization_id,
        } => LeadFilter::organization(organization_id).assigned_to(agent_id),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadListing {
    pub assigned: Vec<Lead>,
    /// Always empty for agents.
    pub unassigned: Vec<Lead>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryListing {
    pub categories: Vec<Category>,
    pub uncategorized_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDetail {
    pub category: Category,
    pub leads: Vec<Lead>,
}

#[derive(Clone)]
pub struct TenantScope {
    store: Arc<dyn CrmStore>,
}

impl TenantScope {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    pub async fn scope(
        &self,
        requester: &Requester,
        kind: CollectionKind,
    ) -> CrmResult<ScopedCollection> {
        Ok(match kind {
            CollectionKind::Leads => ScopedCollection::Leads(self.leads(requester).await?),
            CollectionKind::Categories => {
                ScopedCollection::Categories(self.categories(requester).await?)
            }
            CollectionKind::Agents => ScopedCollection::Agents(self.agents(requester).await?),
        })
    }

    pub async fn leads(&self, requester: &Requester) -> CrmResult<Vec<Lead>> {
        self.store.list_leads(&lead_filter(requester)).await
    }

    pub async fn categories(&self, requester: &Requester) -> CrmResult<Vec<Category>> {
        self.store
            .list_categories(requester.organization_id())
            .await
    }

    pub async fn agents(&self, requester: &Requester) -> CrmResult<Vec<AgentProfile>> {
        self.store.list_agents(requester.organization_id()).await
    }

    pub async fn lead(&self, requester: &Requester, lead_id: Uuid) -> CrmResult<Lead> {
        self.store
            .get_lead(&lead_filter(requester), lead_id)
            .await?
            .ok_or(CrmError::NotFound)
    }

    pub async fn category(&self, requester: &Requester, category_id: Uuid) -> CrmResult<Category> {
        self.store
            .get_category(requester.organization_id(), category_id)
            .await?
            .ok_or(CrmError::NotFound)
    }

    pub async fn agent(&self, requester: &Requester, agent_id: Uuid) -> CrmResult<AgentProfile> {
        self.store
            .get_agent(requester.organization_id(), agent_id)
            .await?
            .ok_or(CrmError::NotFound)
    }

    pub async fn lead_listing(&self, requester: &Requester) -> CrmResult<LeadListing> {
        let filter = lead_filter(requester);
        let assigned = self
            .store
            .list_leads(&filter.with_assignment(AssignmentFilter::Assigned))
            .await?;
        let unassigned = if requester.is_organizer() {
            self.store
                .list_leads(&filter.with_assignment(AssignmentFilter::Unassigned))
                .await?
        } else {
            Vec::new()
        };
        Ok(LeadListing {
            assigned,
            unassigned,
        })
    }

    pub async fn category_listing(&self, requester: &Requester) -> CrmResult<CategoryListing> {
        let categories = self.categories(requester).await?;
        let uncategorized_count = self
            .store
            .count_leads(
                &LeadFilter::organization(requester.organization_id())
                    .with_category(CategoryFilter::Uncategorized),
            )
            .await?;
        Ok(CategoryListing {
            categories,
            uncategorized_count,
        })
    }

    pub async fn category_detail(
        &self,
        requester: &Requester,
        category_id: Uuid,
    ) -> CrmResult<CategoryDetail> {
        let category = self.category(requester, category_id).await?;
        let leads = self
            .store
            .list_leads(&lead_filter(requester).with_category(CategoryFilter::Only(category.id)))
            .await?;
        Ok(CategoryDetail { category, leads })
    }
}
