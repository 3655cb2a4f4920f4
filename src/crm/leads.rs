use log::info;
use std::sync::Arc;
use uuid::Uuid;

use super::error::{CrmError, CrmResult};
use super::scope::{lead_filter, TenantScope};
use super::store::CrmStore;
use super::types::{CreateLeadRequest, UpdateLeadRequest};
use crate::core::shared::models::{Lead, LeadChanges};
use crate::email::{Notification, NotificationDispatcher};
use crate::security::identity::Requester;

#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn CrmStore>,
    scope: TenantScope,
    notifier: NotificationDispatcher,
}

impl LeadService {
    pub fn new(store: Arc<dyn CrmStore>, notifier: NotificationDispatcher) -> Self {
        Self {
            scope: TenantScope::new(Arc::clone(&store)),
            store,
            notifier,
        }
    }

    /// Organizer only. The lead lands in the organizer's organization.
    pub async fn create(&self, requester: &Requester, request: CreateLeadRequest) -> CrmResult<Lead> {
        let organization_id = requester.require_organizer()?;
        let lead = self
            .store
            .insert_lead(request.into_new_lead(organization_id)?)
            .await?;
        info!("Lead {} created in organization {organization_id}", lead.id);

        self.notifier
            .dispatch(Notification::lead_created(&requester.email, &lead));
        Ok(lead)
    }

    pub async fn get(&self, requester: &Requester, lead_id: Uuid) -> CrmResult<Lead> {
        self.scope.lead(requester, lead_id).await
    }

    /// Organizer, or the agent the lead is assigned to. Agents get `NotFound`
    /// for leads that are not theirs.
    pub async fn update(
        &self,
        requester: &Requester,
        lead_id: Uuid,
        request: UpdateLeadRequest,
    ) -> CrmResult<Lead> {
        let changes = request.into_changes()?;
        if changes.is_empty() {
            return self.scope.lead(requester, lead_id).await;
        }
        self.store
            .update_lead(&lead_filter(requester), lead_id, changes)
            .await?
            .ok_or(CrmError::NotFound)
    }

    pub async fn delete(&self, requester: &Requester, lead_id: Uuid) -> CrmResult<()> {
        let organization_id = requester.require_organizer()?;
        if !self.store.delete_lead(organization_id, lead_id).await? {
            return Err(CrmError::NotFound);
        }
        info!("Lead {lead_id} deleted from organization {organization_id}");
        Ok(())
    }

    /// Sets or clears the category. Applying the current category again is a no-op.
    pub async fn update_category(
        &self,
        requester: &Requester,
        lead_id: Uuid,
        category_id: Option<Uuid>,
    ) -> CrmResult<Lead> {
        let changes = LeadChanges {
            category: Some(category_id),
            ..LeadChanges::default()
        };
        self.store
            .update_lead(&lead_filter(requester), lead_id, changes)
            .await?
            .ok_or(CrmError::NotFound)
    }
}
