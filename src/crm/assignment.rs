use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use super::error::{CrmError, CrmResult};
use super::store::{CrmStore, LeadFilter};
use crate::core::shared::models::{Lead, LeadChanges};
use crate::email::{Notification, NotificationDispatcher};
use crate::security::identity::Requester;

#[derive(Clone)]
pub struct AssignmentService {
    store: Arc<dyn CrmStore>,
    notifier: NotificationDispatcher,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn CrmStore>, notifier: NotificationDispatcher) -> Self {
        Self { store, notifier }
    }

    /// Organizer only. The agent must belong to the lead's organization,
    /// otherwise `Validation`; the check and the write are one store call.
    pub async fn assign(
        &self,
        requester: &Requester,
        lead_id: Uuid,
        agent_id: Uuid,
    ) -> CrmResult<Lead> {
        let organization_id = requester.require_organizer()?;
        let changes = LeadChanges {
            agent: Some(Some(agent_id)),
            ..LeadChanges::default()
        };
        let lead = self
            .store
            .update_lead(&LeadFilter::organization(organization_id), lead_id, changes)
            .await?
            .ok_or(CrmError::NotFound)?;
        info!("Lead {lead_id} assigned to agent {agent_id}");

        match self.store.get_agent(organization_id, agent_id).await {
            Ok(Some(agent)) => {
                self.notifier
                    .dispatch(Notification::lead_assigned(&agent, &lead));
            }
            Ok(None) => warn!("Agent {agent_id} vanished before assignment notice"),
            Err(e) => warn!("Could not load agent {agent_id} for assignment notice: {e}"),
        }
        Ok(lead)
    }

    pub async fn unassign(&self, requester: &Requester, lead_id: Uuid) -> CrmResult<Lead> {
        let organization_id = requester.require_organizer()?;
        let changes = LeadChanges {
            agent: Some(None),
            ..LeadChanges::default()
        };
        self.store
            .update_lead(&LeadFilter::organization(organization_id), lead_id, changes)
            .await?
            .ok_or(CrmError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::TestHarness;

    #[tokio::test]
    async fn test_assign_within_organization_notifies_agent() {
        let mut harness = TestHarness::new();
        let organizer = harness.organizer("owner").await;
        let agent = harness.agent(&organizer, "agent").await;
        let lead = harness.lead(&organizer, "Jane").await;
        harness.drain_notifications().await;

        let assigned = harness
            .crm
            .assignment
            .assign(&organizer, lead.id, agent.agent_id().unwrap())
            .await
            .unwrap();
        assert_eq!(assigned.agent_id, agent.agent_id());

        let sent = harness.next_notification().await.unwrap();
        assert_eq!(sent.recipient, agent.email);
    }

    #[tokio::test]
    async fn test_assign_foreign_agent_is_validation_error() {
        let harness = TestHarness::new();
        let organizer = harness.organizer("owner").await;
        let rival = harness.organizer("rival").await;
        let outsider = harness.agent(&rival, "outsider").await;
        let lead = harness.lead(&organizer, "Jane").await;

        let result = harness
            .crm
            .assignment
            .assign(&organizer, lead.id, outsider.agent_id().unwrap())
            .await;
        assert!(matches!(result, Err(CrmError::Validation(_))));

        let unchanged = harness.crm.leads.get(&organizer, lead.id).await.unwrap();
        assert_eq!(unchanged.agent_id, None);
    }

    #[tokio::test]
    async fn test_assign_out_of_scope_lead_is_not_found() {
        let harness = TestHarness::new();
        let organizer = harness.organizer("owner").await;
        let rival = harness.organizer("rival").await;
        let agent = harness.agent(&organizer, "agent").await;
        let foreign_lead = harness.lead(&rival, "John").await;

        let result = harness
            .crm
            .assignment
            .assign(&organizer, foreign_lead.id, agent.agent_id().unwrap())
            .await;
        assert_eq!(result, Err(CrmError::NotFound));
    }

    #[tokio::test]
    async fn test_agents_cannot_assign_or_unassign() {
        let harness = TestHarness::new();
        let organizer = harness.organizer("owner").await;
        let agent = harness.agent(&organizer, "agent").await;
        let lead = harness.lead(&organizer, "Jane").await;
        let assignment = &harness.crm.assignment;

        assert_eq!(
            assignment
                .assign(&agent, lead.id, agent.agent_id().unwrap())
                .await,
            Err(CrmError::PermissionDenied)
        );
        assert_eq!(
            assignment.unassign(&agent, lead.id).await,
            Err(CrmError::PermissionDenied)
        );
    }

    #[tokio::test]
    async fn test_unassign_clears_agent() {
        let harness = TestHarness::new();
        let organizer = harness.organizer("owner").await;
        let agent = harness.agent(&organizer, "agent").await;
        let lead = harness.lead(&organizer, "Jane").await;
        let assignment = &harness.crm.assignment;

        assignment
            .assign(&organizer, lead.id, agent.agent_id().unwrap())
            .await
            .unwrap();
        let lead = assignment.unassign(&organizer, lead.id).await.unwrap();
        assert_eq!(lead.agent_id, None);
        assert!(harness.crm.scope.leads(&agent).await.unwrap().is_empty());
    }
}
