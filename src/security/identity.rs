//! Requester identity threaded through every CRM operation.

use serde::Serialize;
use uuid::Uuid;

/// Role of an authenticated requester, tied to exactly one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    Organizer {
        organization_id: Uuid,
    },
    Agent {
        agent_id: Uuid,
        organization_id: Uuid,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requester {
    pub user_id: Uuid,
    pub email: String,
    #[serde(flatten)]
    pub role: Role,
}

impl Requester {
    pub fn organizer(user_id: Uuid, email: impl Into<String>, organization_id: Uuid) -> Self {
        Self {
            user_id,
            email: email.into(),
            role: Role::Organizer { organization_id },
        }
    }

    pub fn agent(
        user_id: Uuid,
        email: impl Into<String>,
        agent_id: Uuid,
        organization_id: Uuid,
    ) -> Self {
        Self {
            user_id,
            email: email.into(),
            role: Role::Agent {
                agent_id,
                organization_id,
            },
        }
    }

    pub fn organization_id(&self) -> Uuid {
        match self.role {
            Role::Organizer { organization_id } | Role::Agent { organization_id, .. } => {
                organization_id
            }
        }
    }

    pub fn is_organizer(&self) -> bool {
        matches!(self.role, Role::Organizer { .. })
    }

    pub fn agent_id(&self) -> Option<Uuid> {
        match self.role {
            Role::Agent { agent_id, .. } => Some(agent_id),
            Role::Organizer { .. } => None,
        }
    }

    /// Returns the organization id when the requester is an organizer.
    pub fn require_organizer(&self) -> Result<Uuid, crate::crm::CrmError> {
        match self.role {
            Role::Organizer { organization_id } => Ok(organization_id),
            Role::Agent { .. } => Err(crate::crm::CrmError::PermissionDenied),
        }
    }
}
