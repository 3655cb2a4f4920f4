use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{CrmError, CrmResult};
use crate::core::shared::models::{
    AgentProfile, LeadChanges, NewLead, Organization, User, UserChanges,
};
use crate::security::jwt::IssuedToken;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLeadRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub age: i32,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub description: Option<String>,
}

impl CreateLeadRequest {
    pub fn into_new_lead(self, organization_id: Uuid) -> CrmResult<NewLead> {
        let first_name = required("first_name", &self.first_name)?;
        let last_name = required("last_name", &self.last_name)?;
        validate_age(self.age)?;
        let email = optional(self.email);
        if let Some(email) = &email {
            validate_email(email)?;
        }
        Ok(NewLead {
            organization_id,
            first_name,
            last_name,
            age: self.age,
            email,
            phone_number: optional(self.phone_number),
            description: optional(self.description),
        })
    }
}

/// Field update for a lead. `organization_id` is accepted for compatibility
/// with clients that echo the whole record, and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLeadRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
}

impl UpdateLeadRequest {
    pub fn into_changes(self) -> CrmResult<LeadChanges> {
        let first_name = self
            .first_name
            .map(|v| required("first_name", &v))
            .transpose()?;
        let last_name = self
            .last_name
            .map(|v| required("last_name", &v))
            .transpose()?;
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        let email = clearable(self.email);
        if let Some(Some(email)) = &email {
            validate_email(email)?;
        }
        Ok(LeadChanges {
            first_name,
            last_name,
            age: self.age,
            email,
            phone_number: clearable(self.phone_number),
            description: clearable(self.description),
            ..LeadChanges::default()
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignAgentRequest {
    pub agent_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCategoryRequest {
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAgentRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAgentRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UpdateAgentRequest {
    pub fn into_changes(self) -> CrmResult<UserChanges> {
        let email = self.email.map(|v| v.trim().to_string());
        if let Some(email) = &email {
            validate_email(email)?;
        }
        Ok(UserChanges {
            email,
            first_name: self.first_name.map(|v| v.trim().to_string()),
            last_name: self.last_name.map(|v| v.trim().to_string()),
        })
    }
}

/// Returned once to the organizer; only the hash is stored.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedAgent {
    pub agent: AgentProfile,
    pub initial_credential: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub organization_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub user: User,
    pub organization: Organization,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub type LoginResponse = IssuedToken;

pub(crate) fn required(field: &str, value: &str) -> CrmResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CrmError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A present field is normalized like on create; blank clears the column.
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| optional(Some(v)))
}

fn validate_age(age: i32) -> CrmResult<()> {
    if age < 0 {
        return Err(CrmError::validation("age must not be negative"));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> CrmResult<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(CrmError::validation(format!("invalid email address: {email}")));
    }
    Ok(())
}
