use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub use super::schema;

pub use super::schema::{agents, categories, leads, organizations, users};

/// Stored role of a user account. A user is exactly one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Organizer,
    Agent,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organizer => write!(f, "organizer"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organizer" => Ok(Self::Organizer),
            "agent" => Ok(Self::Agent),
            other => Err(format!("unknown user role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = String;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            username: record.username,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            password_hash: record.password_hash,
            role: record.role.parse()?,
            created_at: record.created_at,
        })
    }
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.to_string(),
            created_at: user.created_at,
        }
    }
}

/// Fields for a user account about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: UserRole,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            role: self.role,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = organizations)]
pub struct Organization {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = agents)]
pub struct Agent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// An agent record joined with its user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentProfile {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

impl AgentProfile {
    pub fn new(agent: Agent, user: User) -> Self {
        Self {
            id: agent.id,
            organization_id: agent.organization_id,
            user,
            created_at: agent.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = leads)]
pub struct Lead {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lead contents before the store assigns identity and timestamps.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub organization_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub description: Option<String>,
}

impl NewLead {
    pub fn into_lead(self) -> Lead {
        let now = Utc::now();
        Lead {
            id: Uuid::new_v4(),
            organization_id: self.organization_id,
            agent_id: None,
            category_id: None,
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
            email: self.email,
            phone_number: self.phone_number,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a lead. There is no organization field: a lead never
/// moves between organizations.
///
/// Nullable columns use `Some(None)` to clear the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub email: Option<Option<String>>,
    pub phone_number: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub agent: Option<Option<Uuid>>,
    pub category: Option<Option<Uuid>>,
}

impl LeadChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the change set to an in-memory lead.
    pub fn apply_to(&self, lead: &mut Lead) {
        if let Some(first_name) = &self.first_name {
            lead.first_name.clone_from(first_name);
        }
        if let Some(last_name) = &self.last_name {
            lead.last_name.clone_from(last_name);
        }
        if let Some(age) = self.age {
            lead.age = age;
        }
        if let Some(email) = &self.email {
            lead.email.clone_from(email);
        }
        if let Some(phone_number) = &self.phone_number {
            lead.phone_number.clone_from(phone_number);
        }
        if let Some(description) = &self.description {
            lead.description.clone_from(description);
        }
        if let Some(agent) = self.agent {
            lead.agent_id = agent;
        }
        if let Some(category) = self.category {
            lead.category_id = category;
        }
        lead.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_round_trips_through_text() {
        assert_eq!(UserRole::Organizer.to_string(), "organizer");
        assert_eq!("agent".parse::<UserRole>(), Ok(UserRole::Agent));
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_user_record_with_unknown_role_is_rejected() {
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: "ghost".to_string(),
            email: "ghost@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            role: "superuser".to_string(),
            created_at: Utc::now(),
        };
        assert!(User::try_from(record).is_err());
    }

    #[test]
    fn test_lead_changes_apply_only_present_fields() {
        let mut lead = NewLead {
            organization_id: Uuid::new_v4(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            age: 30,
            email: Some("jane@example.com".to_string()),
            phone_number: None,
            description: None,
        }
        .into_lead();
        let organization_id = lead.organization_id;
        let category_id = Uuid::new_v4();

        let changes = LeadChanges {
            age: Some(31),
            category: Some(Some(category_id)),
            ..LeadChanges::default()
        };
        changes.apply_to(&mut lead);

        assert_eq!(lead.age, 31);
        assert_eq!(lead.first_name, "Jane");
        assert_eq!(lead.email.as_deref(), Some("jane@example.com"));
        assert_eq!(lead.category_id, Some(category_id));
        assert_eq!(lead.agent_id, None);
        assert_eq!(lead.organization_id, organization_id);
    }

    #[test]
    fn test_lead_changes_can_clear_references() {
        let mut lead = NewLead {
            organization_id: Uuid::new_v4(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            age: 30,
            email: None,
            phone_number: None,
            description: None,
        }
        .into_lead();
        lead.agent_id = Some(Uuid::new_v4());

        lead.phone_number = Some("555-0100".to_string());

        LeadChanges {
            agent: Some(None),
            phone_number: Some(None),
            ..LeadChanges::default()
        }
        .apply_to(&mut lead);

        assert_eq!(lead.agent_id, None);
        assert_eq!(lead.phone_number, None);
        assert!(LeadChanges::default().is_empty());
    }
}
