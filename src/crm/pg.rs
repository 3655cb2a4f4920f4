//! PostgreSQL store backed by diesel.
//!
//! Diesel is synchronous, so every call runs on the blocking pool with its own
//! pooled connection, and every mutation runs inside one transaction.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;
use log::error;
use uuid::Uuid;

use super::error::{CrmError, CrmResult};
use super::store::{AssignmentFilter, CategoryFilter, CrmStore, LeadFilter};
use crate::core::shared::models::{
    agents, categories, leads, organizations, users, Agent, AgentProfile, Category, Lead,
    LeadChanges, NewLead, NewUser, Organization, User, UserChanges, UserRecord,
};
use crate::core::shared::utils::DbPool;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore").finish_non_exhaustive()
    }
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, op: F) -> CrmResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> CrmResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                error!("Failed to get database connection: {e}");
                CrmError::from(e)
            })?;
            op(&mut conn)
        })
        .await
        .map_err(|e| CrmError::Database(format!("Task join error: {e}")))?
    }
}

fn to_user(record: UserRecord) -> CrmResult<User> {
    User::try_from(record).map_err(CrmError::Database)
}

fn is_unique_violation(err: &diesel::result::Error) -> bool {
    matches!(
        err,
        diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _)
    )
}

fn insert_user(conn: &mut PgConnection, user: &User) -> CrmResult<()> {
    diesel::insert_into(users::table)
        .values(UserRecord::from(user))
        .execute(conn)
        .map_err(|e| {
            if is_unique_violation(&e) {
                CrmError::validation("Username already taken")
            } else {
                error!("Failed to insert user: {e}");
                CrmError::from(e)
            }
        })?;
    Ok(())
}

fn load_profile(conn: &mut PgConnection, agent: Agent) -> CrmResult<AgentProfile> {
    let record: UserRecord = users::table
        .find(agent.user_id)
        .select(UserRecord::as_select())
        .first(conn)?;
    Ok(AgentProfile::new(agent, to_user(record)?))
}

fn find_agent(
    conn: &mut PgConnection,
    organization_id: Uuid,
    agent_id: Uuid,
) -> CrmResult<Option<Agent>> {
    Ok(agents::table
        .filter(agents::id.eq(agent_id))
        .filter(agents::organization_id.eq(organization_id))
        .select(Agent::as_select())
        .first(conn)
        .optional()?)
}

fn organization_exists(conn: &mut PgConnection, organization_id: Uuid) -> CrmResult<bool> {
    let count: i64 = organizations::table
        .filter(organizations::id.eq(organization_id))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

fn filtered_leads(filter: &LeadFilter) -> leads::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = leads::table
        .filter(leads::organization_id.eq(filter.organization_id))
        .into_boxed();

    if let Some(agent_id) = filter.agent_id {
        query = query.filter(leads::agent_id.eq(agent_id));
    }
    query = match filter.assignment {
        AssignmentFilter::Any => query,
        AssignmentFilter::Assigned => query.filter(leads::agent_id.is_not_null()),
        AssignmentFilter::Unassigned => query.filter(leads::agent_id.is_null()),
    };
    match filter.category {
        CategoryFilter::Any => query,
        CategoryFilter::Uncategorized => query.filter(leads::category_id.is_null()),
        CategoryFilter::Only(category_id) => query.filter(leads::category_id.eq(category_id)),
    }
}

#[async_trait]
impl CrmStore for PgStore {
    async fn ping(&self) -> CrmResult<()> {
        self.run(|conn| {
            diesel::sql_query("SELECT 1").execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn create_organizer(
        &self,
        user: NewUser,
        organization_name: String,
    ) -> CrmResult<(User, Organization)> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                let user = user.into_user();
                insert_user(conn, &user)?;
                let organization = Organization {
                    id: Uuid::new_v4(),
                    owner_id: user.id,
                    name: organization_name,
                    created_at: Utc::now(),
                };
                diesel::insert_into(organizations::table)
                    .values(&organization)
                    .execute(conn)?;
                Ok((user, organization))
            })
        })
        .await
    }

    async fn get_user(&self, user_id: Uuid) -> CrmResult<Option<User>> {
        self.run(move |conn| {
            users::table
                .find(user_id)
                .select(UserRecord::as_select())
                .first(conn)
                .optional()?
                .map(to_user)
                .transpose()
        })
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> CrmResult<Option<User>> {
        let username = username.to_string();
        self.run(move |conn| {
            users::table
                .filter(users::username.eq(username))
                .select(UserRecord::as_select())
                .first(conn)
                .optional()?
                .map(to_user)
                .transpose()
        })
        .await
    }

    async fn organization_owned_by(&self, user_id: Uuid) -> CrmResult<Option<Organization>> {
        self.run(move |conn| {
            Ok(organizations::table
                .filter(organizations::owner_id.eq(user_id))
                .select(Organization::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn agent_for_user(&self, user_id: Uuid) -> CrmResult<Option<Agent>> {
        self.run(move |conn| {
            Ok(agents::table
                .filter(agents::user_id.eq(user_id))
                .select(Agent::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn create_agent(&self, user: NewUser, organization_id: Uuid) -> CrmResult<AgentProfile> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                if !organization_exists(conn, organization_id)? {
                    return Err(CrmError::NotFound);
                }
                let user = user.into_user();
                insert_user(conn, &user)?;
                let agent = Agent {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    organization_id,
                    created_at: Utc::now(),
                };
                diesel::insert_into(agents::table)
                    .values(&agent)
                    .execute(conn)?;
                Ok(AgentProfile::new(agent, user))
            })
        })
        .await
    }

    async fn list_agents(&self, organization_id: Uuid) -> CrmResult<Vec<AgentProfile>> {
        self.run(move |conn| {
            let rows: Vec<(Agent, UserRecord)> = agents::table
                .inner_join(users::table.on(users::id.eq(agents::user_id)))
                .filter(agents::organization_id.eq(organization_id))
                .order(users::username.asc())
                .select((Agent::as_select(), UserRecord::as_select()))
                .load(conn)?;
            rows.into_iter()
                .map(|(agent, record)| Ok(AgentProfile::new(agent, to_user(record)?)))
                .collect()
        })
        .await
    }

    async fn get_agent(
        &self,
        organization_id: Uuid,
        agent_id: Uuid,
    ) -> CrmResult<Option<AgentProfile>> {
        self.run(move |conn| {
            find_agent(conn, organization_id, agent_id)?
                .map(|agent| load_profile(conn, agent))
                .transpose()
        })
        .await
    }

    async fn update_agent(
        &self,
        organization_id: Uuid,
        agent_id: Uuid,
        changes: UserChanges,
    ) -> CrmResult<Option<AgentProfile>> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                let Some(agent) = find_agent(conn, organization_id, agent_id)? else {
                    return Ok(None);
                };
                if let Some(email) = changes.email {
                    diesel::update(users::table.find(agent.user_id))
                        .set(users::email.eq(email))
                        .execute(conn)?;
                }
                if let Some(first_name) = changes.first_name {
                    diesel::update(users::table.find(agent.user_id))
                        .set(users::first_name.eq(first_name))
                        .execute(conn)?;
                }
                if let Some(last_name) = changes.last_name {
                    diesel::update(users::table.find(agent.user_id))
                        .set(users::last_name.eq(last_name))
                        .execute(conn)?;
                }
                load_profile(conn, agent).map(Some)
            })
        })
        .await
    }

    async fn delete_agent(&self, organization_id: Uuid, agent_id: Uuid) -> CrmResult<bool> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                diesel::update(leads::table.filter(leads::agent_id.eq(agent_id)))
                    .set((
                        leads::agent_id.eq(None::<Uuid>),
                        leads::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
                let deleted = diesel::delete(
                    agents::table
                        .filter(agents::id.eq(agent_id))
                        .filter(agents::organization_id.eq(organization_id)),
                )
                .execute(conn)?;
                if deleted == 0 {
                    // Roll back the unassignment: the agent is not ours.
                    return Err(CrmError::NotFound);
                }
                Ok(true)
            })
        })
        .await
        .or_else(|e| match e {
            CrmError::NotFound => Ok(false),
            other => Err(other),
        })
    }

    async fn create_category(&self, organization_id: Uuid, name: String) -> CrmResult<Category> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                if !organization_exists(conn, organization_id)? {
                    return Err(CrmError::NotFound);
                }
                let category = Category {
                    id: Uuid::new_v4(),
                    organization_id,
                    name,
                    created_at: Utc::now(),
                };
                diesel::insert_into(categories::table)
                    .values(&category)
                    .execute(conn)?;
                Ok(category)
            })
        })
        .await
    }

    async fn list_categories(&self, organization_id: Uuid) -> CrmResult<Vec<Category>> {
        self.run(move |conn| {
            Ok(categories::table
                .filter(categories::organization_id.eq(organization_id))
                .order(categories::name.asc())
                .select(Category::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn get_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
    ) -> CrmResult<Option<Category>> {
        self.run(move |conn| {
            Ok(categories::table
                .filter(categories::id.eq(category_id))
                .filter(categories::organization_id.eq(organization_id))
                .select(Category::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_category(&self, organization_id: Uuid, category_id: Uuid) -> CrmResult<bool> {
        self.run(move |conn| {
            let deleted = diesel::delete(
                categories::table
                    .filter(categories::id.eq(category_id))
                    .filter(categories::organization_id.eq(organization_id)),
            )
            .execute(conn)?;
            // leads.category_id is ON DELETE SET NULL
            Ok(deleted > 0)
        })
        .await
    }

    async fn insert_lead(&self, lead: NewLead) -> CrmResult<Lead> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                if !organization_exists(conn, lead.organization_id)? {
                    return Err(CrmError::NotFound);
                }
                let lead = lead.into_lead();
                diesel::insert_into(leads::table).values(&lead).execute(conn)?;
                Ok(lead)
            })
        })
        .await
    }

    async fn list_leads(&self, filter: &LeadFilter) -> CrmResult<Vec<Lead>> {
        let filter = *filter;
        self.run(move |conn| {
            Ok(filtered_leads(&filter)
                .order((leads::created_at.desc(), leads::id.asc()))
                .select(Lead::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn count_leads(&self, filter: &LeadFilter) -> CrmResult<i64> {
        let filter = *filter;
        self.run(move |conn| Ok(filtered_leads(&filter).count().get_result(conn)?))
            .await
    }

    async fn get_lead(&self, filter: &LeadFilter, lead_id: Uuid) -> CrmResult<Option<Lead>> {
        let filter = *filter;
        self.run(move |conn| {
            Ok(filtered_leads(&filter)
                .filter(leads::id.eq(lead_id))
                .select(Lead::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn update_lead(
        &self,
        filter: &LeadFilter,
        lead_id: Uuid,
        changes: LeadChanges,
    ) -> CrmResult<Option<Lead>> {
        let filter = *filter;
        self.run(move |conn| {
            conn.transaction(|conn| {
                let Some(mut lead) = filtered_leads(&filter)
                    .filter(leads::id.eq(lead_id))
                    .select(Lead::as_select())
                    .first(conn)
                    .optional()?
                else {
                    return Ok(None);
                };

                if let Some(Some(agent_id)) = changes.agent {
                    if find_agent(conn, lead.organization_id, agent_id)?.is_none() {
                        return Err(CrmError::validation(
                            "Agent does not belong to the lead's organization",
                        ));
                    }
                }
                if let Some(Some(category_id)) = changes.category {
                    let owned: i64 = categories::table
                        .filter(categories::id.eq(category_id))
                        .filter(categories::organization_id.eq(lead.organization_id))
                        .count()
                        .get_result(conn)?;
                    if owned == 0 {
                        return Err(CrmError::validation(
                            "Category does not belong to the lead's organization",
                        ));
                    }
                }

                changes.apply_to(&mut lead);
                diesel::update(leads::table.find(lead.id))
                    .set((
                        leads::first_name.eq(&lead.first_name),
                        leads::last_name.eq(&lead.last_name),
                        leads::age.eq(lead.age),
                        leads::email.eq(&lead.email),
                        leads::phone_number.eq(&lead.phone_number),
                        leads::description.eq(&lead.description),
                        leads::agent_id.eq(lead.agent_id),
                        leads::category_id.eq(lead.category_id),
                        leads::updated_at.eq(lead.updated_at),
                    ))
                    .execute(conn)?;
                Ok(Some(lead))
            })
        })
        .await
    }

    async fn delete_lead(&self, organization_id: Uuid, lead_id: Uuid) -> CrmResult<bool> {
        self.run(move |conn| {
            let deleted = diesel::delete(
                leads::table
                    .filter(leads::id.eq(lead_id))
                    .filter(leads::organization_id.eq(organization_id)),
            )
            .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }
}
