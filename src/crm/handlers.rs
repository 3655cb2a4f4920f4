use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use super::error::CrmError;
use super::extract::{JsonBody, PathParam};
use super::scope::{CategoryDetail, CategoryListing, LeadListing};
use super::types::{
    AssignAgentRequest, CreateAgentRequest, CreateCategoryRequest, CreateLeadRequest,
    CreatedAgent, LoginRequest, LoginResponse, SignupRequest, SignupResponse,
    UpdateAgentRequest, UpdateCategoryRequest, UpdateLeadRequest,
};
use crate::core::shared::models::{AgentProfile, Category, Lead};
use crate::core::shared::state::AppState;
use crate::security::AuthenticatedUser;

pub fn configure_crm_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/leads", get(list_leads_handler).post(create_lead_handler))
        .route(
            "/api/leads/:id",
            get(get_lead_handler)
                .put(update_lead_handler)
                .delete(delete_lead_handler),
        )
        .route(
            "/api/leads/:id/assign-agent",
            post(assign_agent_handler).delete(unassign_agent_handler),
        )
        .route("/api/leads/:id/category", put(update_lead_category_handler))
        .route(
            "/api/categories",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/api/categories/:id",
            get(get_category_handler).delete(delete_category_handler),
        )
        .route("/api/agents", get(list_agents_handler).post(create_agent_handler))
        .route(
            "/api/agents/:id",
            get(get_agent_handler)
                .put(update_agent_handler)
                .delete(delete_agent_handler),
        )
}

pub async fn signup_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), CrmError> {
    let response = state.crm.accounts.signup(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, CrmError> {
    Ok(Json(state.crm.accounts.login(request).await?))
}

pub async fn list_leads_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
) -> Result<Json<LeadListing>, CrmError> {
    Ok(Json(state.crm.scope.lead_listing(&requester).await?))
}

pub async fn create_lead_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    JsonBody(request): JsonBody<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), CrmError> {
    let lead = state.crm.leads.create(&requester, request).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

pub async fn get_lead_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    PathParam(lead_id): PathParam<Uuid>,
) -> Result<Json<Lead>, CrmError> {
    Ok(Json(state.crm.leads.get(&requester, lead_id).await?))
}

pub async fn update_lead_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    PathParam(lead_id): PathParam<Uuid>,
    JsonBody(request): JsonBody<UpdateLeadRequest>,
) -> Result<Json<Lead>, CrmError> {
    Ok(Json(state.crm.leads.update(&requester, lead_id, request).await?))
}

pub async fn delete_lead_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    PathParam(lead_id): PathParam<Uuid>,
) -> Result<StatusCode, CrmError> {
    state.crm.leads.delete(&requester, lead_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_agent_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    PathParam(lead_id): PathParam<Uuid>,
    JsonBody(request): JsonBody<AssignAgentRequest>,
) -> Result<Json<Lead>, CrmError> {
    let lead = state
        .crm
        .assignment
        .assign(&requester, lead_id, request.agent_id)
        .await?;
    Ok(Json(lead))
}

pub async fn unassign_agent_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    PathParam(lead_id): PathParam<Uuid>,
) -> Result<Json<Lead>, CrmError> {
    Ok(Json(state.crm.assignment.unassign(&requester, lead_id).await?))
}

pub async fn update_lead_category_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    PathParam(lead_id): PathParam<Uuid>,
    JsonBody(request): JsonBody<UpdateCategoryRequest>,
) -> Result<Json<Lead>, CrmError> {
    let lead = state
        .crm
        .leads
        .update_category(&requester, lead_id, request.category_id)
        .await?;
    Ok(Json(lead))
}

pub async fn list_categories_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
) -> Result<Json<CategoryListing>, CrmError> {
    Ok(Json(state.crm.scope.category_listing(&requester).await?))
}

pub async fn create_category_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    JsonBody(request): JsonBody<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), CrmError> {
    let category = state.crm.categories.create(&requester, request.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    PathParam(category_id): PathParam<Uuid>,
) -> Result<Json<CategoryDetail>, CrmError> {
    Ok(Json(
        state
            .crm
            .scope
            .category_detail(&requester, category_id)
            .await?,
    ))
}

pub async fn delete_category_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    PathParam(category_id): PathParam<Uuid>,
) -> Result<StatusCode, CrmError> {
    state.crm.categories.delete(&requester, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_agents_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
) -> Result<Json<Vec<AgentProfile>>, CrmError> {
    Ok(Json(state.crm.agents.list_agents(&requester).await?))
}

pub async fn create_agent_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    JsonBody(request): JsonBody<CreateAgentRequest>,
) -> Result<(StatusCode, Json<CreatedAgent>), CrmError> {
    let created = state.crm.agents.create_agent(&requester, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_agent_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    PathParam(agent_id): PathParam<Uuid>,
) -> Result<Json<AgentProfile>, CrmError> {
    Ok(Json(state.crm.agents.get_agent(&requester, agent_id).await?))
}

pub async fn update_agent_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    PathParam(agent_id): PathParam<Uuid>,
    JsonBody(request): JsonBody<UpdateAgentRequest>,
) -> Result<Json<AgentProfile>, CrmError> {
    let agent = state
        .crm
        .agents
        .update_agent(&requester, agent_id, request)
        .await?;
    Ok(Json(agent))
}

pub async fn delete_agent_handler(
    State(state): State<AppState>,
    AuthenticatedUser(requester): AuthenticatedUser,
    PathParam(agent_id): PathParam<Uuid>,
) -> Result<StatusCode, CrmError> {
    state.crm.agents.delete_agent(&requester, agent_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
