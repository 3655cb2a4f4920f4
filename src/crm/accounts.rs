//! Sign-up, login and token subject resolution.

use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use super::error::{CrmError, CrmResult};
use super::store::CrmStore;
use super::types::{required, validate_email, LoginRequest, LoginResponse, SignupRequest, SignupResponse};
use crate::core::shared::models::{NewUser, UserRole};
use crate::security::identity::Requester;
use crate::security::jwt::JwtManager;
use crate::security::password::{validate_password, CredentialHasher};

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn CrmStore>,
    hasher: CredentialHasher,
    jwt: Arc<JwtManager>,
}

impl AccountService {
    pub fn new(store: Arc<dyn CrmStore>, hasher: CredentialHasher, jwt: Arc<JwtManager>) -> Self {
        Self { store, hasher, jwt }
    }

    /// Creates an organizer together with the organization it owns.
    pub async fn signup(&self, request: SignupRequest) -> CrmResult<SignupResponse> {
        let username = required("username", &request.username)?;
        let email = request.email.trim().to_string();
        validate_email(&email)?;
        validate_password(&request.password).map_err(CrmError::Validation)?;

        let organization_name = request
            .organization_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{username}'s organization"));

        let hasher = self.hasher.clone();
        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| CrmError::Internal(format!("Task join error: {e}")))??;

        let (user, organization) = self
            .store
            .create_organizer(
                NewUser {
                    username,
                    email,
                    first_name: request.first_name.trim().to_string(),
                    last_name: request.last_name.trim().to_string(),
                    password_hash,
                    role: UserRole::Organizer,
                },
                organization_name,
            )
            .await?;
        info!(
            "Organizer {} signed up with organization {}",
            user.username, organization.id
        );
        Ok(SignupResponse { user, organization })
    }

    /// Any mismatch is reported as `Unauthorized` without detail.
    pub async fn login(&self, request: LoginRequest) -> CrmResult<LoginResponse> {
        let user = self
            .store
            .find_user_by_username(request.username.trim())
            .await?;

        // Unknown usernames pay for a hash check too.
        let hasher = self.hasher.clone();
        let hash = user.as_ref().map(|u| u.password_hash.clone());
        let password = request.password;
        let verified = tokio::task::spawn_blocking(move || match hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => hasher.verify_decoy(&password),
        })
        .await
        .map_err(|e| CrmError::Internal(format!("Task join error: {e}")))?;

        match user {
            Some(user) if verified => Ok(self.jwt.issue(user.id)?),
            Some(user) => {
                warn!("Failed login for user {}", user.id);
                Err(CrmError::Unauthorized)
            }
            None => {
                warn!("Login attempt for unknown user");
                Err(CrmError::Unauthorized)
            }
        }
    }

    /// Rebuilds the requester identity for a token subject.
    pub async fn resolve(&self, user_id: Uuid) -> CrmResult<Requester> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(CrmError::Unauthorized)?;

        match user.role {
            UserRole::Organizer => {
                let organization = self
                    .store
                    .organization_owned_by(user.id)
                    .await?
                    .ok_or(CrmError::Unauthorized)?;
                Ok(Requester::organizer(user.id, user.email, organization.id))
            }
            UserRole::Agent => {
                let agent = self
                    .store
                    .agent_for_user(user.id)
                    .await?
                    .ok_or(CrmError::Unauthorized)?;
                Ok(Requester::agent(
                    user.id,
                    user.email,
                    agent.id,
                    agent.organization_id,
                ))
            }
        }
    }

    /// Validates a bearer token and resolves its subject.
    pub async fn authenticate(&self, token: &str) -> CrmResult<Requester> {
        let claims = self.jwt.validate(token).map_err(|e| {
            warn!("Rejected bearer token: {e}");
            CrmError::Unauthorized
        })?;
        let user_id = claims.user_id().map_err(|_| CrmError::Unauthorized)?;
        self.resolve(user_id).await
    }
}
