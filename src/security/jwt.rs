use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ISSUER: &str = "crmserver";
pub const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iss: ISSUER.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("Invalid subject in token: {e}"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn from_secret(secret: &str, ttl_hours: i64) -> Result<Self> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(anyhow!(
                "JWT secret must be at least {MIN_SECRET_LENGTH} characters"
            ));
        }
        if ttl_hours <= 0 {
            return Err(anyhow!("Token lifetime must be positive"));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        })
    }

    pub fn issue(&self, user_id: Uuid) -> Result<IssuedToken> {
        let claims = Claims::new(user_id, self.ttl);
        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow!("Failed to encode access token: {e}"))?;
        Ok(IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_in: self.ttl.num_seconds(),
        })
    }

    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| anyhow!("Token validation failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-with-at-least-32-chars!";

    #[test]
    fn test_issue_and_validate() {
        let manager = JwtManager::from_secret(SECRET, 1).unwrap();
        let user_id = Uuid::new_v4();
        let token = manager.issue(user_id).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 3600);

        let claims = manager.validate(&token.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.iss, ISSUER);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let manager = JwtManager::from_secret(SECRET, 1).unwrap();
        let other = JwtManager::from_secret("another-secret-key-with-32-chars-min", 1).unwrap();
        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(manager.validate(&token.access_token).is_err());
    }

    #[test]
    fn test_short_secret_is_rejected() {
        assert!(JwtManager::from_secret("short", 1).is_err());
        assert!(JwtManager::from_secret(SECRET, 0).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let manager = JwtManager::from_secret(SECRET, 1).unwrap();
        let claims = Claims::new(Uuid::new_v4(), Duration::hours(-2));
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(manager.validate(&token).is_err());
    }
}
