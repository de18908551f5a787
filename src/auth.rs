/// Authentication: bearer tokens, password hashing and request extractors
use crate::{
    admin::Role,
    api::middleware::extract_bearer_token,
    context::AppContext,
    error::{AppError, AppResult},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Token payload. The server keeps no session state; this is all it knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token valid for the configured lifetime starting now
    pub fn issue(&self, id: i64, username: &str, role: Role) -> AppResult<String> {
        self.issue_at(id, username, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        id: i64,
        username: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> AppResult<String> {
        let claims = Claims {
            id,
            username: username.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Jwt(format!("Failed to generate token: {}", e)))
    }

    /// Verify signature and expiry
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token verification failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::Authentication("Token has expired".to_string())
                    }
                    _ => AppError::Authentication("Invalid token".to_string()),
                }
            })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Hash a password with Argon2id on the blocking pool
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_owned();

    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::PasswordHash(e.to_string()))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// Check a password against a stored PHC hash string
pub async fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();

    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&password_hash)
            .map_err(|e| AppError::PasswordHash(format!("Invalid password hash format: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
}

/// Authenticated admin, populated from the verified token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Authentication("Missing authorization token".to_string()))?;

        let claims = state.tokens.verify(&token)?;

        Ok(AuthContext {
            id: claims.id,
            username: claims.username,
            role: claims.role,
        })
    }
}

/// Authenticated admin holding the superadmin role
#[derive(Debug, Clone)]
pub struct SuperAdminContext(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppContext> for SuperAdminContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_request_parts(parts, state).await?;

        if !auth.role.can_act_as(Role::SuperAdmin) {
            tracing::warn!("{} attempted a superadmin-only action", auth.username);
            return Err(AppError::Authorization(
                "Only the super admin can access this resource".to_string(),
            ));
        }

        Ok(SuperAdminContext(auth))
    }
}
