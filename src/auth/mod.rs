use crate::config::AppConfig;
use crate::db::DbPool;
use crate::entities::{session_log, user, Role};
use crate::errors::ErrorResponse;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// JWT claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (stringified)
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Token id; also the key of the matching session log row
    pub jti: String,
    pub iat: u64,
    pub exp: u64,
    pub iss: String,
    pub aud: String,
}

/// Settings for token issuance and validation.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_expiration: Duration,
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            token_expiration: Duration::from_secs(cfg.jwt_expiration),
        }
    }
}

/// Authentication failures, mapped straight to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Session has been revoked")]
    RevokedToken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Requires {0} role")]
    InsufficientRole(Role),

    #[error("Password hashing failed")]
    HashError,

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Auth service not configured")]
    MissingAuthService,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken
            | Self::InvalidToken
            | Self::RevokedToken
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UsernameTaken => StatusCode::CONFLICT,
            Self::InsufficientRole(_) => StatusCode::FORBIDDEN,
            Self::HashError | Self::Database(_) | Self::MissingAuthService => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn response_message(&self) -> String {
        match self {
            Self::HashError | Self::Database(_) | Self::MissingAuthService => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// The authenticated caller, inserted into request extensions by
/// `auth_middleware` and read back by handlers via the extractor.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    /// `jti` of the bearer token
    pub token_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Issues and validates tokens, manages credentials and session rows.
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DbPool>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            db,
            encoding_key,
            decoding_key,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::HashError)
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|_| AuthError::HashError)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Creates a new account. The very first account becomes ADMIN;
    /// after that, granting an elevated role requires an ADMIN caller.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        requested_role: Option<Role>,
        acting: Option<&AuthUser>,
    ) -> Result<user::Model, AuthError> {
        let existing = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        // The first account bootstraps the system as ADMIN. After that an
        // elevated role is only honored for an ADMIN caller; anyone else
        // gets a plain USER account.
        let user_count = user::Entity::find().count(self.db.as_ref()).await?;
        let role = if user_count == 0 {
            Role::Admin
        } else {
            match requested_role {
                Some(Role::User) | None => Role::User,
                Some(elevated) => {
                    let acting_is_admin = acting.map(|u| u.role == Role::Admin).unwrap_or(false);
                    if acting_is_admin {
                        elevated
                    } else {
                        warn!(username, "elevated role requested without admin caller");
                        Role::User
                    }
                }
            }
        };

        let now = Utc::now();
        let created = user::ActiveModel {
            username: Set(username.to_string()),
            role: Set(role),
            password_hash: Set(self.hash_password(password)?),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        info!(user_id = created.id, role = %created.role, "registered user");
        Ok(created)
    }

    /// Verifies credentials and opens a session. Returns the bearer token
    /// together with the user record.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<(String, user::Model), AuthError> {
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_session(&user, ip_address, user_agent).await?;
        info!(user_id = user.id, "user logged in");
        Ok((token, user))
    }

    /// Mints a JWT and records the matching session log row.
    pub async fn issue_session(
        &self,
        user: &user::Model,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<String, AuthError> {
        let jti = Uuid::new_v4().to_string();
        let now = Utc::now();
        let iat = now.timestamp() as u64;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            jti: jti.clone(),
            iat,
            exp: iat + self.config.token_expiration.as_secs(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        session_log::ActiveModel {
            token: Set(jti),
            user_id: Set(user.id),
            ip_address: Set(ip_address.to_string()),
            user_agent: Set(user_agent.to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Validates a bearer token: signature, expiry, issuer/audience, and a
    /// still-live session row. A deleted session row invalidates the token.
    pub async fn validate_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("token rejected: {}", e);
            AuthError::InvalidToken
        })?;
        let claims = data.claims;

        let session = session_log::Entity::find()
            .filter(session_log::Column::Token.eq(claims.jti.as_str()))
            .one(self.db.as_ref())
            .await?;
        if session.is_none() {
            return Err(AuthError::RevokedToken);
        }

        let user_id = claims.sub.parse::<i64>().map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            user_id,
            username: claims.username,
            role: claims.role,
            token_id: claims.jti,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Outer layer: makes the auth service reachable from inner middleware and
/// handlers through request extensions.
pub async fn attach_auth_service(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Response {
    req.extensions_mut().insert(auth);
    next.run(req).await
}

/// Requires a valid bearer token and stores the caller as an extension.
pub async fn auth_middleware(mut req: Request, next: Next) -> Result<Response, AuthError> {
    let auth = req
        .extensions()
        .get::<Arc<AuthService>>()
        .cloned()
        .ok_or(AuthError::MissingAuthService)?;
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
    let user = auth.validate_token(&token).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Requires the authenticated caller to hold `required` or a higher role.
/// Must run after `auth_middleware`.
pub async fn role_middleware(
    State(required): State<Role>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingToken)?;
    if !user.role.satisfies(required) {
        warn!(
            user = %user.username,
            role = %user.role,
            required = %required,
            "access denied"
        );
        return Err(AuthError::InsufficientRole(required));
    }
    Ok(next.run(req).await)
}

/// Router helpers for guarding route groups.
pub trait AuthRouterExt {
    /// Any authenticated user.
    fn with_auth(self) -> Self;
    /// Authenticated user holding `required` or a higher role.
    fn with_role(self, required: Role) -> Self;
}

impl<S> AuthRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(middleware::from_fn(auth_middleware))
    }

    fn with_role(self, required: Role) -> Self {
        // Layers run outermost-last-added: auth first, then the role check.
        self.layer(middleware::from_fn_with_state(required, role_middleware))
            .layer(middleware::from_fn(auth_middleware))
    }
}
