// src/services/auth_service.rs
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::user::{
        AuthResponse, LoginRequest, RegisterRequest, User, UserProfile, UserRole, STORAGE_KEYS,
    },
    services::user_service,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<i64> {
        self.sub.parse().map_err(|_| AppError::Unauthorized)
    }
}

/// Checks a password against the stored bcrypt hash.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verifying bcrypt hash...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("spawn_blocking task failed (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("bcrypt error while verifying password: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Produces a bcrypt hash for a password.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Generating bcrypt hash...");
        bcrypt::hash(&password, bcrypt::DEFAULT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("spawn_blocking task failed (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("bcrypt error while hashing password: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Issues an access token. Returns the token and its lifetime in seconds.
pub fn issue_token(config: &Config, user: &User, keep_logged_in: bool) -> AppResult<(String, i64)> {
    let ttl = if keep_logged_in {
        Duration::days(config.token_ttl_long_days)
    } else {
        Duration::hours(config.token_ttl_hours)
    };
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok((token, ttl.num_seconds()))
}

pub fn decode_token(secret: &str, token: &str) -> AppResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn auth_response(config: &Config, user: &User, keep_logged_in: bool) -> AppResult<AuthResponse> {
    let (access_token, expires_in) = issue_token(config, user, keep_logged_in)?;
    Ok(AuthResponse {
        access_token,
        token_type: "Bearer",
        expires_in,
        keep_logged_in,
        user: UserProfile::from(user),
        storage_keys: STORAGE_KEYS,
    })
}

pub async fn register(
    db_pool: &SqlitePool,
    config: &Config,
    req: RegisterRequest,
) -> AppResult<AuthResponse> {
    tracing::info!("Registration attempt for username: {}", req.username);

    if !user_service::is_username_available(db_pool, &req.username).await? {
        return Err(AppError::Conflict("username is already taken".into()));
    }
    if !user_service::is_email_available(db_pool, &req.email).await? {
        return Err(AppError::Conflict("email is already registered".into()));
    }

    let password_hash = hash_password(&req.password).await?;
    let user = user_service::create_user(db_pool, &req, &password_hash).await?;

    tracing::info!("✅ User '{}' registered (id {}).", user.username, user.id);
    auth_response(config, &user, false)
}

pub async fn login(db_pool: &SqlitePool, config: &Config, req: LoginRequest) -> AppResult<AuthResponse> {
    tracing::info!("Login attempt for username: {}", req.username);

    let Some(user) = user_service::find_user_by_username(db_pool, &req.username).await? else {
        tracing::warn!("Login failed: unknown username {}", req.username);
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash).await? {
        tracing::warn!("Login failed: wrong password for {}", req.username);
        return Err(AppError::InvalidCredentials);
    }

    if user.is_withdrawn() {
        tracing::warn!("Login refused: account {} is withdrawn", user.id);
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!("✅ Login succeeded for: {}", user.username);
    auth_response(config, &user, req.keep_logged_in)
}
