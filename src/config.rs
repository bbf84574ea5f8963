// src/config.rs
use crate::error::{AppError, AppResult};
use std::{env, net::SocketAddr, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub cors_origin: Option<String>,
    pub token_ttl_hours: i64,
    pub token_ttl_long_days: i64,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Reads the configuration from the environment (and `.env`, if present).
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            tracing::warn!("JWT_SECRET is short, consider a longer random key");
        }

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("invalid BIND_ADDR: {}", e)))?;

        let upload_dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()));

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            upload_dir,
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|s| !s.trim().is_empty()),
            token_ttl_hours: parse_number("TOKEN_TTL_HOURS", 24)?,
            token_ttl_long_days: parse_number("TOKEN_TTL_LONG_DAYS", 30)?,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        })
    }
}

fn parse_number(key: &str, default: i64) -> AppResult<i64> {
    match env::var(key) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<i64>()
                .map_err(|e| AppError::Config(format!("invalid {}: {}", key, e)))?;
            if value <= 0 {
                return Err(AppError::Config(format!("{} must be positive", key)));
            }
            Ok(value)
        }
        Err(_) => Ok(default),
    }
}
