// src/db.rs
use crate::{config::Config, error::AppResult, models::user::UserRole, services::auth_service};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub async fn create_db_pool(config: &Config) -> AppResult<SqlitePool> {
    tracing::info!("Connecting to database: {}", config.database_url);

    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations complete.");

    Ok(pool)
}

/// Creates the bootstrap admin account when both credentials are configured
/// and no user with that username exists yet.
pub async fn ensure_admin(db_pool: &SqlitePool, config: &Config) -> AppResult<()> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 COLLATE NOCASE)")
        .bind(username)
        .fetch_one(db_pool)
        .await?;
    if exists {
        tracing::debug!("Bootstrap admin '{}' already present.", username);
        return Ok(());
    }

    let password_hash = auth_service::hash_password(password).await?;
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, name, email, role, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind("Administrator")
    .bind(format!("{}@admin.local", username))
    .bind(UserRole::Admin)
    .bind(now)
    .execute(db_pool)
    .await?;

    tracing::info!("Bootstrap admin '{}' created.", username);
    Ok(())
}
