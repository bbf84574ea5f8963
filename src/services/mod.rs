// src/services/mod.rs
pub mod admin_service;
pub mod announcement_service;
pub mod auth_service;
pub mod health_service;
pub mod member_service;
pub mod study_service;
pub mod team_service;
pub mod upload_service;
pub mod user_service;

/// True when the error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
