// src/services/member_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{MemberQuery, PublicProfile, User},
};
use sqlx::SqlitePool;

/// Member directory: club members and admins who have not withdrawn.
pub async fn list_members(db_pool: &SqlitePool, query: &MemberQuery) -> AppResult<Vec<PublicProfile>> {
    let pattern = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));
    let major = query.major.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let order = match query.sort.as_deref() {
        Some("join_year") => "join_year IS NULL, join_year DESC, name ASC",
        _ => "name ASC, id ASC",
    };

    let sql = format!(
        r#"
        SELECT * FROM users
        WHERE role IN ('ADMIN', 'MEMBER')
          AND withdrawn_at IS NULL
          AND (?1 IS NULL OR name LIKE ?1 OR username LIKE ?1 OR tech_stack LIKE ?1)
          AND (?2 IS NULL OR major = ?2)
        ORDER BY {}
        "#,
        order
    );

    let users = sqlx::query_as::<_, User>(&sql)
        .bind(pattern)
        .bind(major)
        .fetch_all(db_pool)
        .await?;

    tracing::debug!("Member directory returned {} entries.", users.len());
    Ok(users.iter().map(PublicProfile::from).collect())
}

pub async fn get_member(db_pool: &SqlitePool, user_id: i64) -> AppResult<PublicProfile> {
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE id = ?1 AND role IN ('ADMIN', 'MEMBER') AND withdrawn_at IS NULL",
    )
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("member {} not found", user_id)))?;

    Ok(PublicProfile::from(&user))
}
