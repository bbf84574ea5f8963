// src/services/announcement_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        announcement::{
            sort_for_listing, AdminAnnouncement, Announcement, CreateAnnouncementRequest,
            UpdateAnnouncementRequest,
        },
        non_empty,
        user::CurrentUser,
    },
};
use chrono::Utc;
use sqlx::SqlitePool;

const ANNOUNCEMENT_SELECT: &str = r#"
    SELECT a.id, a.title, a.summary, a.content, a.publish_at, a.author_id,
           u.name AS author_name, a.view_count, a.created_at, a.updated_at
    FROM announcements a
    JOIN users u ON u.id = a.author_id
"#;

// Timestamps are compared in Rust. Text timestamps with varying fractional
// digits do not order reliably inside SQLite.
async fn fetch_all(db_pool: &SqlitePool) -> AppResult<Vec<Announcement>> {
    let items = sqlx::query_as::<_, Announcement>(ANNOUNCEMENT_SELECT)
        .fetch_all(db_pool)
        .await?;
    Ok(items)
}

async fn find_announcement(db_pool: &SqlitePool, id: i64) -> AppResult<Announcement> {
    let sql = format!("{} WHERE a.id = ?1", ANNOUNCEMENT_SELECT);
    sqlx::query_as::<_, Announcement>(&sql)
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("announcement {} not found", id)))
}

pub async fn list_published(db_pool: &SqlitePool) -> AppResult<Vec<Announcement>> {
    let now = Utc::now();
    let mut items: Vec<Announcement> = fetch_all(db_pool)
        .await?
        .into_iter()
        .filter(|a| a.is_published(now))
        .collect();
    sort_for_listing(&mut items);
    tracing::debug!("Listing {} published announcements.", items.len());
    Ok(items)
}

pub async fn list_for_admin(db_pool: &SqlitePool) -> AppResult<Vec<AdminAnnouncement>> {
    let now = Utc::now();
    let mut items = fetch_all(db_pool).await?;
    sort_for_listing(&mut items);
    Ok(items.into_iter().map(|a| AdminAnnouncement::new(a, now)).collect())
}

/// Reads one announcement and counts the view. Scheduled announcements are
/// invisible to everyone but admins.
pub async fn view_announcement(db_pool: &SqlitePool, viewer: Option<&CurrentUser>, id: i64) -> AppResult<Announcement> {
    let announcement = find_announcement(db_pool, id).await?;
    let is_admin = viewer.is_some_and(CurrentUser::is_admin);
    if !announcement.is_published(Utc::now()) && !is_admin {
        tracing::debug!("Announcement {} is still scheduled.", id);
        return Err(AppError::NotFound(format!("announcement {} not found", id)));
    }

    sqlx::query("UPDATE announcements SET view_count = view_count + 1 WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?;
    find_announcement(db_pool, id).await
}

pub async fn create_announcement(
    db_pool: &SqlitePool,
    actor: &CurrentUser,
    req: &CreateAnnouncementRequest,
) -> AppResult<Announcement> {
    let now = Utc::now();
    let publish_at = req.publish_at.unwrap_or(now);
    let id = sqlx::query(
        r#"
        INSERT INTO announcements (title, summary, content, publish_at, author_id, view_count, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
        "#,
    )
    .bind(req.title.trim())
    .bind(non_empty(req.summary.clone()))
    .bind(&req.content)
    .bind(publish_at)
    .bind(actor.id)
    .bind(now)
    .execute(db_pool)
    .await?
    .last_insert_rowid();

    if publish_at > now {
        tracing::info!("📢 Announcement {} scheduled for {}", id, publish_at);
    } else {
        tracing::info!("📢 Announcement {} published", id);
    }
    find_announcement(db_pool, id).await
}

pub async fn update_announcement(db_pool: &SqlitePool, id: i64, req: &UpdateAnnouncementRequest) -> AppResult<Announcement> {
    let mut announcement = find_announcement(db_pool, id).await?;
    if let Some(title) = &req.title {
        announcement.title = title.trim().to_string();
    }
    if req.summary.is_some() {
        announcement.summary = non_empty(req.summary.clone());
    }
    if let Some(content) = &req.content {
        announcement.content = content.clone();
    }
    if let Some(publish_at) = req.publish_at {
        announcement.publish_at = publish_at;
    }

    sqlx::query(
        "UPDATE announcements SET title = ?1, summary = ?2, content = ?3, publish_at = ?4, updated_at = ?5 WHERE id = ?6",
    )
    .bind(&announcement.title)
    .bind(&announcement.summary)
    .bind(&announcement.content)
    .bind(announcement.publish_at)
    .bind(Utc::now())
    .bind(id)
    .execute(db_pool)
    .await?;

    tracing::info!("Announcement {} updated", id);
    find_announcement(db_pool, id).await
}

pub async fn delete_announcement(db_pool: &SqlitePool, id: i64) -> AppResult<()> {
    let removed = sqlx::query("DELETE FROM announcements WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if removed == 0 {
        return Err(AppError::NotFound(format!("announcement {} not found", id)));
    }
    tracing::info!("🗑️ Announcement {} deleted", id);
    Ok(())
}
