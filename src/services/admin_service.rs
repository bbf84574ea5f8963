// src/services/admin_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        admin::{
            ActivityImage, ActivityImageUpdate, ActivityImageView, ImportSummary, PhotoEntry,
            RecruitmentSettings, RecruitmentStatus, RecruitmentUpdate, SettingsBundle, Statistics,
            StatisticsInput, PHOTOS_FILE, STATISTIC_FILE,
        },
        join_list, non_empty,
    },
    services::upload_service::{self, UploadedFile, ACTIVITY_DIR, MAX_ACTIVITY_BYTES},
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::Path;
use validator::Validate;

// ---- Recruitment ----------------------------------------------------------

pub async fn get_recruitment(db_pool: &SqlitePool) -> AppResult<RecruitmentSettings> {
    let settings = sqlx::query_as::<_, RecruitmentSettings>(
        "SELECT start_at, end_at, is_enabled, auto_toggle, updated_at FROM recruitment_settings WHERE id = 1",
    )
    .fetch_one(db_pool)
    .await?;
    Ok(settings)
}

/// Public view of the recruitment window.
pub async fn recruitment_status(db_pool: &SqlitePool) -> AppResult<RecruitmentStatus> {
    let settings = get_recruitment(db_pool).await?;
    let is_open = settings.is_open(Utc::now());
    Ok(RecruitmentStatus { settings, is_open })
}

pub async fn update_recruitment(db_pool: &SqlitePool, req: &RecruitmentUpdate) -> AppResult<RecruitmentSettings> {
    sqlx::query(
        r#"
        UPDATE recruitment_settings
        SET start_at = ?1, end_at = ?2, is_enabled = ?3, auto_toggle = ?4, updated_at = ?5
        WHERE id = 1
        "#,
    )
    .bind(req.start_at)
    .bind(req.end_at)
    .bind(req.is_enabled)
    .bind(req.auto_toggle)
    .bind(Utc::now())
    .execute(db_pool)
    .await?;

    tracing::info!(
        "Recruitment settings updated: enabled={}, auto_toggle={}",
        req.is_enabled,
        req.auto_toggle
    );
    get_recruitment(db_pool).await
}

// ---- Activity images ------------------------------------------------------

async fn fetch_activities(db_pool: &SqlitePool) -> AppResult<Vec<ActivityImage>> {
    let images = sqlx::query_as::<_, ActivityImage>(
        "SELECT * FROM activity_images ORDER BY sort_order ASC, id ASC",
    )
    .fetch_all(db_pool)
    .await?;
    Ok(images)
}

async fn find_activity(db_pool: &SqlitePool, id: i64) -> AppResult<ActivityImage> {
    sqlx::query_as::<_, ActivityImage>("SELECT * FROM activity_images WHERE id = ?1")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("activity image {} not found", id)))
}

pub async fn list_activities(db_pool: &SqlitePool) -> AppResult<Vec<ActivityImageView>> {
    let images = fetch_activities(db_pool).await?;
    Ok(images.into_iter().map(ActivityImageView::from).collect())
}

#[derive(Debug, Default)]
pub struct NewActivity {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub sort_order: Option<i64>,
}

/// Stores an activity image and its row; the file is removed if the insert fails.
pub async fn create_activity(
    db_pool: &SqlitePool,
    upload_root: &Path,
    meta: NewActivity,
    image: &UploadedFile,
) -> AppResult<ActivityImageView> {
    let extension = upload_service::validate_image(image.content_type.as_deref(), &image.bytes, MAX_ACTIVITY_BYTES)?;

    let sort_order = match meta.sort_order {
        Some(order) => order,
        None => {
            let max: Option<i64> = sqlx::query_scalar("SELECT MAX(sort_order) FROM activity_images")
                .fetch_one(db_pool)
                .await?;
            max.map_or(0, |m| m + 1)
        }
    };

    let stored_name = upload_service::store_file(upload_root, ACTIVITY_DIR, extension, &image.bytes).await?;
    let image_url = upload_service::public_url(ACTIVITY_DIR, &stored_name);

    let inserted = sqlx::query(
        "INSERT INTO activity_images (title, image_url, tags, sort_order, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(non_empty(meta.title))
    .bind(&image_url)
    .bind(join_list(&meta.tags))
    .bind(sort_order)
    .bind(Utc::now())
    .execute(db_pool)
    .await;

    let id = match inserted {
        Ok(done) => done.last_insert_rowid(),
        Err(e) => {
            upload_service::remove_file(upload_root, ACTIVITY_DIR, &stored_name).await;
            return Err(e.into());
        }
    };

    tracing::info!("🖼️ Activity image {} added ({})", id, image_url);
    find_activity(db_pool, id).await.map(ActivityImageView::from)
}

pub async fn update_activity(db_pool: &SqlitePool, id: i64, req: &ActivityImageUpdate) -> AppResult<ActivityImageView> {
    let mut image = find_activity(db_pool, id).await?;
    if req.title.is_some() {
        image.title = non_empty(req.title.clone());
    }
    if let Some(tags) = &req.tags {
        image.tags = join_list(tags);
    }
    if let Some(order) = req.sort_order {
        image.sort_order = order;
    }

    sqlx::query("UPDATE activity_images SET title = ?1, tags = ?2, sort_order = ?3 WHERE id = ?4")
        .bind(&image.title)
        .bind(&image.tags)
        .bind(image.sort_order)
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(ActivityImageView::from(image))
}

pub async fn delete_activity(db_pool: &SqlitePool, upload_root: &Path, id: i64) -> AppResult<()> {
    let image = find_activity(db_pool, id).await?;
    sqlx::query("DELETE FROM activity_images WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?;

    // Imported entries may point at external URLs; only our own files are removed.
    if let Some(stored_name) = upload_service::stored_name_from_url(ACTIVITY_DIR, &image.image_url) {
        upload_service::remove_file(upload_root, ACTIVITY_DIR, stored_name).await;
    }
    tracing::info!("🗑️ Activity image {} deleted", id);
    Ok(())
}

// ---- Statistics -----------------------------------------------------------

pub async fn get_statistics(db_pool: &SqlitePool) -> AppResult<Statistics> {
    let stats = sqlx::query_as::<_, Statistics>(
        "SELECT member_count, award_count, project_count, employment_rate, updated_at FROM statistics WHERE id = 1",
    )
    .fetch_one(db_pool)
    .await?;
    Ok(stats)
}

async fn write_statistics<'e, E>(executor: E, input: &StatisticsInput) -> AppResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE statistics
        SET member_count = ?1, award_count = ?2, project_count = ?3, employment_rate = ?4, updated_at = ?5
        WHERE id = 1
        "#,
    )
    .bind(input.member_count)
    .bind(input.award_count)
    .bind(input.project_count)
    .bind(input.employment_rate)
    .bind(Utc::now())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn update_statistics(db_pool: &SqlitePool, input: &StatisticsInput) -> AppResult<Statistics> {
    write_statistics(db_pool, input).await?;
    tracing::info!("📊 Statistics updated: {:?}", input);
    get_statistics(db_pool).await
}

// ---- Settings bundle ------------------------------------------------------

pub async fn export_statistic(db_pool: &SqlitePool) -> AppResult<Vec<u8>> {
    let stats = get_statistics(db_pool).await?;
    to_json(&StatisticsInput::from(&stats))
}

pub async fn export_photos(db_pool: &SqlitePool) -> AppResult<Vec<u8>> {
    let images = fetch_activities(db_pool).await?;
    let entries: Vec<PhotoEntry> = images.iter().map(PhotoEntry::from).collect();
    to_json(&entries)
}

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| {
        tracing::error!("Failed to serialize export: {:?}", e);
        AppError::InternalServerError
    })
}

/// Builds an import bundle from uploaded `(file name, bytes)` pairs. Both
/// files have to be present; anything else is ignored.
pub fn parse_bundle(files: Vec<(String, Vec<u8>)>) -> AppResult<SettingsBundle> {
    let mut statistic = None;
    let mut photos = None;
    for (name, bytes) in files {
        match name.as_str() {
            STATISTIC_FILE => statistic = Some(bytes),
            PHOTOS_FILE => photos = Some(bytes),
            other => tracing::debug!("Ignoring unexpected import part: {}", other),
        }
    }

    let (statistic, photos) = match (statistic, photos) {
        (Some(s), Some(p)) => (s, p),
        (None, None) => {
            return Err(AppError::BadRequest(format!(
                "{} and {} must be uploaded together",
                STATISTIC_FILE, PHOTOS_FILE
            )));
        }
        (None, Some(_)) => {
            return Err(AppError::BadRequest(format!("{} is missing from the import", STATISTIC_FILE)));
        }
        (Some(_), None) => {
            return Err(AppError::BadRequest(format!("{} is missing from the import", PHOTOS_FILE)));
        }
    };

    let statistic: StatisticsInput = serde_json::from_slice(&statistic)
        .map_err(|e| AppError::BadRequest(format!("{} is not valid: {}", STATISTIC_FILE, e)))?;
    statistic.validate()?;

    let photos: Vec<PhotoEntry> = serde_json::from_slice(&photos)
        .map_err(|e| AppError::BadRequest(format!("{} is not valid: {}", PHOTOS_FILE, e)))?;
    if let Some(pos) = photos.iter().position(|p| p.image_url.trim().is_empty()) {
        return Err(AppError::BadRequest(format!(
            "{} entry {} has an empty image_url",
            PHOTOS_FILE, pos
        )));
    }

    Ok(SettingsBundle { statistic, photos })
}

/// Replaces statistics and activity image rows in one transaction. Image
/// files on disk are left alone.
pub async fn import_settings(db_pool: &SqlitePool, bundle: SettingsBundle) -> AppResult<ImportSummary> {
    let mut tx = db_pool.begin().await?;

    write_statistics(&mut *tx, &bundle.statistic).await?;
    sqlx::query("DELETE FROM activity_images")
        .execute(&mut *tx)
        .await?;

    let now = Utc::now();
    for entry in &bundle.photos {
        sqlx::query(
            "INSERT INTO activity_images (title, image_url, tags, sort_order, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(non_empty(entry.title.clone()))
        .bind(entry.image_url.trim())
        .bind(join_list(&entry.tags))
        .bind(entry.sort_order)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!("✅ Settings imported: {} activity images", bundle.photos.len());
    Ok(ImportSummary {
        photo_count: bundle.photos.len(),
        statistic: bundle.statistic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = r#"{"member_count": 40, "award_count": 3, "project_count": 12, "employment_rate": 87.5}"#;
    const PHOTOS: &str = r#"[{"title": "MT", "image_url": "/uploads/activities/a.png", "tags": ["mt"], "sort_order": 1}]"#;

    fn part(name: &str, body: &str) -> (String, Vec<u8>) {
        (name.to_string(), body.as_bytes().to_vec())
    }

    #[test]
    fn bundle_needs_both_files() {
        let err = parse_bundle(vec![part(STATISTIC_FILE, STAT)]).unwrap_err();
        assert!(err.to_string().contains(PHOTOS_FILE));

        let err = parse_bundle(vec![part(PHOTOS_FILE, PHOTOS)]).unwrap_err();
        assert!(err.to_string().contains(STATISTIC_FILE));

        let err = parse_bundle(vec![part("statistics.json", STAT), part("photo.json", PHOTOS)]).unwrap_err();
        assert!(err.to_string().contains("together"));
    }

    #[test]
    fn bundle_parses_when_complete() {
        let bundle = parse_bundle(vec![part(PHOTOS_FILE, PHOTOS), part(STATISTIC_FILE, STAT)]).unwrap();
        assert_eq!(bundle.statistic.member_count, 40);
        assert_eq!(bundle.photos.len(), 1);
        assert_eq!(bundle.photos[0].tags, vec!["mt"]);
    }

    #[test]
    fn bundle_rejects_out_of_range_statistics() {
        let bad = r#"{"member_count": 1, "award_count": 0, "project_count": 0, "employment_rate": 140}"#;
        let err = parse_bundle(vec![part(STATISTIC_FILE, bad), part(PHOTOS_FILE, "[]")]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn bundle_rejects_malformed_json() {
        let err = parse_bundle(vec![part(STATISTIC_FILE, STAT), part(PHOTOS_FILE, "{")]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains(PHOTOS_FILE)));
    }
}
