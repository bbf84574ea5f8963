// src/services/study_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        non_empty,
        study::{
            CreateStudyRequest, MyStudy, ProgressRequest, ProgressUpdate, ResourceFormat, Study,
            StudyDetail, StudyMember, StudyProgress, StudyQuery, StudyResource, StudyRole,
            UpdateStudyRequest, MAX_RESOURCE_BYTES,
        },
        user::CurrentUser,
    },
    services::{
        is_unique_violation,
        upload_service::{self, RESOURCE_DIR},
        user_service,
    },
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::Path;

const STUDY_SELECT: &str = r#"
    SELECT s.id, s.name, s.description, s.schedule, s.period, s.recruit_count, s.tag,
           s.leader_id, u.name AS leader_name,
           (SELECT COUNT(*) FROM study_members m
             WHERE m.study_id = s.id AND m.role <> 'PENDING') AS member_count,
           s.created_at, s.updated_at
    FROM studies s
    JOIN users u ON u.id = s.leader_id
"#;

const MEMBER_SELECT: &str = r#"
    SELECT m.id, m.study_id, m.user_id, u.username, u.name, u.photo_url, m.role, m.joined_at
    FROM study_members m
    JOIN users u ON u.id = m.user_id
"#;

const PROGRESS_SELECT: &str = r#"
    SELECT p.id, p.study_id, p.week, p.title, p.content, p.author_id, u.name AS author_name,
           p.created_at, p.updated_at
    FROM study_progress p
    JOIN users u ON u.id = p.author_id
"#;

fn ensure_manager(study: &Study, actor: &CurrentUser) -> AppResult<()> {
    if study.leader_id == actor.id || actor.is_admin() {
        Ok(())
    } else {
        tracing::warn!("User {} cannot manage study {}", actor.id, study.id);
        Err(AppError::Forbidden)
    }
}

/// Members of the study (any non-PENDING role) and admins pass.
async fn ensure_participant(db_pool: &SqlitePool, study_id: i64, actor: &CurrentUser) -> AppResult<()> {
    if actor.is_admin() {
        return Ok(());
    }
    match membership(db_pool, study_id, actor.id).await? {
        Some(role) if role.is_participant() => Ok(()),
        _ => {
            tracing::warn!("User {} is not a participant of study {}", actor.id, study_id);
            Err(AppError::Forbidden)
        }
    }
}

pub async fn find_study(db_pool: &SqlitePool, study_id: i64) -> AppResult<Study> {
    let sql = format!("{} WHERE s.id = ?1", STUDY_SELECT);
    sqlx::query_as::<_, Study>(&sql)
        .bind(study_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("study {} not found", study_id)))
}

/// The caller's row in a study, if any.
pub async fn membership(db_pool: &SqlitePool, study_id: i64, user_id: i64) -> AppResult<Option<StudyRole>> {
    let role = sqlx::query_scalar::<_, StudyRole>(
        "SELECT role FROM study_members WHERE study_id = ?1 AND user_id = ?2",
    )
    .bind(study_id)
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(role)
}

async fn require_membership(db_pool: &SqlitePool, study_id: i64, user_id: i64) -> AppResult<StudyRole> {
    membership(db_pool, study_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} has no membership in study {}", user_id, study_id)))
}

pub async fn list_studies(db_pool: &SqlitePool, query: &StudyQuery) -> AppResult<Vec<Study>> {
    let sql = format!(
        "{} WHERE (?1 IS NULL OR s.tag = ?1) ORDER BY s.created_at DESC, s.id DESC",
        STUDY_SELECT
    );
    let tag = query.tag.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let studies = sqlx::query_as::<_, Study>(&sql)
        .bind(tag)
        .fetch_all(db_pool)
        .await?;
    tracing::debug!("Listing {} studies.", studies.len());
    Ok(studies)
}

/// Study detail. Progress is read through `fetch_progress`, the same source
/// `GET /studies/{id}/progress` uses.
pub async fn get_detail(db_pool: &SqlitePool, viewer: Option<&CurrentUser>, study_id: i64) -> AppResult<StudyDetail> {
    let study = find_study(db_pool, study_id).await?;

    let my_role = match viewer {
        Some(user) => membership(db_pool, study_id, user.id).await?,
        None => None,
    };
    let full_access = viewer.is_some_and(CurrentUser::is_admin)
        || my_role.is_some_and(StudyRole::is_participant);

    if !full_access {
        return Ok(StudyDetail {
            study,
            my_role,
            limited: true,
            members: None,
            progress: None,
        });
    }

    let members = fetch_members(db_pool, study_id, false).await?;
    let progress = fetch_progress(db_pool, study_id).await?;
    Ok(StudyDetail {
        study,
        my_role,
        limited: false,
        members: Some(members),
        progress: Some(progress),
    })
}

pub async fn create_study(db_pool: &SqlitePool, actor: &CurrentUser, req: &CreateStudyRequest) -> AppResult<Study> {
    if !actor.role.is_member() {
        return Err(AppError::Forbidden);
    }
    tracing::info!("User {} creates study '{}'", actor.id, req.name);

    let now = Utc::now();
    let mut tx = db_pool.begin().await?;
    let study_id = sqlx::query(
        r#"
        INSERT INTO studies (name, description, schedule, period, recruit_count, tag, leader_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        "#,
    )
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(non_empty(req.schedule.clone()))
    .bind(non_empty(req.period.clone()))
    .bind(req.recruit_count)
    .bind(non_empty(req.tag.clone()))
    .bind(actor.id)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    sqlx::query("INSERT INTO study_members (study_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(study_id)
        .bind(actor.id)
        .bind(StudyRole::Leader)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("✅ Study {} created with leader {}.", study_id, actor.id);
    find_study(db_pool, study_id).await
}

pub async fn update_study(
    db_pool: &SqlitePool,
    actor: &CurrentUser,
    study_id: i64,
    req: &UpdateStudyRequest,
) -> AppResult<Study> {
    let mut study = find_study(db_pool, study_id).await?;
    ensure_manager(&study, actor)?;

    if let Some(name) = &req.name {
        study.name = name.trim().to_string();
    }
    if let Some(description) = &req.description {
        study.description = description.clone();
    }
    if req.schedule.is_some() {
        study.schedule = non_empty(req.schedule.clone());
    }
    if req.period.is_some() {
        study.period = non_empty(req.period.clone());
    }
    if let Some(count) = req.recruit_count {
        if count < study.member_count {
            return Err(AppError::Conflict(format!(
                "recruit_count cannot be below the current member count ({})",
                study.member_count
            )));
        }
        study.recruit_count = count;
    }
    if req.tag.is_some() {
        study.tag = non_empty(req.tag.clone());
    }

    sqlx::query(
        r#"
        UPDATE studies SET name = ?1, description = ?2, schedule = ?3, period = ?4,
                           recruit_count = ?5, tag = ?6, updated_at = ?7
        WHERE id = ?8
        "#,
    )
    .bind(&study.name)
    .bind(&study.description)
    .bind(&study.schedule)
    .bind(&study.period)
    .bind(study.recruit_count)
    .bind(&study.tag)
    .bind(Utc::now())
    .bind(study_id)
    .execute(db_pool)
    .await?;

    tracing::info!("✅ Study {} updated by user {}.", study_id, actor.id);
    find_study(db_pool, study_id).await
}

pub async fn delete_study(db_pool: &SqlitePool, upload_root: &Path, actor: &CurrentUser, study_id: i64) -> AppResult<()> {
    let study = find_study(db_pool, study_id).await?;
    ensure_manager(&study, actor)?;

    let stored: Vec<String> = sqlx::query_scalar("SELECT stored_name FROM study_resources WHERE study_id = ?1")
        .bind(study_id)
        .fetch_all(db_pool)
        .await?;

    sqlx::query("DELETE FROM studies WHERE id = ?1")
        .bind(study_id)
        .execute(db_pool)
        .await?;

    for name in stored {
        upload_service::remove_file(upload_root, RESOURCE_DIR, &name).await;
    }
    tracing::info!("🗑️ Study {} deleted by user {}.", study_id, actor.id);
    Ok(())
}

/// Files a PENDING application. Refused when the study is full.
pub async fn apply(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64) -> AppResult<StudyRole> {
    if !actor.role.is_member() {
        return Err(AppError::Forbidden);
    }
    let study = find_study(db_pool, study_id).await?;
    if let Some(role) = membership(db_pool, study_id, actor.id).await? {
        return Err(AppError::Conflict(format!("you already hold the {:?} role in this study", role)));
    }
    if study.is_full() {
        return Err(AppError::Conflict("this study has no open seats".into()));
    }

    let result = sqlx::query("INSERT INTO study_members (study_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(study_id)
        .bind(actor.id)
        .bind(StudyRole::Pending)
        .bind(Utc::now())
        .execute(db_pool)
        .await;

    match result {
        Ok(_) => {
            tracing::info!("User {} applied to study {}", actor.id, study_id);
            Ok(StudyRole::Pending)
        }
        Err(e) if is_unique_violation(&e) => Err(AppError::Conflict("you already applied to this study".into())),
        Err(e) => Err(e.into()),
    }
}

pub async fn cancel_application(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64) -> AppResult<()> {
    find_study(db_pool, study_id).await?;
    let removed = sqlx::query("DELETE FROM study_members WHERE study_id = ?1 AND user_id = ?2 AND role = ?3")
        .bind(study_id)
        .bind(actor.id)
        .bind(StudyRole::Pending)
        .execute(db_pool)
        .await?
        .rows_affected();
    if removed == 0 {
        return Err(AppError::NotFound("no pending application to withdraw".into()));
    }
    tracing::info!("User {} withdrew application to study {}", actor.id, study_id);
    Ok(())
}

async fn fetch_members(db_pool: &SqlitePool, study_id: i64, include_pending: bool) -> AppResult<Vec<StudyMember>> {
    let sql = format!(
        "{} WHERE m.study_id = ?1 AND (?2 OR m.role <> 'PENDING') ORDER BY m.joined_at ASC, m.id ASC",
        MEMBER_SELECT
    );
    let members = sqlx::query_as::<_, StudyMember>(&sql)
        .bind(study_id)
        .bind(include_pending)
        .fetch_all(db_pool)
        .await?;
    Ok(members)
}

/// Public member list. PENDING rows only show up for the leader or an admin
/// who asks for them.
pub async fn list_members(
    db_pool: &SqlitePool,
    viewer: Option<&CurrentUser>,
    study_id: i64,
    include_pending: bool,
) -> AppResult<Vec<StudyMember>> {
    let study = find_study(db_pool, study_id).await?;
    let can_see_pending = viewer.is_some_and(|v| v.is_admin() || v.id == study.leader_id);
    if include_pending && !can_see_pending {
        return Err(AppError::Forbidden);
    }
    fetch_members(db_pool, study_id, include_pending).await
}

async fn set_role(db_pool: &SqlitePool, study_id: i64, user_id: i64, role: StudyRole) -> AppResult<()> {
    sqlx::query("UPDATE study_members SET role = ?1 WHERE study_id = ?2 AND user_id = ?3")
        .bind(role)
        .bind(study_id)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// PENDING becomes MEMBER, provided a seat is left.
pub async fn approve_member(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64, user_id: i64) -> AppResult<StudyRole> {
    let study = find_study(db_pool, study_id).await?;
    ensure_manager(&study, actor)?;

    let role = require_membership(db_pool, study_id, user_id).await?;
    if role != StudyRole::Pending {
        return Err(AppError::Conflict(format!("only PENDING members can be approved (current: {:?})", role)));
    }
    if study.is_full() {
        return Err(AppError::Conflict("this study has no open seats".into()));
    }

    set_role(db_pool, study_id, user_id, StudyRole::Member).await?;
    tracing::info!("✅ User {} approved into study {}", user_id, study_id);
    Ok(StudyRole::Member)
}

pub async fn reject_member(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64, user_id: i64) -> AppResult<()> {
    let study = find_study(db_pool, study_id).await?;
    ensure_manager(&study, actor)?;

    let role = require_membership(db_pool, study_id, user_id).await?;
    if role != StudyRole::Pending {
        return Err(AppError::Conflict(format!("only PENDING members can be rejected (current: {:?})", role)));
    }

    sqlx::query("DELETE FROM study_members WHERE study_id = ?1 AND user_id = ?2")
        .bind(study_id)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    tracing::info!("User {} rejected from study {}", user_id, study_id);
    Ok(())
}

pub async fn add_member(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64, user_id: i64) -> AppResult<StudyRole> {
    let study = find_study(db_pool, study_id).await?;
    ensure_manager(&study, actor)?;

    let user = user_service::get_user(db_pool, user_id).await?;
    if user.is_withdrawn() {
        return Err(AppError::NotFound(format!("user {} not found", user_id)));
    }
    if study.is_full() {
        return Err(AppError::Conflict("this study has no open seats".into()));
    }

    match membership(db_pool, study_id, user_id).await? {
        Some(StudyRole::Pending) => set_role(db_pool, study_id, user_id, StudyRole::Member).await?,
        Some(role) => {
            return Err(AppError::Conflict(format!("user already holds the {:?} role in this study", role)));
        }
        None => {
            sqlx::query("INSERT INTO study_members (study_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)")
                .bind(study_id)
                .bind(user_id)
                .bind(StudyRole::Member)
                .bind(Utc::now())
                .execute(db_pool)
                .await?;
        }
    }
    tracing::info!("✅ User {} added to study {} by {}", user_id, study_id, actor.id);
    Ok(StudyRole::Member)
}

pub async fn remove_member(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64, user_id: i64) -> AppResult<()> {
    let study = find_study(db_pool, study_id).await?;
    if actor.id != user_id {
        ensure_manager(&study, actor)?;
    }

    let role = require_membership(db_pool, study_id, user_id).await?;
    if role == StudyRole::Leader {
        return Err(AppError::Conflict("hand over leadership before removing the leader".into()));
    }

    sqlx::query("DELETE FROM study_members WHERE study_id = ?1 AND user_id = ?2")
        .bind(study_id)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    tracing::info!("User {} removed from study {} by {}", user_id, study_id, actor.id);
    Ok(())
}

/// Marks a member as NOMINEE. Any earlier nominee reverts to MEMBER.
pub async fn nominate_leader(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64, user_id: i64) -> AppResult<StudyRole> {
    let study = find_study(db_pool, study_id).await?;
    ensure_manager(&study, actor)?;

    let role = require_membership(db_pool, study_id, user_id).await?;
    match role {
        StudyRole::Member => {}
        StudyRole::Nominee => return Ok(StudyRole::Nominee),
        other => {
            return Err(AppError::Conflict(format!("only MEMBERs can be nominated (current: {:?})", other)));
        }
    }

    let mut tx = db_pool.begin().await?;
    sqlx::query("UPDATE study_members SET role = ?1 WHERE study_id = ?2 AND role = ?3")
        .bind(StudyRole::Member)
        .bind(study_id)
        .bind(StudyRole::Nominee)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE study_members SET role = ?1 WHERE study_id = ?2 AND user_id = ?3")
        .bind(StudyRole::Nominee)
        .bind(study_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("User {} nominated as next leader of study {}", user_id, study_id);
    Ok(StudyRole::Nominee)
}

/// The nominee takes over; the previous leader stays on as a MEMBER.
pub async fn accept_leadership(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64) -> AppResult<Study> {
    let study = find_study(db_pool, study_id).await?;
    if membership(db_pool, study_id, actor.id).await? != Some(StudyRole::Nominee) {
        return Err(AppError::Conflict("you have not been nominated to lead this study".into()));
    }

    let mut tx = db_pool.begin().await?;
    sqlx::query("UPDATE study_members SET role = ?1 WHERE study_id = ?2 AND role = ?3")
        .bind(StudyRole::Member)
        .bind(study_id)
        .bind(StudyRole::Leader)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE study_members SET role = ?1 WHERE study_id = ?2 AND user_id = ?3")
        .bind(StudyRole::Leader)
        .bind(study_id)
        .bind(actor.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE studies SET leader_id = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(actor.id)
        .bind(Utc::now())
        .bind(study_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(
        "✅ Study {} leadership passed from {} to {}",
        study_id,
        study.leader_id,
        actor.id
    );
    find_study(db_pool, study_id).await
}

pub async fn decline_leadership(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64) -> AppResult<StudyRole> {
    find_study(db_pool, study_id).await?;
    if membership(db_pool, study_id, actor.id).await? != Some(StudyRole::Nominee) {
        return Err(AppError::Conflict("you have not been nominated to lead this study".into()));
    }
    set_role(db_pool, study_id, actor.id, StudyRole::Member).await?;
    tracing::info!("User {} declined leadership of study {}", actor.id, study_id);
    Ok(StudyRole::Member)
}

async fn fetch_progress(db_pool: &SqlitePool, study_id: i64) -> AppResult<Vec<StudyProgress>> {
    let sql = format!(
        "{} WHERE p.study_id = ?1 ORDER BY p.week ASC, p.created_at ASC, p.id ASC",
        PROGRESS_SELECT
    );
    let entries = sqlx::query_as::<_, StudyProgress>(&sql)
        .bind(study_id)
        .fetch_all(db_pool)
        .await?;
    Ok(entries)
}

async fn find_progress(db_pool: &SqlitePool, study_id: i64, progress_id: i64) -> AppResult<StudyProgress> {
    let sql = format!("{} WHERE p.study_id = ?1 AND p.id = ?2", PROGRESS_SELECT);
    sqlx::query_as::<_, StudyProgress>(&sql)
        .bind(study_id)
        .bind(progress_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("progress entry {} not found", progress_id)))
}

pub async fn list_progress(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64) -> AppResult<Vec<StudyProgress>> {
    find_study(db_pool, study_id).await?;
    ensure_participant(db_pool, study_id, actor).await?;
    fetch_progress(db_pool, study_id).await
}

pub async fn create_progress(
    db_pool: &SqlitePool,
    actor: &CurrentUser,
    study_id: i64,
    req: &ProgressRequest,
) -> AppResult<StudyProgress> {
    find_study(db_pool, study_id).await?;
    ensure_participant(db_pool, study_id, actor).await?;

    let now = Utc::now();
    let id = sqlx::query(
        r#"
        INSERT INTO study_progress (study_id, week, title, content, author_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        "#,
    )
    .bind(study_id)
    .bind(req.week)
    .bind(req.title.trim())
    .bind(&req.content)
    .bind(actor.id)
    .bind(now)
    .execute(db_pool)
    .await?
    .last_insert_rowid();

    tracing::info!("Progress entry {} (week {}) added to study {}", id, req.week, study_id);
    find_progress(db_pool, study_id, id).await
}

async fn ensure_progress_editor(
    db_pool: &SqlitePool,
    actor: &CurrentUser,
    study_id: i64,
    progress_id: i64,
) -> AppResult<StudyProgress> {
    let study = find_study(db_pool, study_id).await?;
    let entry = find_progress(db_pool, study_id, progress_id).await?;
    if entry.author_id == actor.id {
        ensure_participant(db_pool, study_id, actor).await?;
    } else {
        ensure_manager(&study, actor)?;
    }
    Ok(entry)
}

pub async fn update_progress(
    db_pool: &SqlitePool,
    actor: &CurrentUser,
    study_id: i64,
    progress_id: i64,
    req: &ProgressUpdate,
) -> AppResult<StudyProgress> {
    let mut entry = ensure_progress_editor(db_pool, actor, study_id, progress_id).await?;
    if let Some(week) = req.week {
        entry.week = week;
    }
    if let Some(title) = &req.title {
        entry.title = title.trim().to_string();
    }
    if let Some(content) = &req.content {
        entry.content = content.clone();
    }

    sqlx::query("UPDATE study_progress SET week = ?1, title = ?2, content = ?3, updated_at = ?4 WHERE id = ?5")
        .bind(entry.week)
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(Utc::now())
        .bind(progress_id)
        .execute(db_pool)
        .await?;
    find_progress(db_pool, study_id, progress_id).await
}

pub async fn delete_progress(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64, progress_id: i64) -> AppResult<()> {
    ensure_progress_editor(db_pool, actor, study_id, progress_id).await?;
    sqlx::query("DELETE FROM study_progress WHERE id = ?1")
        .bind(progress_id)
        .execute(db_pool)
        .await?;
    tracing::info!("Progress entry {} removed from study {}", progress_id, study_id);
    Ok(())
}

/// Format and size gate for study resources. Runs before anything is stored.
pub fn validate_resource(filename: &str, size: usize) -> AppResult<ResourceFormat> {
    let format = ResourceFormat::from_filename(filename).ok_or_else(|| {
        AppError::UnsupportedMediaType("only pdf, docx and pptx files are allowed".into())
    })?;
    if size == 0 {
        return Err(AppError::BadRequest("the uploaded file is empty".into()));
    }
    if size > MAX_RESOURCE_BYTES {
        return Err(AppError::PayloadTooLarge("files must be 10MB or smaller".into()));
    }
    Ok(format)
}

pub async fn list_resources(db_pool: &SqlitePool, actor: &CurrentUser, study_id: i64) -> AppResult<Vec<StudyResource>> {
    find_study(db_pool, study_id).await?;
    ensure_participant(db_pool, study_id, actor).await?;
    let resources = sqlx::query_as::<_, StudyResource>(
        "SELECT * FROM study_resources WHERE study_id = ?1 ORDER BY created_at DESC, id DESC",
    )
    .bind(study_id)
    .fetch_all(db_pool)
    .await?;
    Ok(resources)
}

/// Validates, stores and records a resource file. The stored file is
/// removed again if the row cannot be written.
pub async fn upload_resource(
    db_pool: &SqlitePool,
    upload_root: &Path,
    actor: &CurrentUser,
    study_id: i64,
    filename: &str,
    bytes: &[u8],
) -> AppResult<StudyResource> {
    find_study(db_pool, study_id).await?;
    ensure_participant(db_pool, study_id, actor).await?;
    let format = validate_resource(filename, bytes.len())?;

    let stored_name = upload_service::store_file(upload_root, RESOURCE_DIR, format.extension(), bytes).await?;
    let original_name = upload_service::display_name(filename);

    let inserted = sqlx::query(
        r#"
        INSERT INTO study_resources (study_id, original_name, stored_name, format, size_bytes, uploader_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(study_id)
    .bind(&original_name)
    .bind(&stored_name)
    .bind(format)
    .bind(bytes.len() as i64)
    .bind(actor.id)
    .bind(Utc::now())
    .execute(db_pool)
    .await;

    let id = match inserted {
        Ok(done) => done.last_insert_rowid(),
        Err(e) => {
            upload_service::remove_file(upload_root, RESOURCE_DIR, &stored_name).await;
            return Err(e.into());
        }
    };

    tracing::info!("📎 Resource {} '{}' uploaded to study {}", id, original_name, study_id);
    find_resource(db_pool, study_id, id).await
}

async fn find_resource(db_pool: &SqlitePool, study_id: i64, resource_id: i64) -> AppResult<StudyResource> {
    sqlx::query_as::<_, StudyResource>("SELECT * FROM study_resources WHERE study_id = ?1 AND id = ?2")
        .bind(study_id)
        .bind(resource_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("resource {} not found", resource_id)))
}

pub async fn read_resource(
    db_pool: &SqlitePool,
    upload_root: &Path,
    actor: &CurrentUser,
    study_id: i64,
    resource_id: i64,
) -> AppResult<(StudyResource, Vec<u8>)> {
    find_study(db_pool, study_id).await?;
    ensure_participant(db_pool, study_id, actor).await?;
    let resource = find_resource(db_pool, study_id, resource_id).await?;
    let bytes = upload_service::read_file(upload_root, RESOURCE_DIR, &resource.stored_name).await?;
    Ok((resource, bytes))
}

pub async fn delete_resource(
    db_pool: &SqlitePool,
    upload_root: &Path,
    actor: &CurrentUser,
    study_id: i64,
    resource_id: i64,
) -> AppResult<()> {
    let study = find_study(db_pool, study_id).await?;
    let resource = find_resource(db_pool, study_id, resource_id).await?;
    if resource.uploader_id != actor.id {
        ensure_manager(&study, actor)?;
    }

    sqlx::query("DELETE FROM study_resources WHERE id = ?1")
        .bind(resource_id)
        .execute(db_pool)
        .await?;
    upload_service::remove_file(upload_root, RESOURCE_DIR, &resource.stored_name).await;
    tracing::info!("🗑️ Resource {} removed from study {}", resource_id, study_id);
    Ok(())
}

pub async fn my_studies(db_pool: &SqlitePool, user_id: i64) -> AppResult<Vec<MyStudy>> {
    let rows: Vec<(i64, StudyRole)> = sqlx::query_as(
        "SELECT study_id, role FROM study_members WHERE user_id = ?1 ORDER BY joined_at DESC",
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;

    let mut studies = Vec::with_capacity(rows.len());
    for (study_id, my_role) in rows {
        studies.push(MyStudy {
            study: find_study(db_pool, study_id).await?,
            my_role,
        });
    }
    Ok(studies)
}
