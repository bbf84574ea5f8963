// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        join_list, non_empty,
        user::{
            AdminMemberQuery, AdminMemberUpdate, PrivacyUpdate, ProfileUpdate, RegisterRequest, User,
            UserRole,
        },
    },
    services::{auth_service, is_unique_violation},
};
use chrono::Utc;
use sqlx::SqlitePool;

pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<User>> {
    tracing::debug!("Looking up user by id: {}", user_id);
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

/// Like `find_user_by_id` but a missing user is a 404.
pub async fn get_user(db_pool: &SqlitePool, user_id: i64) -> AppResult<User> {
    find_user_by_id(db_pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", user_id)))
}

pub async fn find_user_by_username(db_pool: &SqlitePool, username: &str) -> AppResult<Option<User>> {
    tracing::debug!("Looking up user by username: {}", username);
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1 COLLATE NOCASE")
        .bind(username.trim())
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

pub async fn is_username_available(db_pool: &SqlitePool, username: &str) -> AppResult<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 COLLATE NOCASE)",
    )
    .bind(username.trim())
    .fetch_one(db_pool)
    .await?;
    Ok(!taken)
}

pub async fn is_email_available(db_pool: &SqlitePool, email: &str) -> AppResult<bool> {
    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 COLLATE NOCASE)")
        .bind(email.trim())
        .fetch_one(db_pool)
        .await?;
    Ok(!taken)
}

/// Inserts a new GUEST account. Unique violations that slip past the
/// availability checks come back as conflicts.
pub async fn create_user(db_pool: &SqlitePool, req: &RegisterRequest, password_hash: &str) -> AppResult<User> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO users (
            username, password_hash, name, email, phone, role,
            student_number, major, join_year, birth_date, gender, education_status,
            created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
        "#,
    )
    .bind(req.username.trim())
    .bind(password_hash)
    .bind(req.name.trim())
    .bind(req.email.trim())
    .bind(non_empty(req.phone.clone()))
    .bind(UserRole::Guest)
    .bind(non_empty(req.student_number.clone()))
    .bind(non_empty(req.major.clone()))
    .bind(req.join_year)
    .bind(req.birth_date)
    .bind(non_empty(req.gender.clone()))
    .bind(non_empty(req.education_status.clone()))
    .bind(now)
    .execute(db_pool)
    .await;

    let id = match result {
        Ok(done) => done.last_insert_rowid(),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("User creation raced on a unique field: {}", req.username);
            return Err(AppError::Conflict("username or email is already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };

    get_user(db_pool, id).await
}

/// Applies a profile patch on top of the stored row.
fn apply_profile(user: &mut User, update: &ProfileUpdate) {
    if let Some(name) = &update.name {
        user.name = name.trim().to_string();
    }
    if update.phone.is_some() {
        user.phone = non_empty(update.phone.clone());
    }
    if let Some(stack) = &update.tech_stack {
        user.tech_stack = join_list(stack);
    }
    if update.bio.is_some() {
        user.bio = non_empty(update.bio.clone());
    }
    if update.student_number.is_some() {
        user.student_number = non_empty(update.student_number.clone());
    }
    if update.major.is_some() {
        user.major = non_empty(update.major.clone());
    }
    if update.join_year.is_some() {
        user.join_year = update.join_year;
    }
    if update.birth_date.is_some() {
        user.birth_date = update.birth_date;
    }
    if update.gender.is_some() {
        user.gender = non_empty(update.gender.clone());
    }
    if update.education_status.is_some() {
        user.education_status = non_empty(update.education_status.clone());
    }
}

async fn save_user(db_pool: &SqlitePool, user: &User) -> AppResult<User> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            name = ?1, email = ?2, phone = ?3, tech_stack = ?4, bio = ?5, photo_url = ?6,
            role = ?7, student_number = ?8, major = ?9, join_year = ?10, birth_date = ?11,
            gender = ?12, education_status = ?13, show_email = ?14, show_phone = ?15,
            withdrawn_at = ?16, updated_at = ?17
        WHERE id = ?18
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.tech_stack)
    .bind(&user.bio)
    .bind(&user.photo_url)
    .bind(user.role)
    .bind(&user.student_number)
    .bind(&user.major)
    .bind(user.join_year)
    .bind(user.birth_date)
    .bind(&user.gender)
    .bind(&user.education_status)
    .bind(user.show_email)
    .bind(user.show_phone)
    .bind(user.withdrawn_at)
    .bind(Utc::now())
    .bind(user.id)
    .execute(db_pool)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => {
            Err(AppError::NotFound(format!("user {} not found", user.id)))
        }
        Ok(_) => get_user(db_pool, user.id).await,
        Err(e) if is_unique_violation(&e) => Err(AppError::Conflict("email is already registered".into())),
        Err(e) => Err(e.into()),
    }
}

pub async fn update_profile(db_pool: &SqlitePool, user_id: i64, update: &ProfileUpdate) -> AppResult<User> {
    tracing::info!("Updating profile for user {}", user_id);
    let mut user = get_user(db_pool, user_id).await?;
    apply_profile(&mut user, update);
    save_user(db_pool, &user).await
}

pub async fn set_photo_url(db_pool: &SqlitePool, user_id: i64, photo_url: &str) -> AppResult<User> {
    let mut user = get_user(db_pool, user_id).await?;
    user.photo_url = Some(photo_url.to_string());
    save_user(db_pool, &user).await
}

pub async fn update_privacy(db_pool: &SqlitePool, user_id: i64, update: &PrivacyUpdate) -> AppResult<User> {
    let mut user = get_user(db_pool, user_id).await?;
    if let Some(show_email) = update.show_email {
        user.show_email = show_email;
    }
    if let Some(show_phone) = update.show_phone {
        user.show_phone = show_phone;
    }
    tracing::info!(
        "Privacy for user {}: show_email={}, show_phone={}",
        user_id,
        user.show_email,
        user.show_phone
    );
    save_user(db_pool, &user).await
}

pub async fn change_password(
    db_pool: &SqlitePool,
    user_id: i64,
    current_password: &str,
    new_password: &str,
) -> AppResult<()> {
    let user = get_user(db_pool, user_id).await?;
    if !auth_service::verify_password(current_password, &user.password_hash).await? {
        tracing::warn!("Password change refused for user {}: wrong current password", user_id);
        return Err(AppError::InvalidCredentials);
    }

    let new_hash = auth_service::hash_password(new_password).await?;
    sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(new_hash)
        .bind(Utc::now())
        .bind(user_id)
        .execute(db_pool)
        .await?;

    tracing::info!("✅ Password changed for user {}", user_id);
    Ok(())
}

pub async fn change_email(db_pool: &SqlitePool, user_id: i64, email: &str) -> AppResult<User> {
    let mut user = get_user(db_pool, user_id).await?;
    let email = email.trim();
    if !user.email.eq_ignore_ascii_case(email) && !is_email_available(db_pool, email).await? {
        return Err(AppError::Conflict("email is already registered".into()));
    }
    user.email = email.to_string();
    save_user(db_pool, &user).await
}

/// Soft withdrawal: the row stays, logins and token use stop.
pub async fn withdraw(db_pool: &SqlitePool, user_id: i64, password: &str) -> AppResult<()> {
    let mut user = get_user(db_pool, user_id).await?;
    if !auth_service::verify_password(password, &user.password_hash).await? {
        return Err(AppError::InvalidCredentials);
    }
    if user.role == UserRole::Admin {
        return Err(AppError::Conflict("an admin account cannot be withdrawn".into()));
    }
    user.withdrawn_at = Some(Utc::now());
    save_user(db_pool, &user).await?;
    tracing::info!("🚪 User {} withdrew their account.", user_id);
    Ok(())
}

pub async fn admin_list_users(db_pool: &SqlitePool, query: &AdminMemberQuery) -> AppResult<Vec<User>> {
    let pattern = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE (?1 IS NULL OR name LIKE ?1 OR username LIKE ?1 OR email LIKE ?1 OR student_number LIKE ?1)
          AND (?2 IS NULL OR role = ?2)
        ORDER BY id ASC
        "#,
    )
    .bind(pattern)
    .bind(query.role)
    .fetch_all(db_pool)
    .await?;

    tracing::debug!("Admin member search returned {} users.", users.len());
    Ok(users)
}

pub async fn admin_update_user(
    db_pool: &SqlitePool,
    acting_admin_id: i64,
    user_id: i64,
    update: &AdminMemberUpdate,
) -> AppResult<User> {
    let mut user = get_user(db_pool, user_id).await?;
    apply_profile(&mut user, &update.profile);

    if let Some(email) = &update.email {
        let email = email.trim();
        if !user.email.eq_ignore_ascii_case(email) && !is_email_available(db_pool, email).await? {
            return Err(AppError::Conflict("email is already registered".into()));
        }
        user.email = email.to_string();
    }

    if let Some(role) = update.role {
        if user_id == acting_admin_id && role != UserRole::Admin {
            return Err(AppError::Conflict("admins cannot demote themselves".into()));
        }
        if role != user.role {
            tracing::info!("Role of user {} changes {:?} -> {:?}", user_id, user.role, role);
        }
        user.role = role;
    }

    save_user(db_pool, &user).await
}
