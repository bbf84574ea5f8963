// src/models/user.rs
use super::split_list;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Member,
    Guest,
}

impl UserRole {
    /// Club members proper (as opposed to non-member signups).
    pub fn is_member(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Member)
    }
}

/// The authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// Row of the `users` table
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub tech_stack: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub role: UserRole,
    pub student_number: Option<String>,
    pub major: Option<String>,
    pub join_year: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub education_status: Option<String>,
    pub show_email: bool,
    pub show_phone: bool,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_withdrawn(&self) -> bool {
        self.withdrawn_at.is_some()
    }
}

/// Everything about a user except the password hash. Returned to the user
/// themself and to admins.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub tech_stack: Vec<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub role: UserRole,
    pub student_number: Option<String>,
    pub major: Option<String>,
    pub join_year: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub education_status: Option<String>,
    pub show_email: bool,
    pub show_phone: bool,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
            tech_stack: split_list(u.tech_stack.as_deref()),
            bio: u.bio.clone(),
            photo_url: u.photo_url.clone(),
            role: u.role,
            student_number: u.student_number.clone(),
            major: u.major.clone(),
            join_year: u.join_year,
            birth_date: u.birth_date,
            gender: u.gender.clone(),
            education_status: u.education_status.clone(),
            show_email: u.show_email,
            show_phone: u.show_phone,
            withdrawn_at: u.withdrawn_at,
            created_at: u.created_at,
        }
    }
}

/// Directory entry, honoring the user's privacy flags.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tech_stack: Vec<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub role: UserRole,
    pub major: Option<String>,
    pub join_year: Option<i64>,
}

impl From<&User> for PublicProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            name: u.name.clone(),
            email: u.show_email.then(|| u.email.clone()),
            phone: if u.show_phone { u.phone.clone() } else { None },
            tech_stack: split_list(u.tech_stack.as_deref()),
            bio: u.bio.clone(),
            photo_url: u.photo_url.clone(),
            role: u.role,
            major: u.major.clone(),
            join_year: u.join_year,
        }
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_chars {
        let mut err = ValidationError::new("username_chars");
        err.message = Some("username may only contain letters, digits and '_'".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 32, message = "username must be 3 to 32 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(length(min = 8, max = 128, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 64, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    pub phone: Option<String>,
    pub student_number: Option<String>,
    pub major: Option<String>,
    #[validate(range(min = 1950, max = 2100, message = "join_year is out of range"))]
    pub join_year: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub education_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub keep_logged_in: bool,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// Profile fields a user may change about themself. `None` leaves a field
/// untouched, an empty string clears it.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 64, message = "name must not be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    #[validate(length(max = 2000, message = "bio is too long"))]
    pub bio: Option<String>,
    pub student_number: Option<String>,
    pub major: Option<String>,
    #[validate(range(min = 1950, max = 2100, message = "join_year is out of range"))]
    pub join_year: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub education_status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminMemberUpdate {
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: ProfileUpdate,
    #[validate(email(message = "email is not valid"))]
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Serialize)]
pub struct PrivacySettings {
    pub show_email: bool,
    pub show_phone: bool,
}

#[derive(Debug, Deserialize)]
pub struct PrivacyUpdate {
    pub show_email: Option<bool>,
    pub show_phone: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeEmailRequest {
    #[validate(email(message = "email is not valid"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberQuery {
    pub search: Option<String>,
    pub major: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminMemberQuery {
    pub search: Option<String>,
    pub role: Option<UserRole>,
}

/// Local-storage keys the web client persists the session under.
#[derive(Debug, Serialize)]
pub struct StorageKeys {
    pub access_token: &'static str,
    pub auth_user: &'static str,
    pub keep_logged_in: &'static str,
}

pub const STORAGE_KEYS: StorageKeys = StorageKeys {
    access_token: "access_token",
    auth_user: "auth_user",
    keep_logged_in: "keep_logged_in",
};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub keep_logged_in: bool,
    pub user: UserProfile,
    pub storage_keys: StorageKeys,
}

#[derive(Debug, Serialize)]
pub struct Availability {
    pub available: bool,
}
