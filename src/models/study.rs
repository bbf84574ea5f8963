// src/models/study.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StudyRole {
    Pending,
    Member,
    Leader,
    Nominee,
}

impl StudyRole {
    /// Roles that count as belonging to the study (everything but PENDING).
    pub fn is_participant(self) -> bool {
        !matches!(self, StudyRole::Pending)
    }
}

pub const MAX_RESOURCE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceFormat {
    Pdf,
    Docx,
    Pptx,
}

impl ResourceFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(ResourceFormat::Pdf),
            "docx" => Some(ResourceFormat::Docx),
            "pptx" => Some(ResourceFormat::Pptx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ResourceFormat::Pdf => "pdf",
            ResourceFormat::Docx => "docx",
            ResourceFormat::Pptx => "pptx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ResourceFormat::Pdf => "application/pdf",
            ResourceFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ResourceFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }
}

// Row of `studies` joined with the leader name and participant count
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Study {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub schedule: Option<String>,
    pub period: Option<String>,
    pub recruit_count: i64,
    pub tag: Option<String>,
    pub leader_id: i64,
    pub leader_name: String,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Study {
    pub fn is_full(&self) -> bool {
        self.member_count >= self.recruit_count
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudyMember {
    pub id: i64,
    pub study_id: i64,
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub role: StudyRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudyProgress {
    pub id: i64,
    pub study_id: i64,
    pub week: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudyResource {
    pub id: i64,
    pub study_id: i64,
    pub original_name: String,
    #[serde(skip)]
    pub stored_name: String,
    pub format: ResourceFormat,
    pub size_bytes: i64,
    pub uploader_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Study detail. Viewers outside the study get `limited = true` and no
/// member or progress data.
#[derive(Debug, Serialize)]
pub struct StudyDetail {
    #[serde(flatten)]
    pub study: Study,
    pub my_role: Option<StudyRole>,
    pub limited: bool,
    pub members: Option<Vec<StudyMember>>,
    pub progress: Option<Vec<StudyProgress>>,
}

#[derive(Debug, Serialize)]
pub struct MyStudy {
    #[serde(flatten)]
    pub study: Study,
    pub my_role: StudyRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudyRequest {
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub schedule: Option<String>,
    pub period: Option<String>,
    #[validate(range(min = 1, max = 200, message = "recruit_count must be between 1 and 200"))]
    pub recruit_count: i64,
    pub tag: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateStudyRequest {
    #[validate(length(min = 1, max = 120, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,
    pub schedule: Option<String>,
    pub period: Option<String>,
    #[validate(range(min = 1, max = 200, message = "recruit_count must be between 1 and 200"))]
    pub recruit_count: Option<i64>,
    pub tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StudyQuery {
    pub tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberListQuery {
    #[serde(default)]
    pub include_pending: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProgressRequest {
    #[validate(range(min = 1, max = 520, message = "week must be a positive number"))]
    pub week: i64,
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProgressUpdate {
    #[validate(range(min = 1, max = 520, message = "week must be a positive number"))]
    pub week: Option<i64>,
    #[validate(length(min = 1, max = 200, message = "title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: Option<String>,
}
