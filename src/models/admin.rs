// src/models/admin.rs
use super::split_list;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

pub const STATISTIC_FILE: &str = "statistic.json";
pub const PHOTOS_FILE: &str = "photos.json";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecruitmentSettings {
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub is_enabled: bool,
    pub auto_toggle: bool,
    pub updated_at: DateTime<Utc>,
}

impl RecruitmentSettings {
    /// With `auto_toggle` the window decides; otherwise the manual flag does.
    /// An auto window missing either bound is closed.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        if self.auto_toggle {
            match (self.start_at, self.end_at) {
                (Some(start), Some(end)) => start <= now && now <= end,
                _ => false,
            }
        } else {
            self.is_enabled
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecruitmentStatus {
    pub settings: RecruitmentSettings,
    pub is_open: bool,
}

fn validate_window(req: &RecruitmentUpdate) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (req.start_at, req.end_at) {
        if end < start {
            let mut err = ValidationError::new("window_order");
            err.message = Some("end_at must not be before start_at".into());
            return Err(err);
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_window"))]
pub struct RecruitmentUpdate {
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub is_enabled: bool,
    pub auto_toggle: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct ActivityImage {
    pub id: i64,
    pub title: Option<String>,
    pub image_url: String,
    pub tags: Option<String>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityImageView {
    pub id: i64,
    pub title: Option<String>,
    pub image_url: String,
    pub tags: Vec<String>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityImage> for ActivityImageView {
    fn from(img: ActivityImage) -> Self {
        Self {
            tags: split_list(img.tags.as_deref()),
            id: img.id,
            title: img.title,
            image_url: img.image_url,
            sort_order: img.sort_order,
            created_at: img.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityImageUpdate {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Statistics {
    pub member_count: i64,
    pub award_count: i64,
    pub project_count: i64,
    pub employment_rate: f64,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /admin/statistics` and the content of `statistic.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StatisticsInput {
    #[validate(range(min = 0, message = "member_count must not be negative"))]
    pub member_count: i64,
    #[validate(range(min = 0, message = "award_count must not be negative"))]
    pub award_count: i64,
    #[validate(range(min = 0, message = "project_count must not be negative"))]
    pub project_count: i64,
    #[validate(range(min = 0.0, max = 100.0, message = "employment_rate must be between 0 and 100"))]
    pub employment_rate: f64,
}

impl From<&Statistics> for StatisticsInput {
    fn from(s: &Statistics) -> Self {
        Self {
            member_count: s.member_count,
            award_count: s.award_count,
            project_count: s.project_count,
            employment_rate: s.employment_rate,
        }
    }
}

/// One entry of `photos.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoEntry {
    pub title: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sort_order: i64,
}

impl From<&ActivityImage> for PhotoEntry {
    fn from(img: &ActivityImage) -> Self {
        Self {
            title: img.title.clone(),
            image_url: img.image_url.clone(),
            tags: split_list(img.tags.as_deref()),
            sort_order: img.sort_order,
        }
    }
}

/// Both halves of a settings import, already parsed.
#[derive(Debug, Clone)]
pub struct SettingsBundle {
    pub statistic: StatisticsInput,
    pub photos: Vec<PhotoEntry>,
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub statistic: StatisticsInput,
    pub photo_count: usize,
}
