// src/models/announcement.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::cmp::Reverse;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    /// Markdown source. Rendering and sanitizing happen client side.
    pub content: String,
    pub publish_at: DateTime<Utc>,
    pub author_id: i64,
    pub author_name: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Announcement {
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.publish_at <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Scheduled,
    Published,
}

#[derive(Debug, Serialize)]
pub struct AdminAnnouncement {
    #[serde(flatten)]
    pub announcement: Announcement,
    pub status: PublicationStatus,
}

impl AdminAnnouncement {
    pub fn new(announcement: Announcement, now: DateTime<Utc>) -> Self {
        let status = if announcement.is_published(now) {
            PublicationStatus::Published
        } else {
            PublicationStatus::Scheduled
        };
        Self { announcement, status }
    }
}

/// Newest first by publish time, then by creation time, then by id.
pub fn sort_for_listing(items: &mut [Announcement]) {
    items.sort_by_key(|a| Reverse((a.publish_at, a.created_at, a.id)));
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[validate(length(max = 500, message = "summary is too long"))]
    pub summary: Option<String>,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    pub publish_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAnnouncementRequest {
    #[validate(length(min = 1, max = 200, message = "title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(max = 500, message = "summary is too long"))]
    pub summary: Option<String>,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: Option<String>,
    pub publish_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn item(id: i64, publish_at: DateTime<Utc>, created_at: DateTime<Utc>) -> Announcement {
        Announcement {
            id,
            title: format!("notice {}", id),
            summary: None,
            content: "body".into(),
            publish_at,
            author_id: 1,
            author_name: "admin".into(),
            view_count: 0,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn listing_order_falls_back_to_creation_time() {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut items = vec![
            item(1, base, base),
            item(2, base + Duration::days(1), base),
            item(3, base, base + Duration::hours(2)),
        ];
        sort_for_listing(&mut items);
        let ids: Vec<i64> = items.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn future_publish_time_is_scheduled() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let future = item(1, now + Duration::minutes(5), now);
        let past = item(2, now - Duration::minutes(5), now);
        assert_eq!(AdminAnnouncement::new(future, now).status, PublicationStatus::Scheduled);
        assert_eq!(AdminAnnouncement::new(past, now).status, PublicationStatus::Published);
    }
}
