use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{ImageMeta, blank_or_url, merge, merge_text, non_blank};

/// Event
///
/// An organization event listed on the public site, stored in the `events` table.
/// Uploaded pictures are embedded in the `images` JSONB column.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub venue: String,
    pub event_date: NaiveDate,
    pub registration_link: Option<String>,
    #[sqlx(json)]
    pub images: Vec<ImageMeta>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CreateEventRequest
///
/// Text fields of the `POST /api/v1/event/create` multipart form. Image files arrive
/// separately under the repeatable `images` field.
#[derive(Debug, Clone, Default, Validate)]
pub struct CreateEventRequest {
    #[validate(
        required(message = "is required"),
        length(min = 3, message = "must be at least 3 characters")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "is required"),
        length(min = 10, message = "must be at least 10 characters")
    )]
    pub description: Option<String>,
    #[validate(
        required(message = "is required"),
        length(min = 1, message = "must not be empty")
    )]
    pub venue: Option<String>,
    #[validate(required(message = "is required"))]
    pub event_date: Option<NaiveDate>,
    #[validate(custom(function = "blank_or_url"))]
    pub registration_link: Option<String>,
    pub is_active: Option<bool>,
}

/// UpdateEventRequest
///
/// Partial update for `PATCH /api/v1/event/update/{id}`. Absent fields are left as is;
/// newly uploaded images are appended.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 3, message = "must be at least 3 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 10, message = "must be at least 10 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub venue: Option<String>,
    pub event_date: Option<NaiveDate>,
    #[validate(custom(function = "blank_or_url"))]
    pub registration_link: Option<String>,
    pub is_active: Option<bool>,
}

impl Event {
    pub fn new(req: CreateEventRequest, images: Vec<ImageMeta>, author: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            venue: req.venue.unwrap_or_default(),
            event_date: req.event_date.unwrap_or_else(|| now.date_naive()),
            registration_link: non_blank(req.registration_link),
            images,
            is_active: req.is_active.unwrap_or(true),
            created_by: Some(author),
            updated_by: Some(author),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the scalar fields. New pictures are appended by the repository, against
    /// the row as it stands at write time.
    pub fn apply(&mut self, patch: UpdateEventRequest, editor: Uuid) {
        merge(&mut self.title, patch.title);
        merge(&mut self.description, patch.description);
        merge(&mut self.venue, patch.venue);
        merge(&mut self.event_date, patch.event_date);
        merge_text(&mut self.registration_link, patch.registration_link);
        merge(&mut self.is_active, patch.is_active);
        self.touch(editor);
    }

    /// Splices one image out of the embedded list, returning it so the caller can
    /// delete the backing object.
    pub fn remove_image(&mut self, image_id: Uuid, editor: Uuid) -> Option<ImageMeta> {
        let index = self.images.iter().position(|img| img.id == image_id)?;
        let removed = self.images.remove(index);
        self.touch(editor);
        Some(removed)
    }

    fn touch(&mut self, editor: Uuid) {
        self.updated_by = Some(editor);
        self.updated_at = Utc::now();
    }
}
