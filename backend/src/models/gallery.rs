use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{ImageMeta, merge, merge_text, non_blank};

/// Gallery
///
/// A photo/video album, stored in the `galleries` table with both embedded lists in
/// JSONB columns.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Gallery {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[sqlx(json)]
    pub images: Vec<ImageMeta>,
    #[sqlx(json)]
    pub videos: Vec<VideoLink>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// VideoLink
///
/// An externally hosted video (e.g. YouTube) attached to a gallery. Nothing is uploaded
/// for these, so removal never touches object storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VideoLink {
    pub id: Uuid,
    pub url: String,
    pub title: Option<String>,
}

/// One entry of the `videos` form field, a JSON array of `{url, title?}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VideoLinkInput {
    #[validate(url(message = "must be a valid URL"))]
    pub url: String,
    pub title: Option<String>,
}

impl From<VideoLinkInput> for VideoLink {
    fn from(input: VideoLinkInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: input.url,
            title: non_blank(input.title),
        }
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct CreateGalleryRequest {
    #[validate(
        required(message = "is required"),
        length(min = 3, message = "must be at least 3 characters")
    )]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(nested)]
    pub videos: Vec<VideoLinkInput>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateGalleryRequest {
    #[validate(length(min = 3, message = "must be at least 3 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Appended to the existing list.
    #[validate(nested)]
    pub videos: Vec<VideoLinkInput>,
    pub is_active: Option<bool>,
}

impl Gallery {
    pub fn new(req: CreateGalleryRequest, images: Vec<ImageMeta>, author: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: req.title.unwrap_or_default(),
            description: non_blank(req.description),
            category: non_blank(req.category),
            images,
            videos: req.videos.into_iter().map(VideoLink::from).collect(),
            is_active: req.is_active.unwrap_or(true),
            created_by: Some(author),
            updated_by: Some(author),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the scalar fields and returns the video links to append.
    pub fn apply(&mut self, patch: UpdateGalleryRequest, editor: Uuid) -> Vec<VideoLink> {
        merge(&mut self.title, patch.title);
        merge_text(&mut self.description, patch.description);
        merge_text(&mut self.category, patch.category);
        merge(&mut self.is_active, patch.is_active);
        self.touch(editor);
        patch.videos.into_iter().map(VideoLink::from).collect()
    }

    pub fn remove_image(&mut self, image_id: Uuid, editor: Uuid) -> Option<ImageMeta> {
        let index = self.images.iter().position(|img| img.id == image_id)?;
        let removed = self.images.remove(index);
        self.touch(editor);
        Some(removed)
    }

    pub fn remove_video(&mut self, video_id: Uuid, editor: Uuid) -> Option<VideoLink> {
        let index = self.videos.iter().position(|v| v.id == video_id)?;
        let removed = self.videos.remove(index);
        self.touch(editor);
        Some(removed)
    }

    fn touch(&mut self, editor: Uuid) {
        self.updated_by = Some(editor);
        self.updated_at = Utc::now();
    }
}
