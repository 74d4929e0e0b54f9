use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{blank_or_url, merge, merge_text, non_blank};

/// News
///
/// A news item, stored in the `news` table. The optional cover picture lives in object
/// storage and is referenced by `image_url`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct News {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub published_on: NaiveDate,
    pub source_link: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct CreateNewsRequest {
    #[validate(
        required(message = "is required"),
        length(min = 3, message = "must be at least 3 characters")
    )]
    pub title: Option<String>,
    pub summary: Option<String>,
    #[validate(
        required(message = "is required"),
        length(min = 10, message = "must be at least 10 characters")
    )]
    pub content: Option<String>,
    #[validate(required(message = "is required"))]
    pub published_on: Option<NaiveDate>,
    #[validate(custom(function = "blank_or_url"))]
    pub source_link: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateNewsRequest {
    #[validate(length(min = 3, message = "must be at least 3 characters"))]
    pub title: Option<String>,
    pub summary: Option<String>,
    #[validate(length(min = 10, message = "must be at least 10 characters"))]
    pub content: Option<String>,
    pub published_on: Option<NaiveDate>,
    #[validate(custom(function = "blank_or_url"))]
    pub source_link: Option<String>,
    pub is_active: Option<bool>,
}

impl News {
    pub fn new(req: CreateNewsRequest, image_url: Option<String>, author: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: req.title.unwrap_or_default(),
            summary: non_blank(req.summary),
            content: req.content.unwrap_or_default(),
            published_on: req.published_on.unwrap_or_else(|| now.date_naive()),
            source_link: non_blank(req.source_link),
            image_url,
            is_active: req.is_active.unwrap_or(true),
            created_by: Some(author),
            updated_by: Some(author),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the patch. A new cover replaces the old one, whose URL is returned so the
    /// caller can remove it from storage.
    pub fn apply(
        &mut self,
        patch: UpdateNewsRequest,
        new_image_url: Option<String>,
        editor: Uuid,
    ) -> Option<String> {
        merge(&mut self.title, patch.title);
        merge_text(&mut self.summary, patch.summary);
        merge(&mut self.content, patch.content);
        merge(&mut self.published_on, patch.published_on);
        merge_text(&mut self.source_link, patch.source_link);
        merge(&mut self.is_active, patch.is_active);
        self.updated_by = Some(editor);
        self.updated_at = Utc::now();

        let url = new_image_url?;
        self.image_url.replace(url)
    }
}
