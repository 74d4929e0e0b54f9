use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{blank_or_email, merge, merge_text, non_blank};

pub const MIN_TRL_LEVEL: i16 = 1;
pub const MAX_TRL_LEVEL: i16 = 9;

/// Trl
///
/// A technology listed with its Technology Readiness Level (1 = basic principles
/// observed, 9 = proven in operational environment). Stored in `trls`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Trl {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub level: i16,
    pub sector: Option<String>,
    pub contact_email: Option<String>,
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
pub struct CreateTrlRequest {
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
        range(min = 1, max = 9, message = "must be between 1 and 9")
    )]
    pub level: Option<i16>,
    pub sector: Option<String>,
    #[validate(custom(function = "blank_or_email"))]
    pub contact_email: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateTrlRequest {
    #[validate(length(min = 3, message = "must be at least 3 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 10, message = "must be at least 10 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 9, message = "must be between 1 and 9"))]
    pub level: Option<i16>,
    pub sector: Option<String>,
    #[validate(custom(function = "blank_or_email"))]
    pub contact_email: Option<String>,
    pub is_active: Option<bool>,
}

impl Trl {
    pub fn new(req: CreateTrlRequest, image_url: Option<String>, author: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            level: req
                .level
                .unwrap_or(MIN_TRL_LEVEL)
                .clamp(MIN_TRL_LEVEL, MAX_TRL_LEVEL),
            sector: non_blank(req.sector),
            contact_email: non_blank(req.contact_email),
            image_url,
            is_active: req.is_active.unwrap_or(true),
            created_by: Some(author),
            updated_by: Some(author),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the patch and returns the replaced image URL, if any.
    pub fn apply(
        &mut self,
        patch: UpdateTrlRequest,
        new_image_url: Option<String>,
        editor: Uuid,
    ) -> Option<String> {
        merge(&mut self.title, patch.title);
        merge(&mut self.description, patch.description);
        merge(&mut self.level, patch.level);
        merge_text(&mut self.sector, patch.sector);
        merge_text(&mut self.contact_email, patch.contact_email);
        merge(&mut self.is_active, patch.is_active);
        self.updated_by = Some(editor);
        self.updated_at = Utc::now();

        let url = new_image_url?;
        self.image_url.replace(url)
    }
}
