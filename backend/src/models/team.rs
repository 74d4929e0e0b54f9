use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{blank_or_email, blank_or_url, merge, merge_text, non_blank};

/// TeamMember
///
/// A person shown on the "Our Team" page, stored in `team_members`. Listed by
/// `display_order` ascending.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TeamMember {
    pub id: Uuid,
    pub name: String,
    pub designation: String,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub photo_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct CreateTeamMemberRequest {
    #[validate(
        required(message = "is required"),
        length(min = 2, message = "must be at least 2 characters")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "is required"),
        length(min = 1, message = "must not be empty")
    )]
    pub designation: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    #[validate(custom(function = "blank_or_email"))]
    pub email: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub linkedin_url: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateTeamMemberRequest {
    #[validate(length(min = 2, message = "must be at least 2 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub designation: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    #[validate(custom(function = "blank_or_email"))]
    pub email: Option<String>,
    #[validate(custom(function = "blank_or_url"))]
    pub linkedin_url: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl TeamMember {
    pub fn new(req: CreateTeamMemberRequest, photo_url: Option<String>, author: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: req.name.unwrap_or_default(),
            designation: req.designation.unwrap_or_default(),
            department: non_blank(req.department),
            bio: non_blank(req.bio),
            email: non_blank(req.email),
            linkedin_url: non_blank(req.linkedin_url),
            photo_url,
            display_order: req.display_order.unwrap_or(0),
            is_active: req.is_active.unwrap_or(true),
            created_by: Some(author),
            updated_by: Some(author),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the patch and returns the replaced photo URL, if any.
    pub fn apply(
        &mut self,
        patch: UpdateTeamMemberRequest,
        new_photo_url: Option<String>,
        editor: Uuid,
    ) -> Option<String> {
        merge(&mut self.name, patch.name);
        merge(&mut self.designation, patch.designation);
        merge_text(&mut self.department, patch.department);
        merge_text(&mut self.bio, patch.bio);
        merge_text(&mut self.email, patch.email);
        merge_text(&mut self.linkedin_url, patch.linkedin_url);
        merge(&mut self.display_order, patch.display_order);
        merge(&mut self.is_active, patch.is_active);
        self.updated_by = Some(editor);
        self.updated_at = Utc::now();

        let url = new_photo_url?;
        self.photo_url.replace(url)
    }
}
