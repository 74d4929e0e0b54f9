use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{ValidateEmail, ValidateUrl, ValidationError};

// --- Entity Modules ---

pub mod document;
pub mod event;
pub mod gallery;
pub mod news;
pub mod team;
pub mod trl;
pub mod user;

pub use document::{CreateDocumentRequest, ImportantDocument, StoredFile, UpdateDocumentRequest};
pub use event::{CreateEventRequest, Event, UpdateEventRequest};
pub use gallery::{CreateGalleryRequest, Gallery, UpdateGalleryRequest, VideoLink, VideoLinkInput};
pub use news::{CreateNewsRequest, News, UpdateNewsRequest};
pub use team::{CreateTeamMemberRequest, TeamMember, UpdateTeamMemberRequest};
pub use trl::{CreateTrlRequest, Trl, UpdateTrlRequest};
pub use user::{
    CreateUserRequest, LoginRequest, LoginResponse, Role, UpdateUserRequest, User, UserProfile,
    normalize_email,
};

// --- Embedded Types ---

/// ImageMeta
///
/// Metadata of one uploaded image, embedded in the owning record's JSONB column.
/// `url` is the public object-storage URL and the handle used to delete the object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImageMeta {
    pub id: Uuid,
    pub url: String,
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    #[ts(type = "string")]
    pub uploaded_at: DateTime<Utc>,
}

impl ImageMeta {
    pub fn new(url: String, file_name: String, content_type: String, size: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            file_name,
            content_type,
            size: size as i64,
            uploaded_at: Utc::now(),
        }
    }
}

// --- Listing ---

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// ListParams
///
/// Raw query string of every `/list` endpoint. Normalized into [`ListQuery`] before use.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number. Values below 1 are treated as 1.
    pub page: Option<i64>,
    /// Page size, clamped to 1..=100. Defaults to 10.
    pub limit: Option<i64>,
    /// Case-insensitive substring matched against the entity's text fields.
    pub search: Option<String>,
    /// Restrict to active (`true`) or inactive (`false`) records.
    pub is_active: Option<bool>,
}

/// ListQuery
///
/// Pagination and filter values after clamping, shared by every repository list call.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListParams::default().into()
    }
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        Self {
            page: params.page.unwrap_or(1).max(1),
            limit: params
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            search: params
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            is_active: params.is_active,
        }
    }
}

impl ListQuery {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of records plus the total number of matches.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

// --- Admin Dashboard ---

/// AdminDashboardStats
///
/// Record counts per collection for the admin dashboard cards (GET /api/v1/admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminDashboardStats {
    pub events: i64,
    pub news: i64,
    pub galleries: i64,
    pub team_members: i64,
    pub trls: i64,
    pub documents: i64,
    pub users: i64,
}

// --- Merge Helpers ---

/// Overwrites a required field when the patch carries a value.
pub(crate) fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Overwrites an optional text field. A blank value clears it.
pub(crate) fn merge_text(slot: &mut Option<String>, value: Option<String>) {
    match value {
        Some(v) if v.trim().is_empty() => *slot = None,
        Some(v) => *slot = Some(v),
        None => {}
    }
}

/// Treats blank optional text as absent on create.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// --- Field Validators ---

/// Optional URL fields accept a blank value (meaning "clear") or an absolute URL.
pub(crate) fn blank_or_url(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message("must be a valid URL".into()))
    }
}

/// Optional email fields accept a blank value or a well-formed address.
pub(crate) fn blank_or_email(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message("must be a valid email address".into()))
    }
}
