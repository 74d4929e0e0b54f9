use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{merge, merge_text, non_blank};

/// ImportantDocument
///
/// A downloadable document (circular, policy, form) stored in `important_documents`.
/// Unlike the other entities the file is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImportantDocument {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub file_url: String,
    pub file_name: String,
    pub content_type: String,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// The stored file behind a document, as returned by the upload helper.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub url: String,
    pub file_name: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct CreateDocumentRequest {
    #[validate(
        required(message = "is required"),
        length(min = 3, message = "must be at least 3 characters")
    )]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateDocumentRequest {
    #[validate(length(min = 3, message = "must be at least 3 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl ImportantDocument {
    pub fn new(req: CreateDocumentRequest, file: StoredFile, author: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: req.title.unwrap_or_default(),
            description: non_blank(req.description),
            category: non_blank(req.category),
            file_url: file.url,
            file_name: file.file_name,
            content_type: file.content_type,
            is_active: req.is_active.unwrap_or(true),
            created_by: Some(author),
            updated_by: Some(author),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the patch. When a replacement file is supplied the previous file URL is
    /// returned for cleanup.
    pub fn apply(
        &mut self,
        patch: UpdateDocumentRequest,
        new_file: Option<StoredFile>,
        editor: Uuid,
    ) -> Option<String> {
        merge(&mut self.title, patch.title);
        merge_text(&mut self.description, patch.description);
        merge_text(&mut self.category, patch.category);
        merge(&mut self.is_active, patch.is_active);
        self.updated_by = Some(editor);
        self.updated_at = Utc::now();

        let file = new_file?;
        self.file_name = file.file_name;
        self.content_type = file.content_type;
        Some(std::mem::replace(&mut self.file_url, file.url))
    }
}
