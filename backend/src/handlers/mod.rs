use std::{collections::HashMap, str::FromStr};

use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Request};
use axum::http::request::Parts;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    AppState,
    error::{AppError, AppResult, FieldErrors, field_errors},
    models::{ImageMeta, StoredFile},
    repository::RepoResult,
    storage::{StorageService, delete_file, upload_file},
};

// --- Entity Handler Modules ---

pub mod document;
pub mod event;
pub mod gallery;
pub mod news;
pub mod stats;
pub mod team;
pub mod trl;
pub mod user;

/// MIME types accepted for picture fields (`images`, `image`, `photo`).
pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// MIME types accepted for the document `file` field.
pub const DOCUMENT_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
];

// --- Path Extraction ---

/// ApiPath
///
/// `Path` with its rejection folded into the JSON error envelope, so a malformed id
/// answers `{success: false, ...}` instead of axum's plain-text body.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(value))
    }
}

// --- Multipart Forms ---

/// One uploaded file, fully buffered.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// FormData
///
/// A buffered `multipart/form-data` body. Text fields are trimmed; the last value wins
/// for repeated text fields while file fields accumulate. Conversion problems (bad dates,
/// oversized or mistyped files) are collected into `errors` and reported together with
/// the request's own validation failures.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, Vec<FilePart>>,
    errors: FieldErrors,
}

/// FormData Extractor Implementation
///
/// Reads the whole body up front, enforcing the configured per-file size cap.
impl FromRequest<AppState> for FormData {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        Self::read(multipart, state.config.max_upload_bytes).await
    }
}

impl FormData {
    /// Drains `multipart`, rejecting any single file larger than `max_file_bytes`.
    pub async fn read(mut multipart: Multipart, max_file_bytes: usize) -> AppResult<Self> {
        let mut form = FormData::default();

        while let Some(mut field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            let Some(file_name) = field.file_name().map(str::to_string) else {
                let value = field.text().await?;
                form.fields.insert(name, value.trim().to_string());
                continue;
            };

            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();

            let mut bytes = Vec::new();
            let mut oversized = false;
            while let Some(chunk) = field.chunk().await? {
                if bytes.len() + chunk.len() > max_file_bytes {
                    oversized = true;
                    break;
                }
                bytes.extend_from_slice(&chunk);
            }

            if oversized {
                form.error(&name, format!("file exceeds the {max_file_bytes} byte limit"));
                continue;
            }

            // Browsers send an empty part for a file input left blank.
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }

            form.files.entry(name).or_default().push(FilePart {
                file_name,
                content_type,
                bytes,
            });
        }

        Ok(form)
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// The raw (trimmed) text value. An empty string is kept so updates can clear fields.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Parses a typed value. Blank counts as absent; an unparsable value records `message`.
    pub fn parse<T: FromStr>(&mut self, name: &str, message: &str) -> Option<T> {
        let raw = self.fields.get(name)?.clone();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(name, message);
                None
            }
        }
    }

    pub fn date(&mut self, name: &str) -> Option<NaiveDate> {
        self.parse(name, "must be a date in YYYY-MM-DD format")
    }

    pub fn flag(&mut self, name: &str) -> Option<bool> {
        self.parse(name, "must be true or false")
    }

    /// Decodes a text field holding JSON, e.g. the gallery `videos` array.
    pub fn json<T: DeserializeOwned>(&mut self, name: &str) -> Option<T> {
        let raw = self.fields.get(name)?.clone();
        if raw.is_empty() {
            return None;
        }
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                self.error(name, format!("must be valid JSON: {e}"));
                None
            }
        }
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.files.get(name).is_some_and(|files| !files.is_empty())
    }

    /// Takes every file sent under `name`, recording an error for disallowed types.
    pub fn files(&mut self, name: &str, allowed: &[&str]) -> Vec<FilePart> {
        let files = self.files.remove(name).unwrap_or_default();
        let (accepted, rejected): (Vec<_>, Vec<_>) = files
            .into_iter()
            .partition(|f| allowed.contains(&f.content_type.as_str()));

        for file in rejected {
            self.error(
                name,
                format!("{}: unsupported file type {}", file.file_name, file.content_type),
            );
        }
        accepted
    }

    /// Takes the single file sent under `name`.
    pub fn file(&mut self, name: &str, allowed: &[&str]) -> Option<FilePart> {
        let mut files = self.files(name, allowed);
        if files.len() > 1 {
            self.error(name, "only one file is allowed");
            return None;
        }
        files.pop()
    }

    /// Runs the request's own rules and reports them together with the conversion
    /// errors gathered while reading the form.
    pub fn validate<T: Validate>(self, request: &T) -> AppResult<()> {
        let mut errors = self.errors;
        if let Err(e) = request.validate() {
            for (field, messages) in field_errors(&e) {
                errors.entry(field).or_default().extend(messages);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

// --- Upload / Cleanup ---

/// Uploads every file under `namespace`. If one fails, the ones already stored are
/// removed before the error is returned.
pub async fn upload_images(
    storage: &dyn StorageService,
    namespace: &str,
    files: Vec<FilePart>,
) -> AppResult<Vec<ImageMeta>> {
    let mut images: Vec<ImageMeta> = Vec::with_capacity(files.len());

    for file in files {
        let size = file.bytes.len();
        match upload_file(storage, namespace, &file.file_name, file.bytes, &file.content_type)
            .await
        {
            Ok(url) => images.push(ImageMeta::new(url, file.file_name, file.content_type, size)),
            Err(e) => {
                for image in &images {
                    discard(storage, &image.url).await;
                }
                return Err(e.into());
            }
        }
    }

    Ok(images)
}

/// Uploads an optional single file.
pub async fn upload_one(
    storage: &dyn StorageService,
    namespace: &str,
    file: Option<FilePart>,
) -> AppResult<Option<StoredFile>> {
    let Some(file) = file else {
        return Ok(None);
    };

    let url = upload_file(storage, namespace, &file.file_name, file.bytes, &file.content_type)
        .await?;
    Ok(Some(StoredFile {
        url,
        file_name: file.file_name,
        content_type: file.content_type,
    }))
}

/// Best-effort removal of a stored object. Failures are logged, never returned.
pub async fn discard(storage: &dyn StorageService, url: &str) {
    if let Err(e) = delete_file(storage, url).await {
        tracing::warn!(url, error = %e, "failed to delete stored object");
    }
}

pub async fn discard_all(storage: &dyn StorageService, urls: &[String]) {
    for url in urls {
        discard(storage, url).await;
    }
}

/// persist_or_discard
///
/// Awaited repository write that undoes this request's uploads when the write fails or
/// the target row vanished in the meantime.
pub async fn persist_or_discard<T>(
    write: impl Future<Output = RepoResult<Option<T>>>,
    storage: &dyn StorageService,
    uploaded: &[String],
    entity: &'static str,
) -> AppResult<T> {
    match write.await {
        Ok(Some(saved)) => Ok(saved),
        Ok(None) => {
            discard_all(storage, uploaded).await;
            Err(AppError::NotFound(entity))
        }
        Err(e) => {
            discard_all(storage, uploaded).await;
            Err(e.into())
        }
    }
}
