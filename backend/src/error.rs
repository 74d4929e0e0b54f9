use std::collections::BTreeMap;

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{auth::AuthError, repository::RepoError, storage::StorageError};

/// Validation failures keyed by the camelCase field name the client sent.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// AppError
///
/// Every failure a handler can surface. Implements [`IntoResponse`] so handlers can
/// return `AppResult<T>` and rely on `?` for the `{success, message, errors}` envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// A single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            AppError::Auth(AuthError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(StorageError::ForeignUrl(_)) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(msg) => AppError::Conflict(msg),
            RepoError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(field_errors(&errors))
    }
}

/// field_errors
///
/// Flattens `validator` output into the client-facing map. Nested structs become
/// `parent.child` and list items `parent[i].child`, all in camelCase.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    collect_errors("", errors, &mut out);
    out
}

fn collect_errors(prefix: &str, errors: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let name = camel_case(field);
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}.{name}")
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = list.iter().map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                });
                out.entry(path).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_errors(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

/// `event_date` -> `eventDate`
pub fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::Validation(errors) => json!({
                "success": false,
                "message": "Validation failed",
                "errors": errors,
            }),
            AppError::NotFound(entity) => json!({
                "success": false,
                "message": format!("{entity} not found"),
            }),
            AppError::BadRequest(msg) | AppError::Conflict(msg) => json!({
                "success": false,
                "message": msg,
            }),
            AppError::Auth(err) if status != StatusCode::INTERNAL_SERVER_ERROR => json!({
                "success": false,
                "message": err.to_string(),
            }),
            AppError::Storage(StorageError::ForeignUrl(url)) => json!({
                "success": false,
                "message": format!("URL is not managed by this storage: {url}"),
            }),
            other => {
                tracing::error!(error = %other, "unhandled request failure");
                internal_error_body()
            }
        };

        (status, Json(body)).into_response()
    }
}

/// The generic 500 envelope, shared with the panic catcher in `create_router`.
pub fn internal_error_body() -> serde_json::Value {
    json!({
        "success": false,
        "message": "Internal server error",
    })
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
