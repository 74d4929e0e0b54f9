use axum::extract::{Query, State, rejection::QueryRejection};
use uuid::Uuid;

use super::{
    ApiPath, DOCUMENT_CONTENT_TYPES, FormData, discard, persist_or_discard, upload_one,
};
use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{
        CreateDocumentRequest, ImportantDocument, ListParams, ListQuery, UpdateDocumentRequest,
    },
    response::{ApiResponse, ListData},
};

const NAMESPACE: &str = "documents";

/// create_document
///
/// [Admin Route] Publishes a downloadable document. The `file` part is mandatory and
/// must be a PDF or an Office document.
#[utoipa::path(
    post,
    path = "/api/v1/document/create",
    tag = "documents",
    responses(
        (status = 201, description = "Document created", body = ImportantDocument),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_document(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    mut form: FormData,
) -> AppResult<ApiResponse<ImportantDocument>> {
    let request = CreateDocumentRequest {
        title: form.text("title"),
        description: form.text("description"),
        category: form.text("category"),
        is_active: form.flag("isActive"),
    };
    if !form.has_file("file") {
        form.error("file", "is required");
    }
    let file = form.file("file", DOCUMENT_CONTENT_TYPES);
    form.validate(&request)?;

    let stored = upload_one(state.storage.as_ref(), NAMESPACE, file)
        .await?
        .ok_or_else(|| AppError::field("file", "is required"))?;
    let uploaded = vec![stored.url.clone()];

    let doc = ImportantDocument::new(request, stored, admin.id);
    let saved = persist_or_discard(
        async { state.repo.insert_document(&doc).await.map(Some) },
        state.storage.as_ref(),
        &uploaded,
        "Document",
    )
    .await?;

    tracing::info!(document_id = %saved.id, admin_id = %admin.id, "document created");
    Ok(ApiResponse::created("Document created successfully", saved))
}

#[utoipa::path(
    get,
    path = "/api/v1/document/list",
    tag = "documents",
    params(ListParams),
    responses((status = 200, description = "Page of documents", body = [ImportantDocument]))
)]
pub async fn list_documents(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<ApiResponse<ListData<ImportantDocument>>> {
    let Query(params) = params?;
    let query = ListQuery::from(params);
    let page = state.repo.list_documents(&query).await?;
    Ok(ApiResponse::ok(
        "Documents fetched successfully",
        ListData::from_page(page, &query),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/document/{id}",
    tag = "documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document found", body = ImportantDocument),
        (status = 404, description = "Document not found")
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<ApiResponse<ImportantDocument>> {
    let doc = state
        .repo
        .get_document(id)
        .await?
        .ok_or(AppError::NotFound("Document"))?;
    Ok(ApiResponse::ok("Document fetched successfully", doc))
}

/// update_document
///
/// [Admin Route] Partial update. A new `file` replaces the stored one.
#[utoipa::path(
    patch,
    path = "/api/v1/document/update/{id}",
    tag = "documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document updated", body = ImportantDocument),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn update_document(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    mut form: FormData,
) -> AppResult<ApiResponse<ImportantDocument>> {
    let patch = UpdateDocumentRequest {
        title: form.text("title"),
        description: form.text("description"),
        category: form.text("category"),
        is_active: form.flag("isActive"),
    };
    let file = form.file("file", DOCUMENT_CONTENT_TYPES);
    form.validate(&patch)?;

    let mut doc = state
        .repo
        .get_document(id)
        .await?
        .ok_or(AppError::NotFound("Document"))?;

    let stored = upload_one(state.storage.as_ref(), NAMESPACE, file).await?;
    let uploaded: Vec<String> = stored.iter().map(|f| f.url.clone()).collect();

    let replaced = doc.apply(patch, stored, admin.id);
    let saved = persist_or_discard(
        state.repo.update_document(&doc),
        state.storage.as_ref(),
        &uploaded,
        "Document",
    )
    .await?;

    if let Some(old_url) = replaced {
        discard(state.storage.as_ref(), &old_url).await;
    }

    tracing::info!(document_id = %id, admin_id = %admin.id, "document updated");
    Ok(ApiResponse::ok("Document updated successfully", saved))
}
