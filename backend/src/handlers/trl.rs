use axum::extract::{Query, State, rejection::QueryRejection};
use uuid::Uuid;

use super::{ApiPath, FormData, IMAGE_CONTENT_TYPES, discard, persist_or_discard, upload_one};
use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{CreateTrlRequest, ListParams, ListQuery, Trl, UpdateTrlRequest},
    response::{ApiResponse, ListData},
};

const NAMESPACE: &str = "trls";
const LEVEL_FORMAT: &str = "must be a whole number between 1 and 9";

/// create_trl
///
/// [Admin Route] Lists a technology with its readiness level (`level`, 1..=9).
#[utoipa::path(
    post,
    path = "/api/v1/trl/create",
    tag = "trl",
    responses(
        (status = 201, description = "TRL created", body = Trl),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_trl(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    mut form: FormData,
) -> AppResult<ApiResponse<Trl>> {
    let request = CreateTrlRequest {
        title: form.text("title"),
        description: form.text("description"),
        level: form.parse("level", LEVEL_FORMAT),
        sector: form.text("sector"),
        contact_email: form.text("contactEmail"),
        is_active: form.flag("isActive"),
    };
    let file = form.file("image", IMAGE_CONTENT_TYPES);
    form.validate(&request)?;

    let image = upload_one(state.storage.as_ref(), NAMESPACE, file).await?;
    let image_url = image.map(|f| f.url);
    let uploaded: Vec<String> = image_url.iter().cloned().collect();

    let trl = Trl::new(request, image_url, admin.id);
    let saved = persist_or_discard(
        async { state.repo.insert_trl(&trl).await.map(Some) },
        state.storage.as_ref(),
        &uploaded,
        "TRL",
    )
    .await?;

    tracing::info!(trl_id = %saved.id, level = saved.level, admin_id = %admin.id, "trl created");
    Ok(ApiResponse::created("TRL created successfully", saved))
}

#[utoipa::path(
    get,
    path = "/api/v1/trl/list",
    tag = "trl",
    params(ListParams),
    responses((status = 200, description = "Page of TRL listings", body = [Trl]))
)]
pub async fn list_trls(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<ApiResponse<ListData<Trl>>> {
    let Query(params) = params?;
    let query = ListQuery::from(params);
    let page = state.repo.list_trls(&query).await?;
    Ok(ApiResponse::ok(
        "TRLs fetched successfully",
        ListData::from_page(page, &query),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/trl/{id}",
    tag = "trl",
    params(("id" = Uuid, Path, description = "TRL ID")),
    responses(
        (status = 200, description = "TRL found", body = Trl),
        (status = 404, description = "TRL not found")
    )
)]
pub async fn get_trl(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<ApiResponse<Trl>> {
    let trl = state
        .repo
        .get_trl(id)
        .await?
        .ok_or(AppError::NotFound("TRL"))?;
    Ok(ApiResponse::ok("TRL fetched successfully", trl))
}

#[utoipa::path(
    patch,
    path = "/api/v1/trl/update/{id}",
    tag = "trl",
    params(("id" = Uuid, Path, description = "TRL ID")),
    responses(
        (status = 200, description = "TRL updated", body = Trl),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "TRL not found")
    )
)]
pub async fn update_trl(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    mut form: FormData,
) -> AppResult<ApiResponse<Trl>> {
    let patch = UpdateTrlRequest {
        title: form.text("title"),
        description: form.text("description"),
        level: form.parse("level", LEVEL_FORMAT),
        sector: form.text("sector"),
        contact_email: form.text("contactEmail"),
        is_active: form.flag("isActive"),
    };
    let file = form.file("image", IMAGE_CONTENT_TYPES);
    form.validate(&patch)?;

    let mut trl = state
        .repo
        .get_trl(id)
        .await?
        .ok_or(AppError::NotFound("TRL"))?;

    let image = upload_one(state.storage.as_ref(), NAMESPACE, file).await?;
    let new_url = image.map(|f| f.url);
    let uploaded: Vec<String> = new_url.iter().cloned().collect();

    let replaced = trl.apply(patch, new_url, admin.id);
    let saved = persist_or_discard(
        state.repo.update_trl(&trl),
        state.storage.as_ref(),
        &uploaded,
        "TRL",
    )
    .await?;

    if let Some(old_url) = replaced {
        discard(state.storage.as_ref(), &old_url).await;
    }

    tracing::info!(trl_id = %id, admin_id = %admin.id, "trl updated");
    Ok(ApiResponse::ok("TRL updated successfully", saved))
}
