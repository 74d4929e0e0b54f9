use axum::extract::{Query, State, rejection::QueryRejection};
use uuid::Uuid;

use super::{
    ApiPath, FormData, IMAGE_CONTENT_TYPES, discard, persist_or_discard, upload_images,
};
use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{
        CreateGalleryRequest, Gallery, ListParams, ListQuery, UpdateGalleryRequest, VideoLinkInput,
    },
    repository::Removal,
    response::{ApiResponse, ListData},
};

const NAMESPACE: &str = "galleries";

/// create_gallery
///
/// [Admin Route] Creates an album. Pictures arrive under the repeatable `images` field;
/// video links are a JSON array of `{url, title?}` in the `videos` text field.
#[utoipa::path(
    post,
    path = "/api/v1/gallery/create",
    tag = "galleries",
    responses(
        (status = 201, description = "Gallery created", body = Gallery),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_gallery(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    mut form: FormData,
) -> AppResult<ApiResponse<Gallery>> {
    let request = CreateGalleryRequest {
        title: form.text("title"),
        description: form.text("description"),
        category: form.text("category"),
        videos: form.json::<Vec<VideoLinkInput>>("videos").unwrap_or_default(),
        is_active: form.flag("isActive"),
    };
    let files = form.files("images", IMAGE_CONTENT_TYPES);
    form.validate(&request)?;

    let images = upload_images(state.storage.as_ref(), NAMESPACE, files).await?;
    let uploaded: Vec<String> = images.iter().map(|img| img.url.clone()).collect();

    let gallery = Gallery::new(request, images, admin.id);
    let saved = persist_or_discard(
        async { state.repo.insert_gallery(&gallery).await.map(Some) },
        state.storage.as_ref(),
        &uploaded,
        "Gallery",
    )
    .await?;

    tracing::info!(
        gallery_id = %saved.id,
        admin_id = %admin.id,
        images = saved.images.len(),
        videos = saved.videos.len(),
        "gallery created"
    );
    Ok(ApiResponse::created("Gallery created successfully", saved))
}

#[utoipa::path(
    get,
    path = "/api/v1/gallery/list",
    tag = "galleries",
    params(ListParams),
    responses((status = 200, description = "Page of galleries", body = [Gallery]))
)]
pub async fn list_galleries(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<ApiResponse<ListData<Gallery>>> {
    let Query(params) = params?;
    let query = ListQuery::from(params);
    let page = state.repo.list_galleries(&query).await?;
    Ok(ApiResponse::ok(
        "Galleries fetched successfully",
        ListData::from_page(page, &query),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/gallery/{id}",
    tag = "galleries",
    params(("id" = Uuid, Path, description = "Gallery ID")),
    responses(
        (status = 200, description = "Gallery found", body = Gallery),
        (status = 404, description = "Gallery not found")
    )
)]
pub async fn get_gallery(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<ApiResponse<Gallery>> {
    let gallery = state
        .repo
        .get_gallery(id)
        .await?
        .ok_or(AppError::NotFound("Gallery"))?;
    Ok(ApiResponse::ok("Gallery fetched successfully", gallery))
}

/// update_gallery
///
/// [Admin Route] Partial update. New `images` files and `videos` entries are appended to
/// the existing lists; use the sub-resource routes to remove them.
#[utoipa::path(
    patch,
    path = "/api/v1/gallery/update/{id}",
    tag = "galleries",
    params(("id" = Uuid, Path, description = "Gallery ID")),
    responses(
        (status = 200, description = "Gallery updated", body = Gallery),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Gallery not found")
    )
)]
pub async fn update_gallery(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    mut form: FormData,
) -> AppResult<ApiResponse<Gallery>> {
    let patch = UpdateGalleryRequest {
        title: form.text("title"),
        description: form.text("description"),
        category: form.text("category"),
        videos: form.json::<Vec<VideoLinkInput>>("videos").unwrap_or_default(),
        is_active: form.flag("isActive"),
    };
    let files = form.files("images", IMAGE_CONTENT_TYPES);
    form.validate(&patch)?;

    let mut gallery = state
        .repo
        .get_gallery(id)
        .await?
        .ok_or(AppError::NotFound("Gallery"))?;

    let images = upload_images(state.storage.as_ref(), NAMESPACE, files).await?;
    let uploaded: Vec<String> = images.iter().map(|img| img.url.clone()).collect();

    let videos = gallery.apply(patch, admin.id);
    let saved = persist_or_discard(
        state.repo.update_gallery(&gallery, &images, &videos),
        state.storage.as_ref(),
        &uploaded,
        "Gallery",
    )
    .await?;

    tracing::info!(gallery_id = %id, admin_id = %admin.id, "gallery updated");
    Ok(ApiResponse::ok("Gallery updated successfully", saved))
}

/// delete_gallery_image
///
/// [Admin Route] Removes one picture from the album and deletes its stored object.
#[utoipa::path(
    delete,
    path = "/api/v1/gallery/{id}/images/{image_id}",
    tag = "galleries",
    params(
        ("id" = Uuid, Path, description = "Gallery ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image removed", body = Gallery),
        (status = 404, description = "Gallery or image not found")
    )
)]
pub async fn delete_gallery_image(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiPath((id, image_id)): ApiPath<(Uuid, Uuid)>,
) -> AppResult<ApiResponse<Gallery>> {
    let (saved, removed) = match state
        .repo
        .remove_gallery_image(id, image_id, admin.id)
        .await?
    {
        Removal::Removed { row, item } => (row, item),
        Removal::RowMissing => return Err(AppError::NotFound("Gallery")),
        Removal::ItemMissing => return Err(AppError::NotFound("Image")),
    };

    discard(state.storage.as_ref(), &removed.url).await;

    tracing::info!(gallery_id = %id, %image_id, admin_id = %admin.id, "gallery image removed");
    Ok(ApiResponse::ok("Image removed successfully", saved))
}

/// delete_gallery_video
///
/// [Admin Route] Removes one video link. Videos are external, so storage is untouched.
#[utoipa::path(
    delete,
    path = "/api/v1/gallery/{id}/videos/{video_id}",
    tag = "galleries",
    params(
        ("id" = Uuid, Path, description = "Gallery ID"),
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video removed", body = Gallery),
        (status = 404, description = "Gallery or video not found")
    )
)]
pub async fn delete_gallery_video(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiPath((id, video_id)): ApiPath<(Uuid, Uuid)>,
) -> AppResult<ApiResponse<Gallery>> {
    let saved = match state
        .repo
        .remove_gallery_video(id, video_id, admin.id)
        .await?
    {
        Removal::Removed { row, .. } => row,
        Removal::RowMissing => return Err(AppError::NotFound("Gallery")),
        Removal::ItemMissing => return Err(AppError::NotFound("Video")),
    };

    tracing::info!(gallery_id = %id, %video_id, admin_id = %admin.id, "gallery video removed");
    Ok(ApiResponse::ok("Video removed successfully", saved))
}
