use axum::extract::{Query, State, rejection::QueryRejection};
use uuid::Uuid;

use super::{ApiPath, FormData, IMAGE_CONTENT_TYPES, discard, persist_or_discard, upload_one};
use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{CreateNewsRequest, ListParams, ListQuery, News, UpdateNewsRequest},
    response::{ApiResponse, ListData},
};

const NAMESPACE: &str = "news";

/// create_news
///
/// [Admin Route] Publishes a news item. The optional cover picture is sent as `image`.
#[utoipa::path(
    post,
    path = "/api/v1/news/create",
    tag = "news",
    responses(
        (status = 201, description = "News created", body = News),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_news(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    mut form: FormData,
) -> AppResult<ApiResponse<News>> {
    let request = CreateNewsRequest {
        title: form.text("title"),
        summary: form.text("summary"),
        content: form.text("content"),
        published_on: form.date("publishedOn"),
        source_link: form.text("sourceLink"),
        is_active: form.flag("isActive"),
    };
    let file = form.file("image", IMAGE_CONTENT_TYPES);
    form.validate(&request)?;

    let image = upload_one(state.storage.as_ref(), NAMESPACE, file).await?;
    let image_url = image.map(|f| f.url);
    let uploaded: Vec<String> = image_url.iter().cloned().collect();

    let news = News::new(request, image_url, admin.id);
    let saved = persist_or_discard(
        async { state.repo.insert_news(&news).await.map(Some) },
        state.storage.as_ref(),
        &uploaded,
        "News",
    )
    .await?;

    tracing::info!(news_id = %saved.id, admin_id = %admin.id, "news created");
    Ok(ApiResponse::created("News created successfully", saved))
}

#[utoipa::path(
    get,
    path = "/api/v1/news/list",
    tag = "news",
    params(ListParams),
    responses((status = 200, description = "Page of news", body = [News]))
)]
pub async fn list_news(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<ApiResponse<ListData<News>>> {
    let Query(params) = params?;
    let query = ListQuery::from(params);
    let page = state.repo.list_news(&query).await?;
    Ok(ApiResponse::ok(
        "News fetched successfully",
        ListData::from_page(page, &query),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/news/{id}",
    tag = "news",
    params(("id" = Uuid, Path, description = "News ID")),
    responses(
        (status = 200, description = "News found", body = News),
        (status = 404, description = "News not found")
    )
)]
pub async fn get_news(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<ApiResponse<News>> {
    let news = state
        .repo
        .get_news(id)
        .await?
        .ok_or(AppError::NotFound("News"))?;
    Ok(ApiResponse::ok("News fetched successfully", news))
}

/// update_news
///
/// [Admin Route] Partial update. A new `image` replaces the cover and the previous
/// object is removed from storage once the row is saved.
#[utoipa::path(
    patch,
    path = "/api/v1/news/update/{id}",
    tag = "news",
    params(("id" = Uuid, Path, description = "News ID")),
    responses(
        (status = 200, description = "News updated", body = News),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "News not found")
    )
)]
pub async fn update_news(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    mut form: FormData,
) -> AppResult<ApiResponse<News>> {
    let patch = UpdateNewsRequest {
        title: form.text("title"),
        summary: form.text("summary"),
        content: form.text("content"),
        published_on: form.date("publishedOn"),
        source_link: form.text("sourceLink"),
        is_active: form.flag("isActive"),
    };
    let file = form.file("image", IMAGE_CONTENT_TYPES);
    form.validate(&patch)?;

    let mut news = state
        .repo
        .get_news(id)
        .await?
        .ok_or(AppError::NotFound("News"))?;

    let image = upload_one(state.storage.as_ref(), NAMESPACE, file).await?;
    let new_url = image.map(|f| f.url);
    let uploaded: Vec<String> = new_url.iter().cloned().collect();

    let replaced = news.apply(patch, new_url, admin.id);
    let saved = persist_or_discard(
        state.repo.update_news(&news),
        state.storage.as_ref(),
        &uploaded,
        "News",
    )
    .await?;

    if let Some(old_url) = replaced {
        discard(state.storage.as_ref(), &old_url).await;
    }

    tracing::info!(news_id = %id, admin_id = %admin.id, "news updated");
    Ok(ApiResponse::ok("News updated successfully", saved))
}
