use axum::extract::{Query, State, rejection::QueryRejection};
use uuid::Uuid;

use super::{
    ApiPath, FormData, IMAGE_CONTENT_TYPES, discard, persist_or_discard, upload_images,
};
use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{CreateEventRequest, Event, ListParams, ListQuery, UpdateEventRequest},
    repository::Removal,
    response::{ApiResponse, ListData},
};

const NAMESPACE: &str = "events";

/// create_event
///
/// [Admin Route] Creates an event from a multipart form. Pictures arrive under the
/// repeatable `images` field and are stored before the row is written.
#[utoipa::path(
    post,
    path = "/api/v1/event/create",
    tag = "events",
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_event(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    mut form: FormData,
) -> AppResult<ApiResponse<Event>> {
    let request = CreateEventRequest {
        title: form.text("title"),
        description: form.text("description"),
        venue: form.text("venue"),
        event_date: form.date("eventDate"),
        registration_link: form.text("registrationLink"),
        is_active: form.flag("isActive"),
    };
    let files = form.files("images", IMAGE_CONTENT_TYPES);
    form.validate(&request)?;

    let images = upload_images(state.storage.as_ref(), NAMESPACE, files).await?;
    let uploaded: Vec<String> = images.iter().map(|img| img.url.clone()).collect();

    let event = Event::new(request, images, admin.id);
    let saved = persist_or_discard(
        async { state.repo.insert_event(&event).await.map(Some) },
        state.storage.as_ref(),
        &uploaded,
        "Event",
    )
    .await?;

    tracing::info!(
        event_id = %saved.id,
        admin_id = %admin.id,
        images = saved.images.len(),
        "event created"
    );
    Ok(ApiResponse::created("Event created successfully", saved))
}

/// list_events
///
/// [Public Route] Paginated, searchable event listing.
#[utoipa::path(
    get,
    path = "/api/v1/event/list",
    tag = "events",
    params(ListParams),
    responses((status = 200, description = "Page of events", body = [Event]))
)]
pub async fn list_events(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<ApiResponse<ListData<Event>>> {
    let Query(params) = params?;
    let query = ListQuery::from(params);
    let page = state.repo.list_events(&query).await?;
    Ok(ApiResponse::ok(
        "Events fetched successfully",
        ListData::from_page(page, &query),
    ))
}

/// get_event
///
/// [Public Route] A single event by id.
#[utoipa::path(
    get,
    path = "/api/v1/event/{id}",
    tag = "events",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = Event),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<ApiResponse<Event>> {
    let event = state
        .repo
        .get_event(id)
        .await?
        .ok_or(AppError::NotFound("Event"))?;
    Ok(ApiResponse::ok("Event fetched successfully", event))
}

/// update_event
///
/// [Admin Route] Partial update. Only the fields present in the form change; files sent
/// under `images` are appended to the existing pictures.
#[utoipa::path(
    patch,
    path = "/api/v1/event/update/{id}",
    tag = "events",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn update_event(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    mut form: FormData,
) -> AppResult<ApiResponse<Event>> {
    let patch = UpdateEventRequest {
        title: form.text("title"),
        description: form.text("description"),
        venue: form.text("venue"),
        event_date: form.date("eventDate"),
        registration_link: form.text("registrationLink"),
        is_active: form.flag("isActive"),
    };
    let files = form.files("images", IMAGE_CONTENT_TYPES);
    form.validate(&patch)?;

    let mut event = state
        .repo
        .get_event(id)
        .await?
        .ok_or(AppError::NotFound("Event"))?;

    let images = upload_images(state.storage.as_ref(), NAMESPACE, files).await?;
    let uploaded: Vec<String> = images.iter().map(|img| img.url.clone()).collect();

    event.apply(patch, admin.id);
    let saved = persist_or_discard(
        state.repo.update_event(&event, &images),
        state.storage.as_ref(),
        &uploaded,
        "Event",
    )
    .await?;

    tracing::info!(
        event_id = %id,
        admin_id = %admin.id,
        added_images = uploaded.len(),
        "event updated"
    );
    Ok(ApiResponse::ok("Event updated successfully", saved))
}

/// delete_event_image
///
/// [Admin Route] Removes one picture from an event and deletes its stored object.
#[utoipa::path(
    delete,
    path = "/api/v1/event/{id}/images/{image_id}",
    tag = "events",
    params(
        ("id" = Uuid, Path, description = "Event ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image removed", body = Event),
        (status = 404, description = "Event or image not found")
    )
)]
pub async fn delete_event_image(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiPath((id, image_id)): ApiPath<(Uuid, Uuid)>,
) -> AppResult<ApiResponse<Event>> {
    let (saved, removed) = match state
        .repo
        .remove_event_image(id, image_id, admin.id)
        .await?
    {
        Removal::Removed { row, item } => (row, item),
        Removal::RowMissing => return Err(AppError::NotFound("Event")),
        Removal::ItemMissing => return Err(AppError::NotFound("Image")),
    };

    discard(state.storage.as_ref(), &removed.url).await;

    tracing::info!(event_id = %id, %image_id, admin_id = %admin.id, "event image removed");
    Ok(ApiResponse::ok("Image removed successfully", saved))
}
