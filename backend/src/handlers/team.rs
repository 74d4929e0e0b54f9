use axum::extract::{Query, State, rejection::QueryRejection};
use uuid::Uuid;

use super::{ApiPath, FormData, IMAGE_CONTENT_TYPES, discard, persist_or_discard, upload_one};
use crate::{
    AppState,
    auth::AdminUser,
    error::{AppError, AppResult},
    models::{CreateTeamMemberRequest, ListParams, ListQuery, TeamMember, UpdateTeamMemberRequest},
    response::{ApiResponse, ListData},
};

const NAMESPACE: &str = "team";

/// create_team_member
///
/// [Admin Route] Adds a person to the team page. The portrait is sent as `photo`.
#[utoipa::path(
    post,
    path = "/api/v1/team/create",
    tag = "team",
    responses(
        (status = 201, description = "Team member created", body = TeamMember),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_team_member(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    mut form: FormData,
) -> AppResult<ApiResponse<TeamMember>> {
    let request = CreateTeamMemberRequest {
        name: form.text("name"),
        designation: form.text("designation"),
        department: form.text("department"),
        bio: form.text("bio"),
        email: form.text("email"),
        linkedin_url: form.text("linkedinUrl"),
        display_order: form.parse("displayOrder", "must be a whole number"),
        is_active: form.flag("isActive"),
    };
    let file = form.file("photo", IMAGE_CONTENT_TYPES);
    form.validate(&request)?;

    let photo = upload_one(state.storage.as_ref(), NAMESPACE, file).await?;
    let photo_url = photo.map(|f| f.url);
    let uploaded: Vec<String> = photo_url.iter().cloned().collect();

    let member = TeamMember::new(request, photo_url, admin.id);
    let saved = persist_or_discard(
        async { state.repo.insert_team_member(&member).await.map(Some) },
        state.storage.as_ref(),
        &uploaded,
        "Team member",
    )
    .await?;

    tracing::info!(member_id = %saved.id, admin_id = %admin.id, "team member created");
    Ok(ApiResponse::created("Team member created successfully", saved))
}

/// list_team_members
///
/// [Public Route] Ordered by `displayOrder`, then newest first.
#[utoipa::path(
    get,
    path = "/api/v1/team/list",
    tag = "team",
    params(ListParams),
    responses((status = 200, description = "Page of team members", body = [TeamMember]))
)]
pub async fn list_team_members(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<ApiResponse<ListData<TeamMember>>> {
    let Query(params) = params?;
    let query = ListQuery::from(params);
    let page = state.repo.list_team_members(&query).await?;
    Ok(ApiResponse::ok(
        "Team members fetched successfully",
        ListData::from_page(page, &query),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/team/{id}",
    tag = "team",
    params(("id" = Uuid, Path, description = "Team member ID")),
    responses(
        (status = 200, description = "Team member found", body = TeamMember),
        (status = 404, description = "Team member not found")
    )
)]
pub async fn get_team_member(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<ApiResponse<TeamMember>> {
    let member = state
        .repo
        .get_team_member(id)
        .await?
        .ok_or(AppError::NotFound("Team member"))?;
    Ok(ApiResponse::ok("Team member fetched successfully", member))
}

#[utoipa::path(
    patch,
    path = "/api/v1/team/update/{id}",
    tag = "team",
    params(("id" = Uuid, Path, description = "Team member ID")),
    responses(
        (status = 200, description = "Team member updated", body = TeamMember),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Team member not found")
    )
)]
pub async fn update_team_member(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    mut form: FormData,
) -> AppResult<ApiResponse<TeamMember>> {
    let patch = UpdateTeamMemberRequest {
        name: form.text("name"),
        designation: form.text("designation"),
        department: form.text("department"),
        bio: form.text("bio"),
        email: form.text("email"),
        linkedin_url: form.text("linkedinUrl"),
        display_order: form.parse("displayOrder", "must be a whole number"),
        is_active: form.flag("isActive"),
    };
    let file = form.file("photo", IMAGE_CONTENT_TYPES);
    form.validate(&patch)?;

    let mut member = state
        .repo
        .get_team_member(id)
        .await?
        .ok_or(AppError::NotFound("Team member"))?;

    let photo = upload_one(state.storage.as_ref(), NAMESPACE, file).await?;
    let new_url = photo.map(|f| f.url);
    let uploaded: Vec<String> = new_url.iter().cloned().collect();

    let replaced = member.apply(patch, new_url, admin.id);
    let saved = persist_or_discard(
        state.repo.update_team_member(&member),
        state.storage.as_ref(),
        &uploaded,
        "Team member",
    )
    .await?;

    if let Some(old_url) = replaced {
        discard(state.storage.as_ref(), &old_url).await;
    }

    tracing::info!(member_id = %id, admin_id = %admin.id, "team member updated");
    Ok(ApiResponse::ok("Team member updated successfully", saved))
}
