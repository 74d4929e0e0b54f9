use axum::extract::State;

use crate::{AppState, error::AppResult, models::AdminDashboardStats, response::ApiResponse};

/// get_admin_stats
///
/// [Admin Route] Record counts for the dashboard cards.
#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    tag = "admin",
    responses(
        (status = 200, description = "Dashboard counters", body = AdminDashboardStats),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_admin_stats(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<AdminDashboardStats>> {
    let stats = state.repo.get_stats().await?;
    Ok(ApiResponse::ok("Stats fetched successfully", stats))
}
