use crate::{
    AppState,
    handlers::{document, event, gallery, news, stats, team, trl, user},
};
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

/// Admin Router Module
///
/// Every content write, user management and the dashboard. The whole router sits
/// behind the `AdminUser` gate in `create_router`; handlers still take `AdminUser` to
/// record who made the change.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- Events ---
        .route("/api/v1/event/create", post(event::create_event))
        .route("/api/v1/event/update/{id}", patch(event::update_event))
        .route(
            "/api/v1/event/{id}/images/{image_id}",
            delete(event::delete_event_image),
        )
        // --- News ---
        .route("/api/v1/news/create", post(news::create_news))
        .route("/api/v1/news/update/{id}", patch(news::update_news))
        // --- Galleries ---
        .route("/api/v1/gallery/create", post(gallery::create_gallery))
        .route("/api/v1/gallery/update/{id}", patch(gallery::update_gallery))
        .route(
            "/api/v1/gallery/{id}/images/{image_id}",
            delete(gallery::delete_gallery_image),
        )
        .route(
            "/api/v1/gallery/{id}/videos/{video_id}",
            delete(gallery::delete_gallery_video),
        )
        // --- Team ---
        .route("/api/v1/team/create", post(team::create_team_member))
        .route("/api/v1/team/update/{id}", patch(team::update_team_member))
        // --- TRL listings ---
        .route("/api/v1/trl/create", post(trl::create_trl))
        .route("/api/v1/trl/update/{id}", patch(trl::update_trl))
        // --- Important documents ---
        .route("/api/v1/document/create", post(document::create_document))
        .route("/api/v1/document/update/{id}", patch(document::update_document))
        // --- User management ---
        .route("/api/v1/user/create", post(user::create_user))
        .route("/api/v1/user/list", get(user::list_users))
        .route("/api/v1/user/update/{id}", patch(user::update_user))
        .route("/api/v1/user/{id}", get(user::get_user))
        // --- Dashboard ---
        .route("/api/v1/admin/stats", get(stats::get_admin_stats))
}
