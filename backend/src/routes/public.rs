use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Read-only content for the website plus the session endpoints. Nothing here needs a
/// token; inactive records are still returned and the front end filters with `isActive`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // --- Session ---
        .route("/api/v1/user/login", post(handlers::user::login))
        .route("/api/v1/user/logout", post(handlers::user::logout))
        // --- Content listings and details ---
        .route("/api/v1/event/list", get(handlers::event::list_events))
        .route("/api/v1/event/{id}", get(handlers::event::get_event))
        .route("/api/v1/news/list", get(handlers::news::list_news))
        .route("/api/v1/news/{id}", get(handlers::news::get_news))
        .route("/api/v1/gallery/list", get(handlers::gallery::list_galleries))
        .route("/api/v1/gallery/{id}", get(handlers::gallery::get_gallery))
        .route("/api/v1/team/list", get(handlers::team::list_team_members))
        .route("/api/v1/team/{id}", get(handlers::team::get_team_member))
        .route("/api/v1/trl/list", get(handlers::trl::list_trls))
        .route("/api/v1/trl/{id}", get(handlers::trl::get_trl))
        .route("/api/v1/document/list", get(handlers::document::list_documents))
        .route("/api/v1/document/{id}", get(handlers::document::get_document))
}
