use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes for any signed-in account, admin or not. The `AuthUser` gate is layered on
/// this router in `create_router`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /api/v1/user/me
        // The profile behind the current session cookie or bearer token.
        .route("/api/v1/user/me", get(handlers::user::get_me))
}
