use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef, Request},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod response;
pub mod storage;

// Routing segregated by access level (Public, Authenticated, Admin).
pub mod routes;
use auth::{AdminUser, AuthUser};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::{AppConfig, Env};
pub use error::{AppError, AppResult};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// Upper bound on files in one multipart request; with the per-file cap it sizes the
/// request body limit.
pub const MAX_FILES_PER_REQUEST: usize = 10;

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::event::create_event, handlers::event::list_events, handlers::event::get_event,
        handlers::event::update_event, handlers::event::delete_event_image,
        handlers::news::create_news, handlers::news::list_news, handlers::news::get_news,
        handlers::news::update_news,
        handlers::gallery::create_gallery, handlers::gallery::list_galleries,
        handlers::gallery::get_gallery, handlers::gallery::update_gallery,
        handlers::gallery::delete_gallery_image, handlers::gallery::delete_gallery_video,
        handlers::team::create_team_member, handlers::team::list_team_members,
        handlers::team::get_team_member, handlers::team::update_team_member,
        handlers::trl::create_trl, handlers::trl::list_trls, handlers::trl::get_trl,
        handlers::trl::update_trl,
        handlers::document::create_document, handlers::document::list_documents,
        handlers::document::get_document, handlers::document::update_document,
        handlers::user::login, handlers::user::logout, handlers::user::get_me,
        handlers::user::create_user, handlers::user::list_users, handlers::user::get_user,
        handlers::user::update_user,
        handlers::stats::get_admin_stats,
    ),
    components(
        schemas(
            models::Event, models::News, models::Gallery, models::TeamMember, models::Trl,
            models::ImportantDocument, models::ImageMeta, models::VideoLink, models::User,
            models::Role, models::UserProfile, models::CreateUserRequest,
            models::UpdateUserRequest, models::LoginRequest, models::LoginResponse,
            models::AdminDashboardStats,
        )
    ),
    tags(
        (name = "org-cms", description = "Organization website CMS API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of application services. Cloned per request; every
/// field is an `Arc` or a small config value.
#[derive(Clone)]
pub struct AppState {
    /// Persistence (Postgres in production, in-memory in tests).
    pub repo: RepositoryState,
    /// Object storage for uploaded files.
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors such as `AuthUser` pull single components out of `AppState`.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for `authenticated_routes`. Extracting `AuthUser` runs the full token check; a
/// failure rejects the request with the 401 envelope before the handler is reached.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Gate for `admin_routes`: authenticated (401 otherwise) and `role = admin` (403).
async fn admin_middleware(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, applies the access gates and the observability layers,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(MAX_FILES_PER_REQUEST);

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .merge(admin::admin_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        )))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Generate an x-request-id for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Wrap the request lifecycle in a span carrying that id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Echo the id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id))
                // 3d. A panicking handler becomes the generic 500 envelope.
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the `x-request-id`, so every log
/// line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}

fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(error::internal_error_body()),
    )
        .into_response()
}
