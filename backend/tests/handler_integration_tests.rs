use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use org_cms::{
    AppError, AppState,
    auth::{AdminUser, AuthUser},
    config::AppConfig,
    handlers::{self, ApiPath},
    models::{
        CreateEventRequest, CreateUserRequest, Event, ImageMeta, ListParams, Role,
        UpdateUserRequest, User,
    },
    repository::{MemoryRepository, Repository},
    storage::{MOCK_BASE_URL, MockStorageService, key_from_url, upload_file},
};
use std::sync::Arc;
use uuid::Uuid;

// --- Test Fixtures ---

struct Fixture {
    state: AppState,
    repo: Arc<MemoryRepository>,
    storage: MockStorageService,
    admin: User,
}

async fn fixture() -> Fixture {
    let repo = Arc::new(MemoryRepository::new());
    let storage = MockStorageService::new();

    let admin = User::new(
        CreateUserRequest {
            name: Some("Handler Admin".to_string()),
            email: Some("handler-admin@example.org".to_string()),
            password: Some("unused-password".to_string()),
            role: Some(Role::Admin),
            is_active: Some(true),
        },
        "hash".to_string(),
    );
    repo.insert_user(&admin).await.unwrap();

    let state = AppState {
        repo: repo.clone(),
        storage: Arc::new(storage.clone()),
        config: AppConfig::default(),
    };

    Fixture {
        state,
        repo,
        storage,
        admin,
    }
}

fn as_admin(user: &User) -> AdminUser {
    AdminUser(AuthUser::from(user))
}

fn sample_event(images: Vec<ImageMeta>, author: Uuid) -> Event {
    Event::new(
        CreateEventRequest {
            title: Some("Handler Event".to_string()),
            description: Some("Inserted straight into the store.".to_string()),
            venue: Some("Room 101".to_string()),
            event_date: NaiveDate::from_ymd_opt(2026, 9, 9),
            ..CreateEventRequest::default()
        },
        images,
        author,
    )
}

// --- Handler Tests ---

#[tokio::test]
async fn test_get_event_success() {
    let fx = fixture().await;
    let event = fx
        .repo
        .insert_event(&sample_event(vec![], fx.admin.id))
        .await
        .unwrap();

    let response = handlers::event::get_event(State(fx.state), ApiPath(event.id))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.message, "Event fetched successfully");
    assert_eq!(response.data.id, event.id);
}

#[tokio::test]
async fn test_get_event_not_found() {
    let fx = fixture().await;

    let result = handlers::event::get_event(State(fx.state), ApiPath(Uuid::new_v4())).await;

    let err = result.unwrap_err();
    assert!(matches!(err, AppError::NotFound("Event")));
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_events_clamps_params() {
    let fx = fixture().await;
    for _ in 0..3 {
        fx.repo
            .insert_event(&sample_event(vec![], fx.admin.id))
            .await
            .unwrap();
    }

    let params = ListParams {
        page: Some(-4),
        limit: Some(500),
        ..ListParams::default()
    };
    let response = handlers::event::list_events(State(fx.state), Ok(Query(params)))
        .await
        .unwrap();

    assert_eq!(response.data.current_page, 1);
    assert_eq!(response.data.limit, 100);
    assert_eq!(response.data.total_records, 3);
    assert_eq!(response.data.per_page, 3);
}

#[tokio::test]
async fn test_delete_event_image_removes_stored_object() {
    let fx = fixture().await;
    let url = upload_file(&fx.storage, "events", "pic.png", vec![1], "image/png")
        .await
        .unwrap();
    let image = ImageMeta::new(url.clone(), "pic.png".into(), "image/png".into(), 1);
    let event = fx
        .repo
        .insert_event(&sample_event(vec![image.clone()], fx.admin.id))
        .await
        .unwrap();

    let response = handlers::event::delete_event_image(
        as_admin(&fx.admin),
        State(fx.state),
        ApiPath((event.id, image.id)),
    )
    .await
    .unwrap();

    assert!(response.data.images.is_empty());
    let key = key_from_url(MOCK_BASE_URL, &url).unwrap();
    assert!(!fx.storage.contains(&key));
}

#[tokio::test]
async fn test_delete_event_image_unknown_image() {
    let fx = fixture().await;
    let event = fx
        .repo
        .insert_event(&sample_event(vec![], fx.admin.id))
        .await
        .unwrap();

    let result = handlers::event::delete_event_image(
        as_admin(&fx.admin),
        State(fx.state),
        ApiPath((event.id, Uuid::new_v4())),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound("Image"))));
}

#[tokio::test]
async fn test_delete_event_image_tolerates_foreign_url() {
    // Records imported from elsewhere may point outside our bucket; the entry is still
    // removed and nothing is deleted.
    let fx = fixture().await;
    let image = ImageMeta::new(
        "https://legacy.example.org/img.png".into(),
        "img.png".into(),
        "image/png".into(),
        1,
    );
    let event = fx
        .repo
        .insert_event(&sample_event(vec![image.clone()], fx.admin.id))
        .await
        .unwrap();

    let response = handlers::event::delete_event_image(
        as_admin(&fx.admin),
        State(fx.state),
        ApiPath((event.id, image.id)),
    )
    .await
    .unwrap();

    assert!(response.data.images.is_empty());
    assert_eq!(response.data.updated_by, Some(fx.admin.id));
}

#[tokio::test]
async fn test_create_user_conflict() {
    let fx = fixture().await;

    let request = CreateUserRequest {
        name: Some("Duplicate".to_string()),
        email: Some("HANDLER-ADMIN@example.org".to_string()),
        password: Some("long-enough-password".to_string()),
        role: None,
        is_active: None,
    };
    let result =
        handlers::user::create_user(as_admin(&fx.admin), State(fx.state), Ok(Json(request))).await;

    let err = result.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(err.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_user_blocks_self_demotion() {
    let fx = fixture().await;

    let patch = UpdateUserRequest {
        role: Some(Role::User),
        ..UpdateUserRequest::default()
    };
    let result = handlers::user::update_user(
        as_admin(&fx.admin),
        State(fx.state),
        ApiPath(fx.admin.id),
        Ok(Json(patch)),
    )
    .await;

    match result {
        Err(AppError::Validation(errors)) => assert!(errors.contains_key("role")),
        other => panic!("expected validation error, got {:?}", other.map(|r| r.data.id)),
    }
}

#[tokio::test]
async fn test_update_user_rehashes_password() {
    let fx = fixture().await;
    let other = User::new(
        CreateUserRequest {
            name: Some("Other".to_string()),
            email: Some("other@example.org".to_string()),
            password: Some("unused-password".to_string()),
            role: None,
            is_active: None,
        },
        "old-hash".to_string(),
    );
    fx.repo.insert_user(&other).await.unwrap();

    let patch = UpdateUserRequest {
        password: Some("brand-new-password".to_string()),
        ..UpdateUserRequest::default()
    };
    handlers::user::update_user(
        as_admin(&fx.admin),
        State(fx.state),
        ApiPath(other.id),
        Ok(Json(patch)),
    )
    .await
    .unwrap();

    let stored = fx.repo.get_user(other.id).await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "old-hash");
    assert!(org_cms::auth::verify_password(
        "brand-new-password",
        &stored.password_hash
    ));
}

#[tokio::test]
async fn test_get_admin_stats() {
    let fx = fixture().await;
    fx.repo
        .insert_event(&sample_event(vec![], fx.admin.id))
        .await
        .unwrap();

    let response = handlers::stats::get_admin_stats(State(fx.state)).await.unwrap();

    assert_eq!(response.data.events, 1);
    assert_eq!(response.data.users, 1);
    assert_eq!(response.data.galleries, 0);
}
