mod common;

use common::{event_form, png, read_json, spawn_app, spawn_app_with};
use org_cms::{
    AppConfig, AppError, MockStorageService,
    handlers::{FilePart, persist_or_discard, upload_images},
    repository::{RepoError, Repository},
    storage::{MOCK_BASE_URL, key_from_url, upload_file},
};
use reqwest::{StatusCode, multipart::Part};

// --- Upload Failures Through the API ---

#[tokio::test]
async fn test_storage_outage_returns_500_and_stores_nothing() {
    let app = spawn_app_with(MockStorageService::new_failing(), AppConfig::default()).await;

    let form = event_form("Outage Day").part("images", png("down.png"));
    let response = app.admin_post_form("/api/v1/event/create", form).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Internal server error");
    assert_eq!(app.repo.get_stats().await.unwrap().events, 0);
}

#[tokio::test]
async fn test_oversized_file_is_rejected() {
    let config = AppConfig {
        max_upload_bytes: 1024,
        ..AppConfig::default()
    };
    let app = spawn_app_with(MockStorageService::new(), config).await;

    let big = Part::bytes(vec![0u8; 2048])
        .file_name("huge.png")
        .mime_str("image/png")
        .unwrap();
    let form = event_form("Big Picture").part("images", big);
    let response = app.admin_post_form("/api/v1/event/create", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json(response).await;
    assert_eq!(body["errors"]["images"][0], "file exceeds the 1024 byte limit");
    assert_eq!(app.storage.object_count(), 0);
}

#[tokio::test]
async fn test_unsupported_image_type_is_rejected() {
    let app = spawn_app().await;

    let text = Part::bytes(b"hello".to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let form = event_form("Wrong Type")
        .part("images", png("ok.png"))
        .part("images", text);
    let response = app.admin_post_form("/api/v1/event/create", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json(response).await;
    assert_eq!(
        body["errors"]["images"][0],
        "notes.txt: unsupported file type text/plain"
    );
    // Validation runs before any upload.
    assert_eq!(app.storage.object_count(), 0);
}

#[tokio::test]
async fn test_blank_file_input_is_ignored() {
    let app = spawn_app().await;

    let empty = Part::bytes(Vec::new()).file_name("");
    let form = event_form("No Pictures").part("images", empty);
    let response = app.admin_post_form("/api/v1/event/create", form).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert!(body["data"]["images"].as_array().unwrap().is_empty());
}

// --- Upload Helpers ---

fn file(name: &str) -> FilePart {
    FilePart {
        file_name: name.to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![1, 2, 3],
    }
}

#[tokio::test]
async fn test_upload_images_builds_metadata() {
    let storage = MockStorageService::new();

    let images = upload_images(&storage, "galleries", vec![file("a.png"), file("b.png")])
        .await
        .unwrap();

    assert_eq!(images.len(), 2);
    assert_eq!(images[0].file_name, "a.png");
    assert_eq!(images[0].content_type, "image/png");
    assert_eq!(images[0].size, 3);
    assert_ne!(images[0].id, images[1].id);
    assert_eq!(storage.object_count(), 2);
}

#[tokio::test]
async fn test_persist_or_discard_cleans_up_on_missing_row() {
    let storage = MockStorageService::new();
    let url = upload_file(&storage, "events", "a.png", vec![1], "image/png")
        .await
        .unwrap();

    let result: Result<(), AppError> = persist_or_discard(
        async { Ok(None) },
        &storage,
        std::slice::from_ref(&url),
        "Event",
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound("Event"))));
    assert_eq!(storage.object_count(), 0);
}

#[tokio::test]
async fn test_persist_or_discard_cleans_up_on_database_error() {
    let storage = MockStorageService::new();
    let url = upload_file(&storage, "news", "a.png", vec![1], "image/png")
        .await
        .unwrap();

    let result: Result<(), AppError> = persist_or_discard(
        async { Err(RepoError::Database(sqlx::Error::PoolTimedOut)) },
        &storage,
        std::slice::from_ref(&url),
        "News",
    )
    .await;

    assert!(matches!(result, Err(AppError::Database(_))));
    let key = key_from_url(MOCK_BASE_URL, &url).unwrap();
    assert!(!storage.contains(&key));
}

#[tokio::test]
async fn test_persist_or_discard_keeps_uploads_on_success() {
    let storage = MockStorageService::new();
    let url = upload_file(&storage, "team", "a.png", vec![1], "image/png")
        .await
        .unwrap();

    let saved = persist_or_discard(async { Ok(Some(7)) }, &storage, &[url], "Team member")
        .await
        .unwrap();

    assert_eq!(saved, 7);
    assert_eq!(storage.object_count(), 1);
}
