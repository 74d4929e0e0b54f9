#![allow(dead_code)]

use std::sync::Arc;

use org_cms::{
    AppConfig, AppState, MemoryRepository, MockStorageService, create_router,
    auth::{hash_password, issue_token},
    models::{CreateUserRequest, Role, User},
    repository::{Repository, RepositoryState},
    storage::{MOCK_BASE_URL, StorageState, key_from_url},
};
use reqwest::multipart::{Form, Part};
use tokio::net::TcpListener;

pub const PASSWORD: &str = "correct-horse-battery";

/// A running server backed by the in-memory repository and mock storage. Both are
/// shared with the test so state can be seeded and inspected directly.
pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepository>,
    pub storage: MockStorageService,
    pub config: AppConfig,
    pub client: reqwest::Client,
    pub admin: User,
    pub admin_token: String,
    pub user: User,
    pub user_token: String,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(MockStorageService::new(), AppConfig::default()).await
}

pub async fn spawn_app_with(storage: MockStorageService, config: AppConfig) -> TestApp {
    let repo = Arc::new(MemoryRepository::new());

    let hash = hash_password(PASSWORD).expect("hashing failed");
    let admin = seed_user(&repo, "Site Admin", "admin@example.org", Role::Admin, &hash).await;
    let user = seed_user(&repo, "Regular User", "user@example.org", Role::User, &hash).await;

    let admin_token = issue_token(&admin, &config.jwt_secret, 1).expect("token");
    let user_token = issue_token(&user, &config.jwt_secret, 1).expect("token");

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        storage: Arc::new(storage.clone()) as StorageState,
        config: config.clone(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        storage,
        config,
        client: reqwest::Client::new(),
        admin,
        admin_token,
        user,
        user_token,
    }
}

pub async fn seed_user(
    repo: &MemoryRepository,
    name: &str,
    email: &str,
    role: Role,
    hash: &str,
) -> User {
    let request = CreateUserRequest {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        password: Some(PASSWORD.to_string()),
        role: Some(role),
        is_active: Some(true),
    };
    repo.insert_user(&User::new(request, hash.to_string()))
        .await
        .expect("seed user")
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Sends `form` as the admin, using the `admin_token` cookie like the console does.
    pub async fn admin_multipart(
        &self,
        method: reqwest::Method,
        path: &str,
        form: Form,
    ) -> reqwest::Response {
        self.client
            .request(method, self.url(path))
            .header("Cookie", format!("admin_token={}", self.admin_token))
            .multipart(form)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn admin_post_form(&self, path: &str, form: Form) -> reqwest::Response {
        self.admin_multipart(reqwest::Method::POST, path, form).await
    }

    pub async fn admin_patch_form(&self, path: &str, form: Form) -> reqwest::Response {
        self.admin_multipart(reqwest::Method::PATCH, path, form).await
    }

    pub async fn admin_delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(&self.admin_token)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    /// Whether the object behind a public URL is still in the mock bucket.
    pub fn stored(&self, url: &str) -> bool {
        key_from_url(MOCK_BASE_URL, url).is_some_and(|key| self.storage.contains(&key))
    }
}

pub fn png(name: &str) -> Part {
    Part::bytes(vec![0x89, b'P', b'N', b'G', 1, 2, 3, 4])
        .file_name(name.to_string())
        .mime_str("image/png")
        .unwrap()
}

pub fn pdf(name: &str) -> Part {
    Part::bytes(b"%PDF-1.7 test document".to_vec())
        .file_name(name.to_string())
        .mime_str("application/pdf")
        .unwrap()
}

pub fn event_form(title: &str) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("description", "A full day of talks and workshops.")
        .text("venue", "Main Auditorium")
        .text("eventDate", "2026-11-20")
}

pub async fn read_json(response: reqwest::Response) -> serde_json::Value {
    response.json().await.expect("body is not JSON")
}
