use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// StorageError
///
/// Failures of the object-storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The URL does not live under this storage's public prefix, so it was never
    /// uploaded by us and must not be deleted.
    #[error("URL is outside the managed storage prefix: {0}")]
    ForeignUrl(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

// 1. StorageService Contract
/// StorageService
///
/// Abstract contract for the object storage layer. Handlers only ever see
/// `Arc<dyn StorageService>`, so the real S3 client (`S3StorageClient`) and the in-memory
/// double (`MockStorageService`) are interchangeable.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in `Env::Local` to provision MinIO.
    async fn ensure_bucket_exists(&self);

    /// Writes `body` under `key`.
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Removes the object stored under `key`. Deleting a missing key is not an error.
    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;

    /// Prefix under which objects are publicly reachable, without a trailing slash.
    fn public_base_url(&self) -> &str;
}

/// StorageState
///
/// The concrete type used to share storage access across the application state.
pub type StorageState = Arc<dyn StorageService>;

// 2. Upload / Delete Helpers

/// upload_file
///
/// Stores a buffer under `"{namespace}/{uuid}-{file name}"` and returns its public URL.
/// The namespace keeps each entity's uploads in their own folder.
pub async fn upload_file(
    storage: &dyn StorageService,
    namespace: &str,
    file_name: &str,
    body: Vec<u8>,
    content_type: &str,
) -> Result<String, StorageError> {
    let key = object_key(namespace, file_name);
    storage.put_object(&key, body, content_type).await?;
    Ok(public_url(storage.public_base_url(), &key))
}

/// delete_file
///
/// Reverses [`upload_file`] given the URL it returned. URLs outside the managed prefix
/// are rejected with [`StorageError::ForeignUrl`].
pub async fn delete_file(storage: &dyn StorageService, url: &str) -> Result<(), StorageError> {
    let key = key_from_url(storage.public_base_url(), url)
        .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
    storage.delete_object(&key).await
}

/// Builds a collision-free object key for an uploaded file.
pub fn object_key(namespace: &str, file_name: &str) -> String {
    format!(
        "{}/{}-{}",
        sanitize_key(namespace),
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

pub fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

/// Recovers the object key from a public URL, or `None` when the URL is not ours.
pub fn key_from_url(base: &str, url: &str) -> Option<String> {
    let prefix = format!("{}/", base.trim_end_matches('/'));
    let key = url.strip_prefix(&prefix)?;
    let sanitized = sanitize_key(key);
    if sanitized.is_empty() || sanitized != key {
        return None;
    }
    Some(sanitized)
}

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`) and empty segments from a key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Reduces a client-supplied file name to its final path component, restricted to
/// ASCII alphanumerics, `.`, `-` and `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

// 3. The Real Implementation (S3/MinIO)
/// S3StorageClient
///
/// AWS SDK client for any S3-compatible endpoint. `force_path_style(true)` is required
/// for MinIO.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_base_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// CreateBucket is idempotent for the owner, so this is safe to call at every startup.
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(bucket = %self.bucket_name, error = ?e, "create_bucket skipped");
        }
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("put_object {key}: {e}")))?;

        tracing::debug!(key, "object stored");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("delete_object {key}: {e}")))?;

        tracing::debug!(key, "object deleted");
        Ok(())
    }

    fn public_base_url(&self) -> &str {
        &self.public_base_url
    }
}

// 4. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory `StorageService` for tests. Stored objects are kept so assertions can check
/// what was written and what was deleted.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
}

#[derive(Clone, Debug)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

pub const MOCK_BASE_URL: &str = "http://localhost:9000/mock-bucket";

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().ok()?.get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    fn fail_if_requested(&self) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Backend(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.fail_if_requested()?;
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.fail_if_requested()?;
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        objects.remove(key);
        Ok(())
    }

    fn public_base_url(&self) -> &str {
        MOCK_BASE_URL
    }
}
