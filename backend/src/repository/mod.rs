use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    AdminDashboardStats, Event, Gallery, ImageMeta, ImportantDocument, ListQuery, News, Page,
    TeamMember, Trl, User, VideoLink,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// RepoError
///
/// Persistence failures. Unique-constraint violations are singled out so the API can
/// answer 409 instead of 500.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Outcome of splicing one embedded entry (image or video) out of a row.
#[derive(Debug)]
pub enum Removal<T, I> {
    RowMissing,
    ItemMissing,
    Removed { row: T, item: I },
}

/// Repository Trait
///
/// The contract for all persistence operations. Every content entity exposes the same
/// four calls: insert a fully built record, list a filtered page, fetch by id and write
/// back a merged record. Merging happens in the models, so `update_*` stores the record
/// as given and returns `None` when the id no longer exists.
///
/// Embedded lists are the exception: they are never written back from a stale copy.
/// `update_event`/`update_gallery` store the scalar columns and append the new entries to
/// whatever the row holds at write time, and the `remove_*` calls splice one entry out
/// under a row lock.
///
/// `Send + Sync + async_trait` make `Arc<dyn Repository>` shareable across Axum tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    // Fails with `RepoError::Conflict` when the email is taken.
    async fn insert_user(&self, user: &User) -> RepoResult<User>;
    async fn list_users(&self, query: &ListQuery) -> RepoResult<Page<User>>;
    async fn update_user(&self, user: &User) -> RepoResult<Option<User>>;
    async fn record_login(&self, id: Uuid) -> RepoResult<()>;

    // --- Events ---
    async fn insert_event(&self, event: &Event) -> RepoResult<Event>;
    async fn list_events(&self, query: &ListQuery) -> RepoResult<Page<Event>>;
    async fn get_event(&self, id: Uuid) -> RepoResult<Option<Event>>;
    async fn update_event(
        &self,
        event: &Event,
        new_images: &[ImageMeta],
    ) -> RepoResult<Option<Event>>;
    async fn remove_event_image(
        &self,
        id: Uuid,
        image_id: Uuid,
        editor: Uuid,
    ) -> RepoResult<Removal<Event, ImageMeta>>;

    // --- News ---
    async fn insert_news(&self, news: &News) -> RepoResult<News>;
    async fn list_news(&self, query: &ListQuery) -> RepoResult<Page<News>>;
    async fn get_news(&self, id: Uuid) -> RepoResult<Option<News>>;
    async fn update_news(&self, news: &News) -> RepoResult<Option<News>>;

    // --- Galleries ---
    async fn insert_gallery(&self, gallery: &Gallery) -> RepoResult<Gallery>;
    async fn list_galleries(&self, query: &ListQuery) -> RepoResult<Page<Gallery>>;
    async fn get_gallery(&self, id: Uuid) -> RepoResult<Option<Gallery>>;
    async fn update_gallery(
        &self,
        gallery: &Gallery,
        new_images: &[ImageMeta],
        new_videos: &[VideoLink],
    ) -> RepoResult<Option<Gallery>>;
    async fn remove_gallery_image(
        &self,
        id: Uuid,
        image_id: Uuid,
        editor: Uuid,
    ) -> RepoResult<Removal<Gallery, ImageMeta>>;
    async fn remove_gallery_video(
        &self,
        id: Uuid,
        video_id: Uuid,
        editor: Uuid,
    ) -> RepoResult<Removal<Gallery, VideoLink>>;

    // --- Team ---
    async fn insert_team_member(&self, member: &TeamMember) -> RepoResult<TeamMember>;
    // Ordered by display_order, then newest first.
    async fn list_team_members(&self, query: &ListQuery) -> RepoResult<Page<TeamMember>>;
    async fn get_team_member(&self, id: Uuid) -> RepoResult<Option<TeamMember>>;
    async fn update_team_member(&self, member: &TeamMember) -> RepoResult<Option<TeamMember>>;

    // --- TRL Listings ---
    async fn insert_trl(&self, trl: &Trl) -> RepoResult<Trl>;
    async fn list_trls(&self, query: &ListQuery) -> RepoResult<Page<Trl>>;
    async fn get_trl(&self, id: Uuid) -> RepoResult<Option<Trl>>;
    async fn update_trl(&self, trl: &Trl) -> RepoResult<Option<Trl>>;

    // --- Important Documents ---
    async fn insert_document(&self, doc: &ImportantDocument) -> RepoResult<ImportantDocument>;
    async fn list_documents(&self, query: &ListQuery) -> RepoResult<Page<ImportantDocument>>;
    async fn get_document(&self, id: Uuid) -> RepoResult<Option<ImportantDocument>>;
    async fn update_document(
        &self,
        doc: &ImportantDocument,
    ) -> RepoResult<Option<ImportantDocument>>;

    // --- Dashboard ---
    async fn get_stats(&self) -> RepoResult<AdminDashboardStats>;
}

/// RepositoryState
///
/// The concrete type used to share persistence access across the application state.
pub type RepositoryState = Arc<dyn Repository>;
