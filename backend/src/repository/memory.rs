use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Removal, RepoError, RepoResult, Repository};
use crate::models::{
    AdminDashboardStats, Event, Gallery, ImageMeta, ImportantDocument, ListQuery, News, Page,
    TeamMember, Trl, User, VideoLink, normalize_email,
};

/// Row-level accessors the in-memory tables need for filtering and ordering.
trait Record: Clone {
    fn id(&self) -> Uuid;
    fn is_active(&self) -> bool;
    fn created_at(&self) -> DateTime<Utc>;
    /// The text columns `search` is matched against.
    fn search_text(&self) -> Vec<&str>;

    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.created_at().cmp(&a.created_at())
    }
}

macro_rules! record {
    ($ty:ty, [$($field:ident),+], [$($opt:ident),*]) => {
        impl Record for $ty {
            fn id(&self) -> Uuid {
                self.id
            }
            fn is_active(&self) -> bool {
                self.is_active
            }
            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
            fn search_text(&self) -> Vec<&str> {
                #[allow(unused_mut)]
                let mut text = vec![$(self.$field.as_str()),+];
                $(
                    if let Some(value) = self.$opt.as_deref() {
                        text.push(value);
                    }
                )*
                text
            }
        }
    };
}

record!(User, [name, email], []);
record!(Event, [title, description, venue], []);
record!(News, [title, content], [summary]);
record!(Gallery, [title], [description, category]);
record!(Trl, [title, description], [sector]);
record!(ImportantDocument, [title], [description, category]);

impl Record for TeamMember {
    fn id(&self) -> Uuid {
        self.id
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.name.as_str(), self.designation.as_str()];
        if let Some(department) = self.department.as_deref() {
            text.push(department);
        }
        text
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| b.created_at.cmp(&a.created_at))
    }
}

/// A single in-memory table.
struct Table<T> {
    rows: RwLock<Vec<T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Record + Send + Sync> Table<T> {
    async fn insert(&self, row: &T) -> T {
        self.rows.write().await.push(row.clone());
        row.clone()
    }

    async fn get(&self, id: Uuid) -> Option<T> {
        self.rows.read().await.iter().find(|r| r.id() == id).cloned()
    }

    async fn replace(&self, row: &T) -> Option<T> {
        let mut rows = self.rows.write().await;
        let slot = rows.iter_mut().find(|r| r.id() == row.id())?;
        *slot = row.clone();
        Some(row.clone())
    }

    async fn count(&self) -> i64 {
        self.rows.read().await.len() as i64
    }

    /// Same filter and ordering semantics as the Postgres list query.
    async fn page(&self, query: &ListQuery) -> Page<T> {
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let rows = self.rows.read().await;

        let mut matches: Vec<T> = rows
            .iter()
            .filter(|r| query.is_active.is_none_or(|active| r.is_active() == active))
            .filter(|r| match &needle {
                Some(needle) => r
                    .search_text()
                    .iter()
                    .any(|text| text.to_lowercase().contains(needle.as_str())),
                None => true,
            })
            .cloned()
            .collect();
        matches.sort_by(T::ordering);

        let total = matches.len() as i64;
        let items = matches
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();

        Page { items, total }
    }
}

/// MemoryRepository
///
/// A `Repository` kept entirely in process memory. Used by the test suite so the HTTP
/// layer can be exercised without a database, and mirrors the Postgres semantics for
/// filtering, ordering and the unique email constraint.
#[derive(Default)]
pub struct MemoryRepository {
    users: Table<User>,
    events: Table<Event>,
    news: Table<News>,
    galleries: Table<Gallery>,
    team_members: Table<TeamMember>,
    trls: Table<Trl>,
    documents: Table<ImportantDocument>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.users.get(id).await)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = normalize_email(email);
        let users = self.users.rows.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> RepoResult<User> {
        let mut users = self.users.rows.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        users.push(user.clone());
        Ok(user.clone())
    }

    async fn list_users(&self, query: &ListQuery) -> RepoResult<Page<User>> {
        Ok(self.users.page(query).await)
    }

    async fn update_user(&self, user: &User) -> RepoResult<Option<User>> {
        Ok(self.users.replace(user).await)
    }

    async fn record_login(&self, id: Uuid) -> RepoResult<()> {
        let mut users = self.users.rows.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn insert_event(&self, event: &Event) -> RepoResult<Event> {
        Ok(self.events.insert(event).await)
    }

    async fn list_events(&self, query: &ListQuery) -> RepoResult<Page<Event>> {
        Ok(self.events.page(query).await)
    }

    async fn get_event(&self, id: Uuid) -> RepoResult<Option<Event>> {
        Ok(self.events.get(id).await)
    }

    async fn update_event(
        &self,
        event: &Event,
        new_images: &[ImageMeta],
    ) -> RepoResult<Option<Event>> {
        let mut rows = self.events.rows.write().await;
        let Some(slot) = rows.iter_mut().find(|r| r.id == event.id) else {
            return Ok(None);
        };

        let mut images = std::mem::take(&mut slot.images);
        images.extend_from_slice(new_images);
        *slot = Event {
            images,
            ..event.clone()
        };
        Ok(Some(slot.clone()))
    }

    async fn remove_event_image(
        &self,
        id: Uuid,
        image_id: Uuid,
        editor: Uuid,
    ) -> RepoResult<Removal<Event, ImageMeta>> {
        let mut rows = self.events.rows.write().await;
        let Some(event) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(Removal::RowMissing);
        };

        Ok(match event.remove_image(image_id, editor) {
            Some(item) => Removal::Removed {
                row: event.clone(),
                item,
            },
            None => Removal::ItemMissing,
        })
    }

    async fn insert_news(&self, news: &News) -> RepoResult<News> {
        Ok(self.news.insert(news).await)
    }

    async fn list_news(&self, query: &ListQuery) -> RepoResult<Page<News>> {
        Ok(self.news.page(query).await)
    }

    async fn get_news(&self, id: Uuid) -> RepoResult<Option<News>> {
        Ok(self.news.get(id).await)
    }

    async fn update_news(&self, news: &News) -> RepoResult<Option<News>> {
        Ok(self.news.replace(news).await)
    }

    async fn insert_gallery(&self, gallery: &Gallery) -> RepoResult<Gallery> {
        Ok(self.galleries.insert(gallery).await)
    }

    async fn list_galleries(&self, query: &ListQuery) -> RepoResult<Page<Gallery>> {
        Ok(self.galleries.page(query).await)
    }

    async fn get_gallery(&self, id: Uuid) -> RepoResult<Option<Gallery>> {
        Ok(self.galleries.get(id).await)
    }

    async fn update_gallery(
        &self,
        gallery: &Gallery,
        new_images: &[ImageMeta],
        new_videos: &[VideoLink],
    ) -> RepoResult<Option<Gallery>> {
        let mut rows = self.galleries.rows.write().await;
        let Some(slot) = rows.iter_mut().find(|r| r.id == gallery.id) else {
            return Ok(None);
        };

        let mut images = std::mem::take(&mut slot.images);
        images.extend_from_slice(new_images);
        let mut videos = std::mem::take(&mut slot.videos);
        videos.extend_from_slice(new_videos);
        *slot = Gallery {
            images,
            videos,
            ..gallery.clone()
        };
        Ok(Some(slot.clone()))
    }

    async fn remove_gallery_image(
        &self,
        id: Uuid,
        image_id: Uuid,
        editor: Uuid,
    ) -> RepoResult<Removal<Gallery, ImageMeta>> {
        let mut rows = self.galleries.rows.write().await;
        let Some(gallery) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(Removal::RowMissing);
        };

        Ok(match gallery.remove_image(image_id, editor) {
            Some(item) => Removal::Removed {
                row: gallery.clone(),
                item,
            },
            None => Removal::ItemMissing,
        })
    }

    async fn remove_gallery_video(
        &self,
        id: Uuid,
        video_id: Uuid,
        editor: Uuid,
    ) -> RepoResult<Removal<Gallery, VideoLink>> {
        let mut rows = self.galleries.rows.write().await;
        let Some(gallery) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(Removal::RowMissing);
        };

        Ok(match gallery.remove_video(video_id, editor) {
            Some(item) => Removal::Removed {
                row: gallery.clone(),
                item,
            },
            None => Removal::ItemMissing,
        })
    }

    async fn insert_team_member(&self, member: &TeamMember) -> RepoResult<TeamMember> {
        Ok(self.team_members.insert(member).await)
    }

    async fn list_team_members(&self, query: &ListQuery) -> RepoResult<Page<TeamMember>> {
        Ok(self.team_members.page(query).await)
    }

    async fn get_team_member(&self, id: Uuid) -> RepoResult<Option<TeamMember>> {
        Ok(self.team_members.get(id).await)
    }

    async fn update_team_member(&self, member: &TeamMember) -> RepoResult<Option<TeamMember>> {
        Ok(self.team_members.replace(member).await)
    }

    async fn insert_trl(&self, trl: &Trl) -> RepoResult<Trl> {
        Ok(self.trls.insert(trl).await)
    }

    async fn list_trls(&self, query: &ListQuery) -> RepoResult<Page<Trl>> {
        Ok(self.trls.page(query).await)
    }

    async fn get_trl(&self, id: Uuid) -> RepoResult<Option<Trl>> {
        Ok(self.trls.get(id).await)
    }

    async fn update_trl(&self, trl: &Trl) -> RepoResult<Option<Trl>> {
        Ok(self.trls.replace(trl).await)
    }

    async fn insert_document(&self, doc: &ImportantDocument) -> RepoResult<ImportantDocument> {
        Ok(self.documents.insert(doc).await)
    }

    async fn list_documents(&self, query: &ListQuery) -> RepoResult<Page<ImportantDocument>> {
        Ok(self.documents.page(query).await)
    }

    async fn get_document(&self, id: Uuid) -> RepoResult<Option<ImportantDocument>> {
        Ok(self.documents.get(id).await)
    }

    async fn update_document(
        &self,
        doc: &ImportantDocument,
    ) -> RepoResult<Option<ImportantDocument>> {
        Ok(self.documents.replace(doc).await)
    }

    async fn get_stats(&self) -> RepoResult<AdminDashboardStats> {
        Ok(AdminDashboardStats {
            events: self.events.count().await,
            news: self.news.count().await,
            galleries: self.galleries.count().await,
            team_members: self.team_members.count().await,
            trls: self.trls.count().await,
            documents: self.documents.count().await,
            users: self.users.count().await,
        })
    }
}
