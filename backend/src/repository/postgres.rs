use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction, postgres::PgRow, types::Json};
use uuid::Uuid;

use super::{Removal, RepoError, RepoResult, Repository};
use crate::models::{
    AdminDashboardStats, Event, Gallery, ImageMeta, ImportantDocument, ListQuery, News, Page,
    TeamMember, Trl, User, VideoLink,
};

/// Table-specific inputs of the shared list query.
struct ListSpec {
    table: &'static str,
    // Text columns matched case-insensitively by `search`.
    search_columns: &'static [&'static str],
    order_by: &'static str,
}

const USERS: ListSpec = ListSpec {
    table: "users",
    search_columns: &["name", "email"],
    order_by: "created_at DESC",
};

const EVENTS: ListSpec = ListSpec {
    table: "events",
    search_columns: &["title", "description", "venue"],
    order_by: "created_at DESC",
};

const NEWS: ListSpec = ListSpec {
    table: "news",
    search_columns: &["title", "summary", "content"],
    order_by: "created_at DESC",
};

const GALLERIES: ListSpec = ListSpec {
    table: "galleries",
    search_columns: &["title", "description", "category"],
    order_by: "created_at DESC",
};

const TEAM_MEMBERS: ListSpec = ListSpec {
    table: "team_members",
    search_columns: &["name", "designation", "department"],
    order_by: "display_order ASC, created_at DESC",
};

const TRLS: ListSpec = ListSpec {
    table: "trls",
    search_columns: &["title", "description", "sector"],
    order_by: "created_at DESC",
};

const DOCUMENTS: ListSpec = ListSpec {
    table: "important_documents",
    search_columns: &["title", "description", "category"],
    order_by: "created_at DESC",
};

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. Embedded lists (event and
/// gallery images, gallery videos) are JSONB columns.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// fetch_page
    ///
    /// Builds the filter once per statement with `QueryBuilder` (all user input is bound,
    /// never interpolated) and runs the page query and the count query concurrently.
    async fn fetch_page<T>(&self, spec: &ListSpec, query: &ListQuery) -> RepoResult<Page<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut items_query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT * FROM {}", spec.table));
        push_filters(&mut items_query, spec, query);
        items_query
            .push(format!(" ORDER BY {} LIMIT ", spec.order_by))
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset());

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", spec.table));
        push_filters(&mut count_query, spec, query);

        let (items, total) = tokio::try_join!(
            items_query.build_query_as::<T>().fetch_all(&self.pool),
            count_query.build_query_scalar::<i64>().fetch_one(&self.pool),
        )?;

        Ok(Page { items, total })
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, spec: &ListSpec, query: &ListQuery) {
    builder.push(" WHERE TRUE");

    if let Some(active) = query.is_active {
        builder.push(" AND is_active = ").push_bind(active);
    }

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", escape_like(search));
        builder.push(" AND (");
        for (i, column) in spec.search_columns.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder
                .push(*column)
                .push(" ILIKE ")
                .push_bind(pattern.clone());
        }
        builder.push(")");
    }
}

/// Escapes LIKE wildcards so the search term is matched literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

async fn lock_gallery(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Gallery>, sqlx::Error> {
    sqlx::query_as::<_, Gallery>("SELECT * FROM galleries WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
}

async fn write_gallery_lists(
    tx: &mut Transaction<'_, Postgres>,
    gallery: &Gallery,
) -> Result<Gallery, sqlx::Error> {
    sqlx::query_as::<_, Gallery>(
        r#"
        UPDATE galleries
        SET images = $2, videos = $3, updated_by = $4, updated_at = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(gallery.id)
    .bind(Json(&gallery.images))
    .bind(Json(&gallery.videos))
    .bind(gallery.updated_by)
    .bind(gallery.updated_at)
    .fetch_one(&mut **tx)
    .await
}

/// Maps unique-constraint violations (SQLSTATE 23505) to `RepoError::Conflict`.
fn conflict_on_unique(err: sqlx::Error, message: &str) -> RepoError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return RepoError::Conflict(message.to_string());
        }
    }
    RepoError::Database(err)
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> RepoResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, is_active, last_login_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.is_active)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "A user with this email already exists"))
    }

    async fn list_users(&self, query: &ListQuery) -> RepoResult<Page<User>> {
        self.fetch_page(&USERS, query).await
    }

    async fn update_user(&self, user: &User) -> RepoResult<Option<User>> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, password_hash = $3, role = $4, is_active = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.is_active)
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn record_login(&self, id: Uuid) -> RepoResult<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- EVENTS ---

    async fn insert_event(&self, event: &Event) -> RepoResult<Event> {
        let inserted = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (id, title, description, venue, event_date, registration_link, images,
                                is_active, created_by, updated_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(event.event_date)
        .bind(&event.registration_link)
        .bind(Json(&event.images))
        .bind(event.is_active)
        .bind(event.created_by)
        .bind(event.updated_by)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn list_events(&self, query: &ListQuery) -> RepoResult<Page<Event>> {
        self.fetch_page(&EVENTS, query).await
    }

    async fn get_event(&self, id: Uuid) -> RepoResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn update_event(
        &self,
        event: &Event,
        new_images: &[ImageMeta],
    ) -> RepoResult<Option<Event>> {
        // `images` is appended in SQL so concurrent updates keep each other's pictures.
        let updated = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET title = $2, description = $3, venue = $4, event_date = $5, registration_link = $6,
                images = images || $7, is_active = $8, updated_by = $9, updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(event.event_date)
        .bind(&event.registration_link)
        .bind(Json(new_images))
        .bind(event.is_active)
        .bind(event.updated_by)
        .bind(event.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn remove_event_image(
        &self,
        id: Uuid,
        image_id: Uuid,
        editor: Uuid,
    ) -> RepoResult<Removal<Event, ImageMeta>> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(mut event) = locked else {
            return Ok(Removal::RowMissing);
        };
        let Some(item) = event.remove_image(image_id, editor) else {
            return Ok(Removal::ItemMissing);
        };

        let row = sqlx::query_as::<_, Event>(
            "UPDATE events SET images = $2, updated_by = $3, updated_at = $4 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Json(&event.images))
        .bind(event.updated_by)
        .bind(event.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Removal::Removed { row, item })
    }

    // --- NEWS ---

    async fn insert_news(&self, news: &News) -> RepoResult<News> {
        let inserted = sqlx::query_as::<_, News>(
            r#"
            INSERT INTO news (id, title, summary, content, published_on, source_link, image_url,
                              is_active, created_by, updated_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(news.id)
        .bind(&news.title)
        .bind(&news.summary)
        .bind(&news.content)
        .bind(news.published_on)
        .bind(&news.source_link)
        .bind(&news.image_url)
        .bind(news.is_active)
        .bind(news.created_by)
        .bind(news.updated_by)
        .bind(news.created_at)
        .bind(news.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn list_news(&self, query: &ListQuery) -> RepoResult<Page<News>> {
        self.fetch_page(&NEWS, query).await
    }

    async fn get_news(&self, id: Uuid) -> RepoResult<Option<News>> {
        let news = sqlx::query_as::<_, News>("SELECT * FROM news WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(news)
    }

    async fn update_news(&self, news: &News) -> RepoResult<Option<News>> {
        let updated = sqlx::query_as::<_, News>(
            r#"
            UPDATE news
            SET title = $2, summary = $3, content = $4, published_on = $5, source_link = $6,
                image_url = $7, is_active = $8, updated_by = $9, updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(news.id)
        .bind(&news.title)
        .bind(&news.summary)
        .bind(&news.content)
        .bind(news.published_on)
        .bind(&news.source_link)
        .bind(&news.image_url)
        .bind(news.is_active)
        .bind(news.updated_by)
        .bind(news.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    // --- GALLERIES ---

    async fn insert_gallery(&self, gallery: &Gallery) -> RepoResult<Gallery> {
        let inserted = sqlx::query_as::<_, Gallery>(
            r#"
            INSERT INTO galleries (id, title, description, category, images, videos,
                                   is_active, created_by, updated_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(gallery.id)
        .bind(&gallery.title)
        .bind(&gallery.description)
        .bind(&gallery.category)
        .bind(Json(&gallery.images))
        .bind(Json(&gallery.videos))
        .bind(gallery.is_active)
        .bind(gallery.created_by)
        .bind(gallery.updated_by)
        .bind(gallery.created_at)
        .bind(gallery.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn list_galleries(&self, query: &ListQuery) -> RepoResult<Page<Gallery>> {
        self.fetch_page(&GALLERIES, query).await
    }

    async fn get_gallery(&self, id: Uuid) -> RepoResult<Option<Gallery>> {
        let gallery = sqlx::query_as::<_, Gallery>("SELECT * FROM galleries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(gallery)
    }

    async fn update_gallery(
        &self,
        gallery: &Gallery,
        new_images: &[ImageMeta],
        new_videos: &[VideoLink],
    ) -> RepoResult<Option<Gallery>> {
        let updated = sqlx::query_as::<_, Gallery>(
            r#"
            UPDATE galleries
            SET title = $2, description = $3, category = $4, images = images || $5,
                videos = videos || $6, is_active = $7, updated_by = $8, updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(gallery.id)
        .bind(&gallery.title)
        .bind(&gallery.description)
        .bind(&gallery.category)
        .bind(Json(new_images))
        .bind(Json(new_videos))
        .bind(gallery.is_active)
        .bind(gallery.updated_by)
        .bind(gallery.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn remove_gallery_image(
        &self,
        id: Uuid,
        image_id: Uuid,
        editor: Uuid,
    ) -> RepoResult<Removal<Gallery, ImageMeta>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut gallery) = lock_gallery(&mut tx, id).await? else {
            return Ok(Removal::RowMissing);
        };
        let Some(item) = gallery.remove_image(image_id, editor) else {
            return Ok(Removal::ItemMissing);
        };

        let row = write_gallery_lists(&mut tx, &gallery).await?;
        tx.commit().await?;
        Ok(Removal::Removed { row, item })
    }

    async fn remove_gallery_video(
        &self,
        id: Uuid,
        video_id: Uuid,
        editor: Uuid,
    ) -> RepoResult<Removal<Gallery, VideoLink>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut gallery) = lock_gallery(&mut tx, id).await? else {
            return Ok(Removal::RowMissing);
        };
        let Some(item) = gallery.remove_video(video_id, editor) else {
            return Ok(Removal::ItemMissing);
        };

        let row = write_gallery_lists(&mut tx, &gallery).await?;
        tx.commit().await?;
        Ok(Removal::Removed { row, item })
    }

    // --- TEAM ---

    async fn insert_team_member(&self, member: &TeamMember) -> RepoResult<TeamMember> {
        let inserted = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (id, name, designation, department, bio, email, linkedin_url,
                                      photo_url, display_order, is_active, created_by, updated_by,
                                      created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(member.id)
        .bind(&member.name)
        .bind(&member.designation)
        .bind(&member.department)
        .bind(&member.bio)
        .bind(&member.email)
        .bind(&member.linkedin_url)
        .bind(&member.photo_url)
        .bind(member.display_order)
        .bind(member.is_active)
        .bind(member.created_by)
        .bind(member.updated_by)
        .bind(member.created_at)
        .bind(member.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn list_team_members(&self, query: &ListQuery) -> RepoResult<Page<TeamMember>> {
        self.fetch_page(&TEAM_MEMBERS, query).await
    }

    async fn get_team_member(&self, id: Uuid) -> RepoResult<Option<TeamMember>> {
        let member = sqlx::query_as::<_, TeamMember>("SELECT * FROM team_members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn update_team_member(&self, member: &TeamMember) -> RepoResult<Option<TeamMember>> {
        let updated = sqlx::query_as::<_, TeamMember>(
            r#"
            UPDATE team_members
            SET name = $2, designation = $3, department = $4, bio = $5, email = $6,
                linkedin_url = $7, photo_url = $8, display_order = $9, is_active = $10,
                updated_by = $11, updated_at = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(member.id)
        .bind(&member.name)
        .bind(&member.designation)
        .bind(&member.department)
        .bind(&member.bio)
        .bind(&member.email)
        .bind(&member.linkedin_url)
        .bind(&member.photo_url)
        .bind(member.display_order)
        .bind(member.is_active)
        .bind(member.updated_by)
        .bind(member.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    // --- TRL LISTINGS ---

    async fn insert_trl(&self, trl: &Trl) -> RepoResult<Trl> {
        let inserted = sqlx::query_as::<_, Trl>(
            r#"
            INSERT INTO trls (id, title, description, level, sector, contact_email, image_url,
                              is_active, created_by, updated_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(trl.id)
        .bind(&trl.title)
        .bind(&trl.description)
        .bind(trl.level)
        .bind(&trl.sector)
        .bind(&trl.contact_email)
        .bind(&trl.image_url)
        .bind(trl.is_active)
        .bind(trl.created_by)
        .bind(trl.updated_by)
        .bind(trl.created_at)
        .bind(trl.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn list_trls(&self, query: &ListQuery) -> RepoResult<Page<Trl>> {
        self.fetch_page(&TRLS, query).await
    }

    async fn get_trl(&self, id: Uuid) -> RepoResult<Option<Trl>> {
        let trl = sqlx::query_as::<_, Trl>("SELECT * FROM trls WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(trl)
    }

    async fn update_trl(&self, trl: &Trl) -> RepoResult<Option<Trl>> {
        let updated = sqlx::query_as::<_, Trl>(
            r#"
            UPDATE trls
            SET title = $2, description = $3, level = $4, sector = $5, contact_email = $6,
                image_url = $7, is_active = $8, updated_by = $9, updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(trl.id)
        .bind(&trl.title)
        .bind(&trl.description)
        .bind(trl.level)
        .bind(&trl.sector)
        .bind(&trl.contact_email)
        .bind(&trl.image_url)
        .bind(trl.is_active)
        .bind(trl.updated_by)
        .bind(trl.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    // --- IMPORTANT DOCUMENTS ---

    async fn insert_document(&self, doc: &ImportantDocument) -> RepoResult<ImportantDocument> {
        let inserted = sqlx::query_as::<_, ImportantDocument>(
            r#"
            INSERT INTO important_documents (id, title, description, category, file_url, file_name,
                                             content_type, is_active, created_by, updated_by,
                                             created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(doc.id)
        .bind(&doc.title)
        .bind(&doc.description)
        .bind(&doc.category)
        .bind(&doc.file_url)
        .bind(&doc.file_name)
        .bind(&doc.content_type)
        .bind(doc.is_active)
        .bind(doc.created_by)
        .bind(doc.updated_by)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn list_documents(&self, query: &ListQuery) -> RepoResult<Page<ImportantDocument>> {
        self.fetch_page(&DOCUMENTS, query).await
    }

    async fn get_document(&self, id: Uuid) -> RepoResult<Option<ImportantDocument>> {
        let doc = sqlx::query_as::<_, ImportantDocument>(
            "SELECT * FROM important_documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    async fn update_document(
        &self,
        doc: &ImportantDocument,
    ) -> RepoResult<Option<ImportantDocument>> {
        let updated = sqlx::query_as::<_, ImportantDocument>(
            r#"
            UPDATE important_documents
            SET title = $2, description = $3, category = $4, file_url = $5, file_name = $6,
                content_type = $7, is_active = $8, updated_by = $9, updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(doc.id)
        .bind(&doc.title)
        .bind(&doc.description)
        .bind(&doc.category)
        .bind(&doc.file_url)
        .bind(&doc.file_name)
        .bind(&doc.content_type)
        .bind(doc.is_active)
        .bind(doc.updated_by)
        .bind(doc.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    // --- DASHBOARD ---

    /// get_stats
    ///
    /// All counters in one round trip.
    async fn get_stats(&self) -> RepoResult<AdminDashboardStats> {
        let (events, news, galleries, team_members, trls, documents, users) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM events),
                    (SELECT COUNT(*) FROM news),
                    (SELECT COUNT(*) FROM galleries),
                    (SELECT COUNT(*) FROM team_members),
                    (SELECT COUNT(*) FROM trls),
                    (SELECT COUNT(*) FROM important_documents),
                    (SELECT COUNT(*) FROM users)
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(AdminDashboardStats {
            events,
            news,
            galleries,
            team_members,
            trls,
            documents,
            users,
        })
    }
}
