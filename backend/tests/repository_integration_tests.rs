use chrono::{Duration, NaiveDate, Utc};
use org_cms::{
    models::{
        CreateEventRequest, CreateGalleryRequest, CreateNewsRequest, CreateTeamMemberRequest,
        CreateUserRequest, Event, Gallery, ImageMeta, ListParams, ListQuery, News, Role,
        TeamMember, User, VideoLink, VideoLinkInput,
    },
    repository::{MemoryRepository, PostgresRepository, Removal, RepoError, Repository},
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Data Helpers ---

fn make_user(email: &str) -> User {
    User::new(
        CreateUserRequest {
            name: Some("Repo Tester".to_string()),
            email: Some(email.to_string()),
            password: Some("unused-password".to_string()),
            role: Some(Role::Admin),
            is_active: Some(true),
        },
        "hash".to_string(),
    )
}

/// Builds an event whose `created_at` lies `age_minutes` in the past, so ordering is
/// deterministic without sleeping.
fn make_event(title: &str, age_minutes: i64, is_active: bool) -> Event {
    let mut event = Event::new(
        CreateEventRequest {
            title: Some(title.to_string()),
            description: Some("Generated for repository tests.".to_string()),
            venue: Some("Lab 3".to_string()),
            event_date: NaiveDate::from_ymd_opt(2026, 5, 1),
            registration_link: None,
            is_active: Some(is_active),
        },
        vec![],
        Uuid::new_v4(),
    );
    event.created_by = None;
    event.updated_by = None;
    event.created_at = Utc::now() - Duration::minutes(age_minutes);
    event
}

fn make_member(name: &str, order: i32, age_minutes: i64) -> TeamMember {
    let mut member = TeamMember::new(
        CreateTeamMemberRequest {
            name: Some(name.to_string()),
            designation: Some("Researcher".to_string()),
            display_order: Some(order),
            ..CreateTeamMemberRequest::default()
        },
        None,
        Uuid::new_v4(),
    );
    member.created_by = None;
    member.updated_by = None;
    member.created_at = Utc::now() - Duration::minutes(age_minutes);
    member
}

fn query(page: i64, limit: i64, search: Option<&str>, is_active: Option<bool>) -> ListQuery {
    ListQuery::from(ListParams {
        page: Some(page),
        limit: Some(limit),
        search: search.map(str::to_string),
        is_active,
    })
}

fn picture(name: &str) -> ImageMeta {
    ImageMeta::new(
        format!("http://localhost:9000/mock-bucket/events/{name}"),
        name.to_string(),
        "image/png".to_string(),
        3,
    )
}

fn titles(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.title.as_str()).collect()
}

// --- In-Memory Repository ---

#[tokio::test]
async fn test_memory_list_is_newest_first_and_paged() {
    let repo = MemoryRepository::new();
    for (title, age) in [("Oldest", 30), ("Newest", 1), ("Middle", 10)] {
        repo.insert_event(&make_event(title, age, true)).await.unwrap();
    }

    let first = repo.list_events(&query(1, 2, None, None)).await.unwrap();
    assert_eq!(first.total, 3);
    assert_eq!(titles(&first.items), vec!["Newest", "Middle"]);

    let second = repo.list_events(&query(2, 2, None, None)).await.unwrap();
    assert_eq!(second.total, 3);
    assert_eq!(titles(&second.items), vec!["Oldest"]);

    let beyond = repo.list_events(&query(5, 2, None, None)).await.unwrap();
    assert_eq!(beyond.total, 3);
    assert!(beyond.items.is_empty());
}

#[tokio::test]
async fn test_memory_search_and_active_filter() {
    let repo = MemoryRepository::new();
    repo.insert_event(&make_event("Robotics Workshop", 3, true)).await.unwrap();
    repo.insert_event(&make_event("ROBOTICS finals", 2, false)).await.unwrap();
    repo.insert_event(&make_event("Poetry Night", 1, true)).await.unwrap();

    let found = repo
        .list_events(&query(1, 10, Some("robotics"), None))
        .await
        .unwrap();
    assert_eq!(found.total, 2);

    let active = repo
        .list_events(&query(1, 10, Some("robotics"), Some(true)))
        .await
        .unwrap();
    assert_eq!(titles(&active.items), vec!["Robotics Workshop"]);

    // Venue is searchable too.
    let by_venue = repo.list_events(&query(1, 10, Some("lab 3"), None)).await.unwrap();
    assert_eq!(by_venue.total, 3);
}

#[tokio::test]
async fn test_memory_team_ordering() {
    let repo = MemoryRepository::new();
    repo.insert_team_member(&make_member("Second", 2, 50)).await.unwrap();
    repo.insert_team_member(&make_member("First-older", 1, 40)).await.unwrap();
    repo.insert_team_member(&make_member("First-newer", 1, 5)).await.unwrap();

    let page = repo.list_team_members(&ListQuery::default()).await.unwrap();
    let names: Vec<&str> = page.items.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["First-newer", "First-older", "Second"]);
}

#[tokio::test]
async fn test_memory_update_missing_row_returns_none() {
    let repo = MemoryRepository::new();
    let event = make_event("Never stored", 0, true);

    assert!(repo.update_event(&event, &[]).await.unwrap().is_none());
    assert!(repo.get_event(event.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_memory_update_replaces_fields_and_appends_images() {
    let repo = MemoryRepository::new();
    let mut event = make_event("Draft", 0, true);
    repo.insert_event(&event).await.unwrap();

    event.title = "Final".to_string();
    let saved = repo
        .update_event(&event, &[picture("x.png")])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.title, "Final");
    assert_eq!(saved.images.len(), 1);

    let stored = repo.get_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Final");
    assert_eq!(stored.images.len(), 1);
}

#[tokio::test]
async fn test_memory_overlapping_updates_keep_both_image_sets() {
    let repo = MemoryRepository::new();
    let event = make_event("Shared", 0, true);
    repo.insert_event(&event).await.unwrap();

    // Both editors loaded the row before either saved.
    let first_copy = repo.get_event(event.id).await.unwrap().unwrap();
    let second_copy = repo.get_event(event.id).await.unwrap().unwrap();

    repo.update_event(&first_copy, &[picture("a.png")])
        .await
        .unwrap()
        .unwrap();
    let saved = repo
        .update_event(&second_copy, &[picture("b.png")])
        .await
        .unwrap()
        .unwrap();

    let names: Vec<&str> = saved.images.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.png", "b.png"]);
}

#[tokio::test]
async fn test_memory_removed_image_is_not_restored_by_stale_update() {
    let repo = MemoryRepository::new();
    let doomed = picture("old.png");
    let mut event = make_event("Cleanup", 0, true);
    event.images.push(doomed.clone());
    repo.insert_event(&event).await.unwrap();

    let stale = repo.get_event(event.id).await.unwrap().unwrap();
    let editor = Uuid::new_v4();

    match repo.remove_event_image(event.id, doomed.id, editor).await.unwrap() {
        Removal::Removed { row, item } => {
            assert_eq!(item, doomed);
            assert!(row.images.is_empty());
            assert_eq!(row.updated_by, Some(editor));
        }
        other => panic!("expected a removal, got {other:?}"),
    }

    let saved = repo
        .update_event(&stale, &[picture("new.png")])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.images.len(), 1);
    assert_eq!(saved.images[0].file_name, "new.png");
}

#[tokio::test]
async fn test_memory_remove_reports_missing_row_and_item() {
    let repo = MemoryRepository::new();
    let event = make_event("Bare", 0, true);
    repo.insert_event(&event).await.unwrap();
    let editor = Uuid::new_v4();

    let missing_row = repo
        .remove_event_image(Uuid::new_v4(), Uuid::new_v4(), editor)
        .await
        .unwrap();
    assert!(matches!(missing_row, Removal::RowMissing));

    let missing_item = repo
        .remove_event_image(event.id, Uuid::new_v4(), editor)
        .await
        .unwrap();
    assert!(matches!(missing_item, Removal::ItemMissing));
}

#[tokio::test]
async fn test_memory_gallery_lists_append_and_splice() {
    let repo = MemoryRepository::new();
    let author = Uuid::new_v4();
    let gallery = Gallery::new(
        CreateGalleryRequest {
            title: Some("Campus".to_string()),
            ..CreateGalleryRequest::default()
        },
        vec![],
        author,
    );
    repo.insert_gallery(&gallery).await.unwrap();

    let video = VideoLink::from(VideoLinkInput {
        url: "https://video.example.org/tour".to_string(),
        title: None,
    });
    let first_copy = repo.get_gallery(gallery.id).await.unwrap().unwrap();
    let second_copy = repo.get_gallery(gallery.id).await.unwrap().unwrap();
    repo.update_gallery(&first_copy, &[picture("a.png")], &[video.clone()])
        .await
        .unwrap()
        .unwrap();
    let saved = repo
        .update_gallery(&second_copy, &[picture("b.png")], &[])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.images.len(), 2);
    assert_eq!(saved.videos, vec![video.clone()]);

    let removed = repo
        .remove_gallery_video(gallery.id, video.id, author)
        .await
        .unwrap();
    match removed {
        Removal::Removed { row, item } => {
            assert_eq!(item, video);
            assert!(row.videos.is_empty());
            assert_eq!(row.images.len(), 2);
        }
        other => panic!("expected a removal, got {other:?}"),
    }

    let again = repo
        .remove_gallery_video(gallery.id, video.id, author)
        .await
        .unwrap();
    assert!(matches!(again, Removal::ItemMissing));
}

#[tokio::test]
async fn test_memory_user_email_is_unique_and_case_insensitive() {
    let repo = MemoryRepository::new();
    repo.insert_user(&make_user("Dup@Example.org")).await.unwrap();

    let result = repo.insert_user(&make_user("dup@example.org")).await;
    assert!(matches!(result, Err(RepoError::Conflict(_))));

    let found = repo.find_user_by_email("DUP@EXAMPLE.ORG").await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn test_memory_record_login_and_stats() {
    let repo = MemoryRepository::new();
    let user = repo.insert_user(&make_user("stats@example.org")).await.unwrap();
    assert!(user.last_login_at.is_none());

    repo.record_login(user.id).await.unwrap();
    let reloaded = repo.get_user(user.id).await.unwrap().unwrap();
    assert!(reloaded.last_login_at.is_some());

    repo.insert_event(&make_event("One", 1, true)).await.unwrap();
    repo.insert_event(&make_event("Two", 2, false)).await.unwrap();
    repo.insert_team_member(&make_member("Member", 0, 0)).await.unwrap();

    let stats = repo.get_stats().await.unwrap();
    assert_eq!(stats.events, 2);
    assert_eq!(stats.team_members, 1);
    assert_eq!(stats.users, 1);
    assert_eq!(stats.news, 0);
    assert_eq!(stats.documents, 0);
}

// --- Postgres Repository ---

/// Connects to `DATABASE_URL` and applies migrations.
async fn setup_pg() -> PostgresRepository {
    dotenv::dotenv().ok();

    let db_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set to run integration tests");

    let pool = PgPool::connect(&db_url)
        .await
        .expect("Failed to connect to database for integration tests.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations.");

    PostgresRepository::new(pool)
}

#[tokio::test]
#[ignore = "requires a Postgres instance at DATABASE_URL"]
async fn test_pg_user_roundtrip_and_conflict() {
    let repo = setup_pg().await;
    let email = format!("pg-{}@Example.org", Uuid::new_v4());

    let user = repo.insert_user(&make_user(&email)).await.unwrap();
    assert_eq!(user.email, email.to_lowercase());

    let conflict = repo.insert_user(&make_user(&email.to_uppercase())).await;
    assert!(matches!(conflict, Err(RepoError::Conflict(_))));

    let found = repo.find_user_by_email(&email).await.unwrap().unwrap();
    assert_eq!(found.id, user.id);

    repo.record_login(user.id).await.unwrap();
    let reloaded = repo.get_user(user.id).await.unwrap().unwrap();
    assert!(reloaded.last_login_at.is_some());
}

#[tokio::test]
#[ignore = "requires a Postgres instance at DATABASE_URL"]
async fn test_pg_event_images_survive_update() {
    let repo = setup_pg().await;
    let marker = Uuid::new_v4().to_string();

    let mut event = make_event(&format!("PG event {marker}"), 0, true);
    repo.insert_event(&event).await.unwrap();

    let stale = event.clone();
    event.title = format!("PG event {marker} renamed");
    repo.update_event(&event, &[picture("a.png")])
        .await
        .unwrap()
        .unwrap();
    // A second writer holding the pre-update copy still appends, never overwrites.
    repo.update_event(&stale, &[picture("b.png")])
        .await
        .unwrap()
        .unwrap();

    let stored = repo.get_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.images.len(), 2);
    assert_eq!(stored.images[0].file_name, "a.png");

    let removed = repo
        .remove_event_image(event.id, stored.images[0].id, Uuid::new_v4())
        .await
        .unwrap();
    assert!(matches!(removed, Removal::Removed { .. }));
    let stored = repo.get_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.images.len(), 1);
    assert_eq!(stored.images[0].file_name, "b.png");

    let listed = repo
        .list_events(&query(1, 10, Some(&marker), None))
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, event.id);
}

#[tokio::test]
#[ignore = "requires a Postgres instance at DATABASE_URL"]
async fn test_pg_search_treats_wildcards_literally() {
    let repo = setup_pg().await;
    let marker = Uuid::new_v4().simple().to_string();

    let mut news = News::new(
        CreateNewsRequest {
            title: Some(format!("Discount 100% {marker}")),
            content: Some("Everything must go this week.".to_string()),
            published_on: NaiveDate::from_ymd_opt(2026, 1, 15),
            ..CreateNewsRequest::default()
        },
        None,
        Uuid::new_v4(),
    );
    news.created_by = None;
    news.updated_by = None;
    repo.insert_news(&news).await.unwrap();

    let literal = repo
        .list_news(&query(1, 10, Some(&format!("100% {marker}")), None))
        .await
        .unwrap();
    assert_eq!(literal.total, 1);

    let wildcard = repo
        .list_news(&query(1, 10, Some(&format!("1_0% {marker}")), None))
        .await
        .unwrap();
    assert_eq!(wildcard.total, 0);
}
