use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait};
use uuid::Uuid;

use blog_core::domain::{NewPost, Post, User};
use blog_core::ports::{BaseRepository, UserRepository};
use blog_core::visibility::PostFilter;

use crate::database::entity::{post, user};
use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository, select_posts};

fn post_model(id: i64, author_id: Uuid) -> post::Model {
    let now = Utc::now();
    post::Model {
        id,
        title: "Test Post".to_owned(),
        text: "Content".to_owned(),
        pub_date: now.into(),
        author_id,
        location_id: None,
        category_id: Some(2),
        is_published: true,
        image: None,
        created_at: now.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let author_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(7, author_id)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = BaseRepository::<Post, NewPost, i64>::find_by_id(&repo, 7)
        .await
        .unwrap();

    let post = result.unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, 7);
    assert_eq!(post.author_id, author_id);
    assert_eq!(post.category_id, Some(2));
}

#[tokio::test]
async fn test_find_user_by_username() {
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![user::Model {
            id,
            username: "anna".to_owned(),
            email: "anna@example.com".to_owned(),
            first_name: "Anna".to_owned(),
            last_name: String::new(),
            password_hash: "hash".to_owned(),
            date_joined: Utc::now().into(),
        }]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    let found: Option<User> = repo.find_by_username("anna").await.unwrap();
    let found = found.unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.display_name(), "Anna");
}

#[test]
fn test_public_listing_query() {
    let sql = select_posts(PostFilter::public(Utc::now()))
        .build(DatabaseBackend::Postgres)
        .to_string();

    assert!(sql.contains(r#"LEFT JOIN "categories""#));
    assert!(sql.contains(r#""posts"."is_published" = TRUE"#));
    assert!(sql.contains(r#""posts"."pub_date" <="#));
    assert!(sql.contains(r#""posts"."category_id" IS NULL"#));
    assert!(sql.contains(r#""categories"."is_published" = TRUE"#));
    assert!(sql.contains(r#"ORDER BY "posts"."pub_date" DESC"#));
}

#[test]
fn test_author_listing_query_skips_visibility() {
    let author_id = Uuid::new_v4();
    let sql = select_posts(PostFilter::everything().by_author(author_id))
        .build(DatabaseBackend::Postgres)
        .to_string();

    assert!(sql.contains(r#""posts"."author_id" ="#));
    assert!(!sql.contains(r#""posts"."pub_date" <="#));
    assert!(!sql.contains(r#""categories"."is_published""#));
}

#[test]
fn test_category_listing_query() {
    let sql = select_posts(PostFilter::public(Utc::now()).in_category(5))
        .build(DatabaseBackend::Postgres)
        .to_string();

    assert!(sql.contains(r#""posts"."category_id" = 5"#));
    assert!(sql.contains(r#""posts"."pub_date" <="#));
}
