use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use serde_json::Value;

use blog_core::domain::{NewCategory, NewComment, NewPost, Post, PostFields, User};
use blog_core::pagination::PageRequest;
use blog_core::ports::{BaseRepository, CommentRepository, PostRepository, TokenService};
use blog_core::visibility::PostFilter;
use blog_infra::{InMemoryBlogStore, JwtConfig, JwtTokenService};

use super::{configure_routes, not_found};
use crate::middleware::auth::AUTH_COOKIE;
use crate::state::AppState;

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes)
                .default_service(web::to(not_found)),
        )
        .await
    };
}

fn setup() -> (InMemoryBlogStore, AppState) {
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "handler-tests".to_string(),
        ..JwtConfig::default()
    }));
    let store = InMemoryBlogStore::new();
    let state = AppState::in_memory(&store, tokens);
    (store, state)
}

async fn user(store: &InMemoryBlogStore, username: &str) -> User {
    store
        .users()
        .create(User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "unused".to_string(),
        ))
        .await
        .unwrap()
}

fn bearer(state: &AppState, user: &User) -> (header::HeaderName, String) {
    let token = state.tokens.generate_token(user.id, &user.username).unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn fields(title: &str) -> PostFields {
    PostFields {
        title: title.to_string(),
        text: "text".to_string(),
        pub_date: Utc::now() - Duration::days(1),
        location_id: None,
        category_id: None,
        is_published: true,
        image: None,
    }
}

async fn post(store: &InMemoryBlogStore, author: &User, fields: PostFields) -> Post {
    store
        .posts()
        .create(NewPost::new(author.id, fields))
        .await
        .unwrap()
}

fn titles(body: &Value) -> Vec<String> {
    body["page_obj"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[actix_web::test]
async fn test_anonymous_create_redirects_to_login() {
    let (_, state) = setup();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/posts/create/").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=%2Fposts%2Fcreate%2F");

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .set_form([("title", "x")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn test_create_stamps_acting_author() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header(bearer(&state, &anna))
        .set_form([
            ("title", "Baikal"),
            ("text", "Cold water."),
            ("pub_date", "2024-03-01T10:30"),
            ("is_published", "on"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/anna/");

    let page = store
        .posts()
        .list(PostFilter::everything(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].post.author_id, anna.id);
    assert_eq!(page.items[0].post.title, "Baikal");
}

#[actix_web::test]
async fn test_invalid_post_form_is_rejected_with_field_errors() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header(bearer(&state, &anna))
        .set_form([("title", ""), ("text", "t"), ("pub_date", "yesterday"), ("category", "42")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["pub_date"].is_array());
    assert_eq!(body["form"]["text"], "t");
}

#[actix_web::test]
async fn test_unknown_category_is_an_invalid_choice() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header(bearer(&state, &anna))
        .set_form([
            ("title", "t"),
            ("text", "t"),
            ("pub_date", "2024-03-01"),
            ("category", "42"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["category"][0], "Select a valid choice.");
}

#[actix_web::test]
async fn test_non_author_is_forbidden() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let boris = user(&store, "boris").await;
    let anna_post = post(&store, &anna, fields("mine")).await;
    let app = app!(state);

    for uri in [
        format!("/posts/{}/edit/", anna_post.id),
        format!("/posts/{}/delete/", anna_post.id),
    ] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(&state, &boris))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", anna_post.id))
        .insert_header(bearer(&state, &boris))
        .set_form([("title", "taken over"), ("text", "t"), ("pub_date", "2024-03-01")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let stored = store.posts().find_by_id(anna_post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "mine");
    assert!(stored.is_published);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete/", anna_post.id))
        .insert_header(bearer(&state, &boris))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(store.posts().find_by_id(anna_post.id).await.unwrap().is_some());

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete/", anna_post.id))
        .insert_header(bearer(&state, &anna))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/anna/");
    assert!(store.posts().find_by_id(anna_post.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn test_author_edits_post() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let p = post(&store, &anna, fields("draft")).await;
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit/", p.id))
        .insert_header(bearer(&state, &anna))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["form"]["title"], "draft");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", p.id))
        .insert_header(bearer(&state, &anna))
        .set_form([("title", "final"), ("text", "t"), ("pub_date", "2024-03-01")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", p.id));

    let stored = store.posts().find_by_id(p.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "final");
    // Unchecked checkbox.
    assert!(!stored.is_published);
    assert_eq!(stored.author_id, anna.id);
}

#[actix_web::test]
async fn test_hidden_post_detail_only_for_author() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let boris = user(&store, "boris").await;
    let hidden = post(
        &store,
        &anna,
        PostFields {
            is_published: false,
            ..fields("secret")
        },
    )
    .await;
    let app = app!(state);
    let uri = format!("/posts/{}/", hidden.id);

    let req = test::TestRequest::get().uri(&uri).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&state, &boris))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&state, &anna))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["post"]["title"], "secret");
    assert!(body["form"].is_object());
}

#[actix_web::test]
async fn test_scheduled_post_detail_only_for_author() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let boris = user(&store, "boris").await;
    let scheduled = post(
        &store,
        &anna,
        PostFields {
            pub_date: Utc::now() + Duration::days(3),
            ..fields("next week")
        },
    )
    .await;
    let app = app!(state);
    let uri = format!("/posts/{}/", scheduled.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&state, &boris))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&state, &anna))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["post"]["title"], "next week");
}

#[actix_web::test]
async fn test_index_shows_only_public_posts() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let hidden = store
        .categories()
        .create(NewCategory {
            is_published: false,
            ..NewCategory::new("Hidden", "hidden")
        })
        .await
        .unwrap();

    post(&store, &anna, fields("visible")).await;
    post(
        &store,
        &anna,
        PostFields {
            pub_date: Utc::now() + Duration::days(1),
            ..fields("tomorrow")
        },
    )
    .await;
    post(
        &store,
        &anna,
        PostFields {
            is_published: false,
            ..fields("draft")
        },
    )
    .await;
    post(
        &store,
        &anna,
        PostFields {
            category_id: Some(hidden.id),
            ..fields("in hidden category")
        },
    )
    .await;
    let app = app!(state);

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&body), vec!["visible"]);
    assert_eq!(body["page_obj"]["num_pages"], 1);

    // Anonymous visitors see the same subset on the profile.
    let req = test::TestRequest::get().uri("/profile/anna/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&body), vec!["visible"]);
    assert_eq!(body["is_owner"], false);

    let req = test::TestRequest::get()
        .uri("/profile/anna/")
        .insert_header(bearer(&state, &anna))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page_obj"]["total"], 4);
    assert_eq!(body["is_owner"], true);
}

#[actix_web::test]
async fn test_pagination_bounds() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let app = app!(state);

    let req = test::TestRequest::get().uri("/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    for i in 0..11 {
        post(&store, &anna, fields(&format!("p{i}"))).await;
    }

    let req = test::TestRequest::get().uri("/?page=2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page_obj"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["page_obj"]["has_previous"], true);

    for uri in [
        "/?page=3",
        "/?page=0",
        "/?page=abc",
        "/?page=18446744073709551615",
        "/?page=922337203685477581",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND,
            "{uri}"
        );
    }
}

#[actix_web::test]
async fn test_category_page() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let travel = store
        .categories()
        .create(NewCategory::new("Travel", "travel"))
        .await
        .unwrap();
    store
        .categories()
        .create(NewCategory {
            is_published: false,
            ..NewCategory::new("Hidden", "hidden")
        })
        .await
        .unwrap();
    post(
        &store,
        &anna,
        PostFields {
            category_id: Some(travel.id),
            ..fields("trip")
        },
    )
    .await;
    post(&store, &anna, fields("elsewhere")).await;
    let app = app!(state);

    let req = test::TestRequest::get().uri("/category/travel/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["category"]["title"], "Travel");
    assert_eq!(titles(&body), vec!["trip"]);

    for uri in ["/category/hidden/", "/category/missing/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }
}

#[actix_web::test]
async fn test_comments_flow() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let boris = user(&store, "boris").await;
    let p = post(&store, &anna, fields("post")).await;
    let app = app!(state);

    for text in ["first", "second"] {
        let req = test::TestRequest::post()
            .uri(&format!("/posts/{}/comment/", p.id))
            .insert_header(bearer(&state, &boris))
            .set_form([("text", text)])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/posts/{}/", p.id));
    }

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", p.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments[0]["text"], "first");
    assert_eq!(comments[1]["text"], "second");
    assert_eq!(body["post"]["comment_count"], 2);
    // Anonymous viewers get no comment form.
    assert!(body["form"].is_null());

    let comment_id = comments[0]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit_comment/{}/", p.id, comment_id))
        .insert_header(bearer(&state, &anna))
        .set_form([("text", "hijacked")])
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    for uri in [
        format!("/posts/{}/edit_comment/{}/", p.id, comment_id),
        format!("/posts/{}/delete_comment/{}/", p.id, comment_id),
    ] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(&state, &anna))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN,
            "{uri}"
        );
    }

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete_comment/{}/", p.id, comment_id))
        .insert_header(bearer(&state, &anna))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let untouched = store.comments().find_by_id(comment_id).await.unwrap().unwrap();
    assert_eq!(untouched.text, "first");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit_comment/{}/", p.id, comment_id))
        .insert_header(bearer(&state, &boris))
        .set_form([("text", "edited")])
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FOUND
    );

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete_comment/{}/", p.id, comment_id))
        .insert_header(bearer(&state, &boris))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FOUND
    );

    let remaining = store.comments().list_for_post(p.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].comment.text, "second");
}

#[actix_web::test]
async fn test_comment_addressed_under_other_post_is_not_found() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let first = post(&store, &anna, fields("first")).await;
    let second = post(&store, &anna, fields("second")).await;
    let comment = store
        .comments()
        .create(NewComment {
            text: "hi".into(),
            post_id: first.id,
            author_id: anna.id,
        })
        .await
        .unwrap();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit_comment/{}/", second.id, comment.id))
        .insert_header(bearer(&state, &anna))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_cannot_comment_on_hidden_post_of_others() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let boris = user(&store, "boris").await;
    let draft = post(
        &store,
        &anna,
        PostFields {
            is_published: false,
            ..fields("draft")
        },
    )
    .await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", draft.id))
        .insert_header(bearer(&state, &boris))
        .set_form([("text", "hello")])
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_edit_profile_is_owner_only() {
    let (store, state) = setup();
    let anna = user(&store, "anna").await;
    let boris = user(&store, "boris").await;
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/edit_profile/anna/")
        .insert_header(bearer(&state, &boris))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::post()
        .uri("/edit_profile/anna/")
        .insert_header(bearer(&state, &anna))
        .set_form([
            ("username", "boris"),
            ("email", "anna@example.com"),
            ("first_name", "Anna"),
            ("last_name", "K"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/edit_profile/anna/")
        .insert_header(bearer(&state, &anna))
        .set_form([
            ("username", "anna_k"),
            ("email", "anna@example.com"),
            ("first_name", "Anna"),
            ("last_name", "K"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/anna_k/");

    let renamed = store.users().find_by_id(anna.id).await.unwrap().unwrap();
    assert_eq!(renamed.username, "anna_k");
    assert_eq!(renamed.display_name(), "Anna K");
}

#[actix_web::test]
async fn test_register_login_and_use_cookie() {
    let (_, state) = setup();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_form([
            ("username", "leo"),
            ("email", "leo@example.com"),
            ("password1", "war-and-peace"),
            ("password2", "war-and-peace"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "leo"), ("password", "wrong-password")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "nobody"), ("password", "war-and-peace")])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["errors"]["__all__"].is_array());
    assert_eq!(body["form"]["password"], "");

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([
            ("username", "leo"),
            ("password", "war-and-peace"),
            ("next", "/posts/create/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/posts/create/");

    let token = resp
        .response()
        .cookies()
        .find(|c| c.name() == AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/posts/create/")
        .cookie(Cookie::new(AUTH_COOKIE, token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_form([
            ("username", "leo"),
            ("password1", "another-pass"),
            ("password2", "another-pass"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_unknown_route_is_not_found() {
    let (_, state) = setup();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/no/such/page/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);

    let req = test::TestRequest::get().uri("/posts/999/").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}
