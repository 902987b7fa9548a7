//! Post pages: the index, a single post, and the author's create/edit/delete.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};

use blog_core::domain::{NewPost, Post, PostFields, PostSummary};
use blog_core::forms::{FormErrors, INVALID_CHOICE, PostForm};
use blog_core::guard::{ensure_author, ensure_visible};
use blog_core::ports::BaseRepository;
use blog_core::visibility::PostFilter;
use blog_shared::dto::{
    CommentFormDto, ConfirmDeleteContext, FormContext, IndexContext, PostDetailContext,
};

use super::{PageQuery, context, invalid_form, post_url, profile_url, redirect, render};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET / - public posts, newest first.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let now = Utc::now();
    let page = state
        .posts
        .list(PostFilter::public(now), query.request()?)
        .await?
        .ensure_exists()?;

    Ok(render(IndexContext {
        page_obj: context::page(page),
    }))
}

/// GET /posts/{id}/
pub async fn detail(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let now = Utc::now();
    let summary = load_summary(&state, path.into_inner()).await?;
    ensure_visible(viewer.id(), &summary.post, summary.category.as_ref(), now)?;

    let comments = state.comments.list_for_post(summary.post.id).await?;

    Ok(render(PostDetailContext {
        form: viewer.0.is_some().then(CommentFormDto::default),
        comments: comments.into_iter().map(context::comment).collect(),
        post: context::post(summary),
    }))
}

/// GET /posts/create/
pub async fn create_form(_identity: Identity) -> HttpResponse {
    render(FormContext::unbound(blank_form(Utc::now())))
}

/// POST /posts/create/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let fields = match clean_post_form(&state, form.clone()).await? {
        Ok(fields) => fields,
        Err(errors) => return Ok(invalid_form(form, errors)),
    };

    let post = state
        .posts
        .create(NewPost::new(identity.id(), fields))
        .await?;
    tracing::info!(post_id = post.id, author = %identity.user.username, "Post created");

    Ok(redirect(profile_url(&identity.user.username)))
}

/// GET /posts/{id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    ensure_author(identity.id(), &post)?;

    Ok(render(FormContext::unbound(PostForm::bound(&post.fields()))))
}

/// POST /posts/{id}/edit/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let mut post = load_post(&state, path.into_inner()).await?;
    ensure_author(identity.id(), &post)?;

    let form = form.into_inner();
    let fields = match clean_post_form(&state, form.clone()).await? {
        Ok(fields) => fields,
        Err(errors) => return Ok(invalid_form(form, errors)),
    };

    post.apply(fields);
    let post = state.posts.update(post).await?;
    tracing::info!(post_id = post.id, "Post updated");

    Ok(redirect(post_url(post.id)))
}

/// GET /posts/{id}/delete/
pub async fn delete_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let summary = load_summary(&state, path.into_inner()).await?;
    ensure_author(identity.id(), &summary.post)?;

    Ok(render(ConfirmDeleteContext {
        object: context::post(summary),
    }))
}

/// POST /posts/{id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    ensure_author(identity.id(), &post)?;

    state.posts.delete(post.id).await?;
    tracing::info!(post_id = post.id, "Post deleted");

    Ok(redirect(profile_url(&identity.user.username)))
}

async fn load_post(state: &AppState, id: i64) -> AppResult<Post> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {} not found", id)))
}

async fn load_summary(state: &AppState, id: i64) -> AppResult<PostSummary> {
    state
        .posts
        .find_summary(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {} not found", id)))
}

fn blank_form(now: DateTime<Utc>) -> PostForm {
    PostForm {
        pub_date: now.format("%Y-%m-%dT%H:%M").to_string(),
        is_published: Some("on".to_string()),
        ..PostForm::default()
    }
}

/// Field validation plus the lookups a form alone cannot do: the selected
/// category and location must exist.
async fn clean_post_form(
    state: &AppState,
    form: PostForm,
) -> AppResult<Result<PostFields, FormErrors>> {
    let fields = match form.clean() {
        Ok(fields) => fields,
        Err(errors) => return Ok(Err(errors)),
    };

    let mut errors = FormErrors::new();
    if let Some(id) = fields.category_id {
        if state.categories.find_by_id(id).await?.is_none() {
            errors.add("category", INVALID_CHOICE);
        }
    }
    if let Some(id) = fields.location_id {
        if state.locations.find_by_id(id).await?.is_none() {
            errors.add("location", INVALID_CHOICE);
        }
    }

    Ok(errors.into_result(fields))
}
