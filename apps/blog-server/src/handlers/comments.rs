//! Comments under a post.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blog_core::domain::{Comment, CommentWithAuthor, NewComment};
use blog_core::forms::CommentForm;
use blog_core::guard::{ensure_author, ensure_visible};
use blog_core::ports::BaseRepository;
use blog_shared::dto::{ConfirmDeleteContext, FormContext};

use super::{context, invalid_form, post_url, redirect, render};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /posts/{id}/comment/
pub async fn add(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let summary = state
        .posts
        .find_summary(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {} not found", post_id)))?;
    ensure_visible(
        Some(identity.id()),
        &summary.post,
        summary.category.as_ref(),
        Utc::now(),
    )?;

    let form = form.into_inner();
    let text = match form.clone().clean() {
        Ok(text) => text,
        Err(errors) => return Ok(invalid_form(form, errors)),
    };

    let comment = state
        .comments
        .create(NewComment {
            text,
            post_id,
            author_id: identity.id(),
        })
        .await?;
    tracing::info!(comment_id = comment.id, post_id, "Comment added");

    Ok(redirect(post_url(post_id)))
}

/// GET /posts/{id}/edit_comment/{comment_id}/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = load_comment(&state, post_id, comment_id).await?;
    ensure_author(identity.id(), &comment)?;

    Ok(render(FormContext::unbound(CommentForm { text: comment.text })))
}

/// POST /posts/{id}/edit_comment/{comment_id}/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(i64, i64)>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let mut comment = load_comment(&state, post_id, comment_id).await?;
    ensure_author(identity.id(), &comment)?;

    let form = form.into_inner();
    comment.text = match form.clone().clean() {
        Ok(text) => text,
        Err(errors) => return Ok(invalid_form(form, errors)),
    };

    state.comments.update(comment).await?;
    tracing::info!(comment_id, post_id, "Comment updated");

    Ok(redirect(post_url(post_id)))
}

/// GET /posts/{id}/delete_comment/{comment_id}/
pub async fn delete_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = load_comment(&state, post_id, comment_id).await?;
    ensure_author(identity.id(), &comment)?;

    // Only the author gets this far.
    let object = context::comment(CommentWithAuthor {
        comment,
        author: identity.user,
    });
    Ok(render(ConfirmDeleteContext { object }))
}

/// POST /posts/{id}/delete_comment/{comment_id}/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = load_comment(&state, post_id, comment_id).await?;
    ensure_author(identity.id(), &comment)?;

    state.comments.delete(comment.id).await?;
    tracing::info!(comment_id, post_id, "Comment deleted");

    Ok(redirect(post_url(post_id)))
}

/// A comment addressed under the wrong post does not exist.
async fn load_comment(state: &AppState, post_id: i64, comment_id: i64) -> AppResult<Comment> {
    state
        .comments
        .find_by_id(comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(|| AppError::NotFound(format!("comment {} not found", comment_id)))
}
