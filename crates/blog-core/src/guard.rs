//! Ownership checks run before a resource is shown or changed.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, Post, User};
use crate::error::DomainError;
use crate::visibility::is_public;

/// A record with exactly one author.
pub trait Authored {
    /// Used in error messages and logs.
    const KIND: &'static str;

    fn author_id(&self) -> Uuid;
}

impl Authored for Post {
    const KIND: &'static str = "post";

    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for Comment {
    const KIND: &'static str = "comment";

    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// Permit mutation only by the resource's author.
pub fn ensure_author<R: Authored>(actor: Uuid, resource: &R) -> Result<(), DomainError> {
    if resource.author_id() != actor {
        return Err(DomainError::Forbidden(R::KIND));
    }
    Ok(())
}

/// A post that is not public exists only for its author.
pub fn ensure_visible(
    viewer: Option<Uuid>,
    post: &Post,
    category: Option<&Category>,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    if is_public(post, category, now) || viewer == Some(post.author_id) {
        return Ok(());
    }
    Err(DomainError::not_found("post", post.id))
}

/// The profile in the URL must be the acting user's own.
pub fn ensure_profile_owner(actor: &User, username: &str) -> Result<(), DomainError> {
    if actor.username != username {
        return Err(DomainError::Forbidden("profile"));
    }
    Ok(())
}
