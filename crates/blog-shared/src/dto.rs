//! Data Transfer Objects - the render context of each page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::response::FieldErrors;

/// Login form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Local path to continue to after a successful login.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorDto {
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDto {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDto {
    pub name: String,
}

/// A post as shown in listings and on its own page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDto {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: AuthorDto,
    pub category: Option<CategoryDto>,
    pub location: Option<LocationDto>,
    pub image: Option<String>,
    pub is_published: bool,
    pub comment_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentDto {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub author: AuthorDto,
    pub created_at: DateTime<Utc>,
}

/// Public part of a user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDto {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// `/` context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexContext {
    pub page_obj: PageDto<PostDto>,
}

/// `/category/{slug}/` context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryContext {
    pub category: CategoryDto,
    pub page_obj: PageDto<PostDto>,
}

/// `/profile/{username}/` context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileContext {
    pub profile: ProfileDto,
    /// True when the viewer is looking at their own profile.
    pub is_owner: bool,
    pub page_obj: PageDto<PostDto>,
}

/// Empty comment form attached to a post page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentFormDto {
    pub text: String,
}

/// `/posts/{id}/` context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailContext {
    pub post: PostDto,
    pub comments: Vec<CommentDto>,
    /// Present only for signed-in viewers.
    pub form: Option<CommentFormDto>,
}

/// A bound form plus its field errors, for create/edit pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormContext<F> {
    pub form: F,
    pub errors: FieldErrors,
}

impl<F> FormContext<F> {
    pub fn unbound(form: F) -> Self {
        Self {
            form,
            errors: FieldErrors::new(),
        }
    }
}

/// Delete confirmation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmDeleteContext<T> {
    pub object: T,
}
