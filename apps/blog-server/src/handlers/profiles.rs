//! User profiles.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blog_core::domain::User;
use blog_core::forms::{FormErrors, ProfileForm};
use blog_core::guard::ensure_profile_owner;
use blog_core::ports::BaseRepository;
use blog_core::visibility::PostFilter;
use blog_shared::dto::{FormContext, ProfileContext};

use super::{PageQuery, context, invalid_form, profile_url, redirect, render};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub(crate) const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// GET /profile/{username}/ - the owner sees every post they wrote, others
/// only the public ones.
pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {:?} not found", username)))?;

    let is_owner = viewer.id() == Some(user.id);
    let filter = if is_owner {
        PostFilter::everything()
    } else {
        PostFilter::public(Utc::now())
    };

    let page = state
        .posts
        .list(filter.by_author(user.id), query.request()?)
        .await?
        .ensure_exists()?;

    Ok(render(ProfileContext {
        profile: context::profile(&user),
        is_owner,
        page_obj: context::page(page),
    }))
}

/// GET /edit_profile/{username}/
pub async fn edit_form(identity: Identity, path: web::Path<String>) -> AppResult<HttpResponse> {
    ensure_profile_owner(&identity.user, &path)?;

    Ok(render(FormContext::unbound(ProfileForm {
        first_name: identity.user.first_name.clone(),
        last_name: identity.user.last_name.clone(),
        username: identity.user.username.clone(),
        email: identity.user.email.clone(),
    })))
}

/// POST /edit_profile/{username}/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    form: web::Form<ProfileForm>,
) -> AppResult<HttpResponse> {
    ensure_profile_owner(&identity.user, &path)?;

    let form = form.into_inner();
    let fields = match form.clone().clean() {
        Ok(fields) => fields,
        Err(errors) => return Ok(invalid_form(form, errors)),
    };

    if username_taken(&state, &fields.username, Some(&identity.user)).await? {
        let mut errors = FormErrors::new();
        errors.add("username", USERNAME_TAKEN);
        return Ok(invalid_form(form, errors));
    }

    let mut user = identity.user;
    user.apply(fields);
    let user = state.users.update(user).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "Profile updated");

    Ok(redirect(profile_url(&user.username)))
}

/// Whether `username` belongs to someone other than `current`.
pub(crate) async fn username_taken(
    state: &AppState,
    username: &str,
    current: Option<&User>,
) -> AppResult<bool> {
    let existing = state.users.find_by_username(username).await?;
    Ok(existing.is_some_and(|u| Some(u.id) != current.map(|c| c.id)))
}
