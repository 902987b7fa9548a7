//! Sign-up, login and logout.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::http::header;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use blog_core::domain::User;
use blog_core::error::RepoError;
use blog_core::forms::{FormErrors, ProfileForm, RegistrationForm};
use blog_core::ports::BaseRepository;
use blog_shared::dto::{FormContext, LoginRequest};

use super::profiles::{USERNAME_TAKEN, username_taken};
use super::{invalid_form, profile_url, redirect, render};
use crate::middleware::auth::AUTH_COOKIE;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// GET /auth/registration/
pub async fn registration_form() -> HttpResponse {
    render(FormContext::unbound(ProfileForm::default()))
}

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegistrationForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    // Passwords are never echoed back.
    let echo = ProfileForm {
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        username: form.username.clone(),
        email: form.email.clone(),
    };

    let registration = match form.clean() {
        Ok(registration) => registration,
        Err(errors) => return Ok(invalid_form(echo, errors)),
    };

    if username_taken(&state, &registration.profile.username, None).await? {
        let mut errors = FormErrors::new();
        errors.add("username", USERNAME_TAKEN);
        return Ok(invalid_form(echo, errors));
    }

    let password_hash = state
        .passwords
        .hash(&registration.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut user = User::new(String::new(), String::new(), password_hash);
    user.apply(registration.profile);

    let user = match state.users.create(user).await {
        Ok(user) => user,
        Err(RepoError::Constraint(_)) => {
            let mut errors = FormErrors::new();
            errors.add("username", USERNAME_TAKEN);
            return Ok(invalid_form(echo, errors));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(redirect("/"))
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// GET /auth/login/
pub async fn login_form(query: web::Query<NextQuery>) -> HttpResponse {
    render(FormContext::unbound(LoginRequest {
        username: String::new(),
        password: String::new(),
        next: query.into_inner().next,
    }))
}

/// POST /auth/login/ - sets the session cookie and continues to `next`.
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = form.into_inner();

    let user = state.users.find_by_username(req.username.trim()).await?;
    let verified = state
        .passwords
        .check_login(&req.password, user.as_ref().map(|u| u.password_hash.as_str()));

    let Some(user) = user.filter(|_| verified) else {
        tracing::debug!(username = %req.username, "Login failed");
        let mut errors = FormErrors::new();
        errors.add("__all__", BAD_CREDENTIALS);
        return Ok(invalid_form(
            LoginRequest {
                password: String::new(),
                ..req
            },
            errors,
        ));
    };

    let token = state
        .tokens
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let cookie = Cookie::build(AUTH_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(state.tokens.expiration_seconds()))
        .finish();

    let target = req
        .next
        .as_deref()
        .filter(|next| is_local_path(next))
        .map(str::to_string)
        .unwrap_or_else(|| profile_url(&user.username));

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, target))
        .cookie(cookie)
        .finish())
}

/// POST /auth/logout/
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(AUTH_COOKIE, "").path("/").finish();
    cookie.make_removal();

    let mut response = redirect("/");
    if let Err(e) = response.add_cookie(&cookie) {
        tracing::warn!(error = %e, "Failed to clear session cookie");
    }
    response
}

/// Only same-site absolute paths are followed after login.
fn is_local_path(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::is_local_path;

    #[test]
    fn test_next_must_be_local() {
        assert!(is_local_path("/posts/create/"));
        assert!(!is_local_path("//evil.example/"));
        assert!(!is_local_path("https://evil.example/"));
        assert!(!is_local_path("/\\evil.example"));
    }
}
