//! HTTP handlers and route configuration.
//!
//! GET handlers answer with the JSON context a page template would render;
//! successful POSTs redirect.

mod auth;
mod categories;
mod comments;
mod context;
mod health;
mod posts;
mod profiles;

#[cfg(test)]
mod tests;

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use blog_core::forms::FormErrors;
use blog_core::pagination::PageRequest;
use blog_shared::ErrorResponse;
use blog_shared::dto::FormContext;

use crate::middleware::error::{AppError, AppResult};
use crate::observability::RequestId;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/posts")
                .service(
                    web::resource("/create/")
                        .route(web::get().to(posts::create_form))
                        .route(web::post().to(posts::create)),
                )
                .route("/{id}/", web::get().to(posts::detail))
                .service(
                    web::resource("/{id}/edit/")
                        .route(web::get().to(posts::edit_form))
                        .route(web::post().to(posts::edit)),
                )
                .service(
                    web::resource("/{id}/delete/")
                        .route(web::get().to(posts::delete_form))
                        .route(web::post().to(posts::delete)),
                )
                .route("/{id}/comment/", web::post().to(comments::add))
                .service(
                    web::resource("/{id}/edit_comment/{comment_id}/")
                        .route(web::get().to(comments::edit_form))
                        .route(web::post().to(comments::edit)),
                )
                .service(
                    web::resource("/{id}/delete_comment/{comment_id}/")
                        .route(web::get().to(comments::delete_form))
                        .route(web::post().to(comments::delete)),
                ),
        )
        .route("/category/{slug}/", web::get().to(categories::category_posts))
        .route("/profile/{username}/", web::get().to(profiles::profile))
        .service(
            web::resource("/edit_profile/{username}/")
                .route(web::get().to(profiles::edit_form))
                .route(web::post().to(profiles::edit)),
        )
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/registration/")
                        .route(web::get().to(auth::registration_form))
                        .route(web::post().to(auth::register)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .route("/logout/", web::post().to(auth::logout)),
        );
}

/// Fallback for unknown routes.
pub async fn not_found(request_id: RequestId) -> HttpResponse {
    HttpResponse::NotFound().json(
        ErrorResponse::not_found("The requested page does not exist")
            .with_request_id(request_id.as_str()),
    )
}

/// `?page=N` on listing pages.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Missing or blank means the first page; anything that is not a page
    /// number is not found.
    pub fn request(&self) -> AppResult<PageRequest> {
        let Some(raw) = self.page.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(PageRequest::default());
        };

        match raw.parse::<u64>() {
            Ok(number) if number >= 1 => PageRequest::checked(number)
                .ok_or_else(|| AppError::NotFound(format!("Invalid page {:?}", raw))),
            _ => Err(AppError::NotFound(format!("Invalid page {:?}", raw))),
        }
    }
}

pub(crate) fn render<T: Serialize>(context: T) -> HttpResponse {
    HttpResponse::Ok().json(context)
}

pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

/// Re-render a rejected form with its errors.
pub(crate) fn invalid_form<F: Serialize>(form: F, errors: FormErrors) -> HttpResponse {
    tracing::debug!(fields = ?errors.iter().map(|(f, _)| f).collect::<Vec<_>>(), "Form rejected");

    HttpResponse::UnprocessableEntity().json(FormContext {
        form,
        errors: errors.into_map(),
    })
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub(crate) fn post_url(id: i64) -> String {
    format!("/posts/{}/", id)
}
