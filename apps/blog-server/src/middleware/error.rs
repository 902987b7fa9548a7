//! Error handling - RFC 7807 problem-details responses.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use blog_core::error::{DomainError, RepoError};
use blog_shared::ErrorResponse;

/// Where anonymous visitors are sent when a page needs a signed-in user.
pub const LOGIN_URL: &str = "/auth/login/";

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Forbidden(String),
    Conflict(String),
    Internal(String),
    /// No signed-in user; carries the path to return to after login.
    LoginRequired(String),
}

impl AppError {
    pub fn login_url(next: &str) -> String {
        format!("{}?next={}", LOGIN_URL, urlencoding::encode(next))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::LoginRequired(next) => write!(f, "Login required for {}", next),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::LoginRequired(_) => StatusCode::FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::LoginRequired(next) => {
                return HttpResponse::Found()
                    .insert_header((header::LOCATION, AppError::login_url(next)))
                    .finish();
            }
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::Forbidden(detail) => ErrorResponse::forbidden().with_detail(detail),
            AppError::Conflict(detail) => ErrorResponse::new(409, "Conflict").with_detail(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} {} not found", entity_type, id))
            }
            DomainError::Forbidden(kind) => {
                AppError::Forbidden(format!("Only the author may change this {}", kind))
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_keeps_next() {
        let response = AppError::LoginRequired("/posts/create/?a=1".into()).error_response();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=%2Fposts%2Fcreate%2F%3Fa%3D1"
        );
    }

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let forbidden: AppError = DomainError::Forbidden("post").into();
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let missing: AppError = DomainError::not_found("post", 4).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let taken: AppError = RepoError::Constraint("users.username".into()).into();
        assert_eq!(taken.status_code(), StatusCode::CONFLICT);
    }
}
