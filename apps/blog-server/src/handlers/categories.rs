//! Category listing.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blog_core::visibility::PostFilter;
use blog_shared::dto::CategoryContext;

use super::{PageQuery, context, render};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /category/{slug}/ - public posts of a published category.
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .filter(|c| c.is_published)
        .ok_or_else(|| AppError::NotFound(format!("category {:?} not found", slug)))?;

    let page = state
        .posts
        .list(
            PostFilter::public(Utc::now()).in_category(category.id),
            query.request()?,
        )
        .await?
        .ensure_exists()?;

    Ok(render(CategoryContext {
        category: context::category(&category),
        page_obj: context::page(page),
    }))
}
