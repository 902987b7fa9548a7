//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Select,
};
use uuid::Uuid;

use blog_core::domain::{Category, CommentWithAuthor, Location, PostSummary, User};
use blog_core::error::RepoError;
use blog_core::pagination::{Page, PageRequest};
use blog_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use blog_core::visibility::{PostFilter, PostScope, Visibility};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }
}

/// The listing query for `filter`: scoped, visibility-filtered, newest first.
///
/// The category table is always LEFT JOINed so the public condition can test
/// `categories.is_published` while keeping uncategorized posts.
pub(crate) fn select_posts(filter: PostFilter) -> Select<PostEntity> {
    let mut condition = Condition::all();

    condition = match filter.scope {
        PostScope::All => condition,
        PostScope::Author(author_id) => condition.add(post::Column::AuthorId.eq(author_id)),
        PostScope::Category(category_id) => condition.add(post::Column::CategoryId.eq(category_id)),
    };

    if let Visibility::Public { now } = filter.visibility {
        let now: sea_orm::prelude::DateTimeWithTimeZone = now.into();
        condition = condition
            .add(post::Column::IsPublished.eq(true))
            .add(post::Column::PubDate.lte(now))
            .add(
                Condition::any()
                    .add(post::Column::CategoryId.is_null())
                    .add(category::Column::IsPublished.eq(true)),
            );
    }

    PostEntity::find()
        .join(JoinType::LeftJoin, post::Relation::Category.def())
        .filter(condition)
        .order_by_desc(post::Column::PubDate)
        .order_by_desc(post::Column::Id)
}

impl PostgresPostRepository {
    /// Load author, category, location and comment count for a batch of posts.
    async fn summarize(&self, posts: Vec<post::Model>) -> Result<Vec<PostSummary>, RepoError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let author_ids: Vec<Uuid> = posts.iter().map(|p| p.author_id).collect();
        let category_ids: Vec<i64> = posts.iter().filter_map(|p| p.category_id).collect();
        let location_ids: Vec<i64> = posts.iter().filter_map(|p| p.location_id).collect();

        let authors: HashMap<Uuid, User> = UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await
            .map_err(query_err)?
            .into_iter()
            .map(|m| (m.id, m.into()))
            .collect();

        let categories: HashMap<i64, Category> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            CategoryEntity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(&self.db)
                .await
                .map_err(query_err)?
                .into_iter()
                .map(|m| (m.id, m.into()))
                .collect()
        };

        let locations: HashMap<i64, Location> = if location_ids.is_empty() {
            HashMap::new()
        } else {
            LocationEntity::find()
                .filter(location::Column::Id.is_in(location_ids))
                .all(&self.db)
                .await
                .map_err(query_err)?
                .into_iter()
                .map(|m| (m.id, m.into()))
                .collect()
        };

        let counts: HashMap<i64, i64> = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
            .filter(comment::Column::PostId.is_in(post_ids))
            .group_by(comment::Column::PostId)
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(query_err)?
            .into_iter()
            .collect();

        let mut summaries = Vec::with_capacity(posts.len());
        for model in posts {
            let Some(author) = authors.get(&model.author_id).cloned() else {
                tracing::warn!(post_id = model.id, "Post author missing, skipping");
                continue;
            };

            summaries.push(PostSummary {
                category: model.category_id.and_then(|id| categories.get(&id).cloned()),
                location: model.location_id.and_then(|id| locations.get(&id).cloned()),
                comment_count: counts.get(&model.id).copied().unwrap_or(0).max(0) as u64,
                author,
                post: model.into(),
            });
        }

        Ok(summaries)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(
        &self,
        filter: PostFilter,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        tracing::debug!(?filter, page = page.number, "Listing posts");

        let paginator = select_posts(filter).paginate(&self.db, page.size);
        let total = paginator.num_items().await.map_err(query_err)?;
        let models = paginator
            .fetch_page(page.number - 1)
            .await
            .map_err(query_err)?;

        let items = self.summarize(models).await?;
        Ok(Page::new(items, page, total))
    }

    async fn find_summary(&self, id: i64) -> Result<Option<PostSummary>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?
        else {
            return Ok(None);
        };

        Ok(self.summarize(vec![model]).await?.pop())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|(comment, author)| {
                Some(CommentWithAuthor {
                    author: author?.into(),
                    comment: comment.into(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }
}

impl LocationRepository for PostgresLocationRepository {}
