use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Category, Comment, CommentWithAuthor, Location, NewCategory, NewComment, NewLocation, NewPost,
    Post, PostSummary, User,
};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};
use crate::visibility::PostFilter;

/// Generic repository trait defining standard CRUD operations.
///
/// `N` is the not-yet-stored form of `T`; stores assign ids and creation
/// timestamps where `N` lacks them.
#[async_trait]
pub trait BaseRepository<T, N, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, new: N) -> Result<T, RepoError>;

    /// Overwrite an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, User, Uuid> {
    /// Find a user by their (unique) username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, NewPost, i64> {
    /// One page of posts matching `filter`, newest `pub_date` first, with
    /// author, category, location and comment count attached.
    async fn list(
        &self,
        filter: PostFilter,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError>;

    /// A single post with the same attachments as [`PostRepository::list`].
    async fn find_summary(&self, id: i64) -> Result<Option<PostSummary>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, NewComment, i64> {
    /// Comments under a post, oldest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>, RepoError>;
}

/// Category repository. Deleting a category leaves its posts uncategorized.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, NewCategory, i64> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;
}

/// Location repository. Deleting a location clears it from its posts.
pub trait LocationRepository: BaseRepository<Location, NewLocation, i64> {}
