//! In-memory blog store - used when no database is configured, and by tests.
//!
//! All repositories handed out by one [`InMemoryBlogStore`] share the same
//! tables, so deletes cascade the way the SQL schema does.
//! Note: Data is lost on process restart.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{
    Category, Comment, CommentWithAuthor, Location, NewCategory, NewComment, NewLocation, NewPost,
    Post, PostSummary, User,
};
use blog_core::error::RepoError;
use blog_core::pagination::{Page, PageRequest};
use blog_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use blog_core::visibility::PostFilter;

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    categories: BTreeMap<i64, Category>,
    locations: BTreeMap<i64, Location>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn summarize(&self, post: &Post) -> Option<PostSummary> {
        let author = self.users.get(&post.author_id)?.clone();
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.post_id == post.id)
            .count() as u64;

        Some(PostSummary {
            post: post.clone(),
            author,
            category: post
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
            location: post
                .location_id
                .and_then(|id| self.locations.get(&id).cloned()),
            comment_count,
        })
    }

    fn check_post_refs(&self, post: &Post) -> Result<(), RepoError> {
        if !self.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("posts.author_id".into()));
        }
        if post
            .category_id
            .is_some_and(|id| !self.categories.contains_key(&id))
        {
            return Err(RepoError::Constraint("posts.category_id".into()));
        }
        if post
            .location_id
            .is_some_and(|id| !self.locations.contains_key(&id))
        {
            return Err(RepoError::Constraint("posts.location_id".into()));
        }
        Ok(())
    }

    fn username_taken(&self, username: &str, except: Uuid) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && u.id != except)
    }

    fn slug_taken(&self, slug: &str, except: i64) -> bool {
        self.categories
            .values()
            .any(|c| c.slug == slug && c.id != except)
    }
}

type Shared = Arc<RwLock<Tables>>;

/// Owner of the in-memory tables.
#[derive(Clone, Default)]
pub struct InMemoryBlogStore {
    tables: Shared,
}

impl InMemoryBlogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository(self.tables.clone())
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository(self.tables.clone())
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository(self.tables.clone())
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryCategoryRepository(self.tables.clone())
    }

    pub fn locations(&self) -> InMemoryLocationRepository {
        InMemoryLocationRepository(self.tables.clone())
    }
}

pub struct InMemoryUserRepository(Shared);
pub struct InMemoryPostRepository(Shared);
pub struct InMemoryCommentRepository(Shared);
pub struct InMemoryCategoryRepository(Shared);
pub struct InMemoryLocationRepository(Shared);

#[async_trait]
impl BaseRepository<User, User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.0.read().await.users.get(&id).cloned())
    }

    async fn create(&self, new: User) -> Result<User, RepoError> {
        let mut tables = self.0.write().await;
        if tables.users.contains_key(&new.id) || tables.username_taken(&new.username, new.id) {
            return Err(RepoError::Constraint("users.username".into()));
        }
        tables.users.insert(new.id, new.clone());
        Ok(new)
    }

    async fn update(&self, entity: User) -> Result<User, RepoError> {
        let mut tables = self.0.write().await;
        if !tables.users.contains_key(&entity.id) {
            return Err(RepoError::NotFound);
        }
        if tables.username_taken(&entity.username, entity.id) {
            return Err(RepoError::Constraint("users.username".into()));
        }
        tables.users.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.write().await;
        tables.users.remove(&id).ok_or(RepoError::NotFound)?;

        let own_posts: Vec<i64> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        tables.posts.retain(|_, p| p.author_id != id);
        tables
            .comments
            .retain(|_, c| c.author_id != id && !own_posts.contains(&c.post_id));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .0
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Post, NewPost, i64> for InMemoryPostRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self.0.read().await.posts.get(&id).cloned())
    }

    async fn create(&self, new: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.0.write().await;
        let mut post = Post {
            id: 0,
            title: String::new(),
            text: String::new(),
            pub_date: new.fields.pub_date,
            author_id: new.author_id,
            location_id: None,
            category_id: None,
            is_published: false,
            image: None,
            created_at: Utc::now(),
        };
        post.apply(new.fields);
        tables.check_post_refs(&post)?;

        post.id = tables.next_id();
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, entity: Post) -> Result<Post, RepoError> {
        let mut tables = self.0.write().await;
        if !tables.posts.contains_key(&entity.id) {
            return Err(RepoError::NotFound);
        }
        tables.check_post_refs(&entity)?;
        tables.posts.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.0.write().await;
        tables.posts.remove(&id).ok_or(RepoError::NotFound)?;
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(
        &self,
        filter: PostFilter,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let tables = self.0.read().await;

        let mut matching: Vec<&Post> = tables
            .posts
            .values()
            .filter(|p| {
                let category = p.category_id.and_then(|id| tables.categories.get(&id));
                filter.matches(p, category)
            })
            .collect();
        matching.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .filter_map(|p| tables.summarize(p))
            .collect();

        Ok(Page::new(items, page, total))
    }

    async fn find_summary(&self, id: i64) -> Result<Option<PostSummary>, RepoError> {
        let tables = self.0.read().await;
        Ok(tables.posts.get(&id).and_then(|p| tables.summarize(p)))
    }
}

#[async_trait]
impl BaseRepository<Comment, NewComment, i64> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, RepoError> {
        Ok(self.0.read().await.comments.get(&id).cloned())
    }

    async fn create(&self, new: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.0.write().await;
        if !tables.posts.contains_key(&new.post_id) {
            return Err(RepoError::Constraint("comments.post_id".into()));
        }
        if !tables.users.contains_key(&new.author_id) {
            return Err(RepoError::Constraint("comments.author_id".into()));
        }

        let comment = Comment {
            id: tables.next_id(),
            text: new.text,
            post_id: new.post_id,
            author_id: new.author_id,
            created_at: Utc::now(),
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, entity: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.0.write().await;
        if !tables.comments.contains_key(&entity.id) {
            return Err(RepoError::NotFound);
        }
        tables.comments.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.0.write().await;
        tables.comments.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let tables = self.0.read().await;

        let mut comments: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(comments
            .into_iter()
            .filter_map(|c| {
                let author = tables.users.get(&c.author_id)?.clone();
                Some(CommentWithAuthor {
                    comment: c.clone(),
                    author,
                })
            })
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Category, NewCategory, i64> for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, RepoError> {
        Ok(self.0.read().await.categories.get(&id).cloned())
    }

    async fn create(&self, new: NewCategory) -> Result<Category, RepoError> {
        let mut tables = self.0.write().await;
        if tables.slug_taken(&new.slug, 0) {
            return Err(RepoError::Constraint("categories.slug".into()));
        }

        let category = Category {
            id: tables.next_id(),
            title: new.title,
            description: new.description,
            slug: new.slug,
            is_published: new.is_published,
            created_at: Utc::now(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, entity: Category) -> Result<Category, RepoError> {
        let mut tables = self.0.write().await;
        if !tables.categories.contains_key(&entity.id) {
            return Err(RepoError::NotFound);
        }
        if tables.slug_taken(&entity.slug, entity.id) {
            return Err(RepoError::Constraint("categories.slug".into()));
        }
        tables.categories.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.0.write().await;
        tables.categories.remove(&id).ok_or(RepoError::NotFound)?;
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        Ok(self
            .0
            .read()
            .await
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Location, NewLocation, i64> for InMemoryLocationRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Location>, RepoError> {
        Ok(self.0.read().await.locations.get(&id).cloned())
    }

    async fn create(&self, new: NewLocation) -> Result<Location, RepoError> {
        let mut tables = self.0.write().await;
        let location = Location {
            id: tables.next_id(),
            name: new.name,
            is_published: new.is_published,
            created_at: Utc::now(),
        };
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn update(&self, entity: Location) -> Result<Location, RepoError> {
        let mut tables = self.0.write().await;
        if !tables.locations.contains_key(&entity.id) {
            return Err(RepoError::NotFound);
        }
        tables.locations.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.0.write().await;
        tables.locations.remove(&id).ok_or(RepoError::NotFound)?;
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

impl LocationRepository for InMemoryLocationRepository {}
