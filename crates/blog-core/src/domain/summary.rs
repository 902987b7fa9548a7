use super::{Category, Location, Post, User};

/// A post joined with the records a listing or detail page shows next to it.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub post: Post,
    pub author: User,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}
