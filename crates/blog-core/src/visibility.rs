//! Publication visibility.
//!
//! A post is public when it is published, its publication date has been
//! reached, and its category (if any) is published. Listings are built from a
//! [`PostFilter`], which every repository implementation must honour in the
//! same way [`PostFilter::matches`] does.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Post};

/// Whether `post` may be shown to anyone at `now`.
pub fn is_public(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date <= now && category.is_none_or(|c| c.is_published)
}

/// Which posts a listing starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Author(Uuid),
    Category(i64),
}

/// Which posts of the scope survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only posts passing [`is_public`] at the given instant.
    Public { now: DateTime<Utc> },
    /// Everything in scope, e.g. an author looking at their own profile.
    Everything,
}

/// A post listing query: scope + visibility. Results are always ordered by
/// `pub_date` descending and annotated with comment counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub scope: PostScope,
    pub visibility: Visibility,
}

impl PostFilter {
    pub fn public(now: DateTime<Utc>) -> Self {
        Self {
            scope: PostScope::All,
            visibility: Visibility::Public { now },
        }
    }

    pub fn everything() -> Self {
        Self {
            scope: PostScope::All,
            visibility: Visibility::Everything,
        }
    }

    pub fn by_author(self, author_id: Uuid) -> Self {
        Self {
            scope: PostScope::Author(author_id),
            ..self
        }
    }

    pub fn in_category(self, category_id: i64) -> Self {
        Self {
            scope: PostScope::Category(category_id),
            ..self
        }
    }

    /// Reference semantics for a single post; `category` must be the post's
    /// own category record.
    pub fn matches(&self, post: &Post, category: Option<&Category>) -> bool {
        let in_scope = match self.scope {
            PostScope::All => true,
            PostScope::Author(author_id) => post.author_id == author_id,
            PostScope::Category(category_id) => post.category_id == Some(category_id),
        };

        in_scope
            && match self.visibility {
                Visibility::Public { now } => is_public(post, category, now),
                Visibility::Everything => true,
            }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn post(is_published: bool, pub_date: DateTime<Utc>, category_id: Option<i64>) -> Post {
        Post {
            id: 1,
            title: "t".into(),
            text: "x".into(),
            pub_date,
            author_id: Uuid::new_v4(),
            location_id: None,
            category_id,
            is_published,
            image: None,
            created_at: pub_date,
        }
    }

    fn category(is_published: bool) -> Category {
        Category {
            id: 3,
            title: "Travel".into(),
            description: String::new(),
            slug: "travel".into(),
            is_published,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_published_past_post_in_published_category_is_public() {
        let now = Utc::now();
        let p = post(true, now - Duration::days(1), Some(3));
        assert!(is_public(&p, Some(&category(true)), now));
    }

    #[test]
    fn test_scheduled_post_is_hidden() {
        let now = Utc::now();
        let p = post(true, now + Duration::days(1), Some(3));
        assert!(!is_public(&p, Some(&category(true)), now));
    }

    #[test]
    fn test_unpublished_post_is_hidden() {
        let now = Utc::now();
        let p = post(false, now - Duration::days(1), None);
        assert!(!is_public(&p, None, now));
    }

    #[test]
    fn test_hidden_category_hides_post() {
        let now = Utc::now();
        let p = post(true, now - Duration::days(1), Some(3));
        assert!(!is_public(&p, Some(&category(false)), now));
    }

    #[test]
    fn test_post_without_category_is_public() {
        let now = Utc::now();
        let p = post(true, now - Duration::hours(1), None);
        assert!(is_public(&p, None, now));
    }

    #[test]
    fn test_pub_date_equal_to_now_is_public() {
        let now = Utc::now();
        let p = post(true, now, None);
        assert!(is_public(&p, None, now));
    }

    #[test]
    fn test_filter_scopes() {
        let now = Utc::now();
        let p = post(false, now + Duration::days(1), Some(3));

        assert!(!PostFilter::public(now).matches(&p, Some(&category(true))));
        assert!(PostFilter::everything().matches(&p, Some(&category(true))));
        assert!(
            PostFilter::everything()
                .by_author(p.author_id)
                .matches(&p, None)
        );
        assert!(
            !PostFilter::everything()
                .by_author(Uuid::new_v4())
                .matches(&p, None)
        );
        assert!(PostFilter::everything().in_category(3).matches(&p, None));
        assert!(!PostFilter::everything().in_category(4).matches(&p, None));
    }
}
