use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a single blog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// May lie in the future for scheduled publications.
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub is_published: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The author-editable part of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFields {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub is_published: bool,
    pub image: Option<String>,
}

/// A post that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub fields: PostFields,
}

impl NewPost {
    pub fn new(author_id: Uuid, fields: PostFields) -> Self {
        Self { author_id, fields }
    }
}

impl Post {
    /// Overwrite the editable fields, keeping identity, author and creation time.
    pub fn apply(&mut self, fields: PostFields) {
        self.title = fields.title;
        self.text = fields.text;
        self.pub_date = fields.pub_date;
        self.location_id = fields.location_id;
        self.category_id = fields.category_id;
        self.is_published = fields.is_published;
        self.image = fields.image;
    }

    pub fn fields(&self) -> PostFields {
        PostFields {
            title: self.title.clone(),
            text: self.text.clone(),
            pub_date: self.pub_date,
            location_id: self.location_id,
            category_id: self.category_id,
            is_published: self.is_published,
            image: self.image.clone(),
        }
    }
}
