//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod summary;
mod user;

pub use category::{Category, NewCategory};
pub use comment::{Comment, CommentWithAuthor, NewComment};
pub use location::{Location, NewLocation};
pub use post::{NewPost, Post, PostFields};
pub use summary::PostSummary;
pub use user::{ProfileFields, User};
