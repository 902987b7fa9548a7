//! Domain records to page context.

use blog_core::domain::{Category, CommentWithAuthor, Location, PostSummary, User};
use blog_core::pagination::Page;
use blog_shared::dto::{
    AuthorDto, CategoryDto, CommentDto, LocationDto, PageDto, PostDto, ProfileDto,
};

pub fn author(user: &User) -> AuthorDto {
    AuthorDto {
        username: user.username.clone(),
        full_name: user.display_name(),
    }
}

pub fn category(category: &Category) -> CategoryDto {
    CategoryDto {
        title: category.title.clone(),
        slug: category.slug.clone(),
        description: category.description.clone(),
    }
}

pub fn location(location: &Location) -> LocationDto {
    LocationDto {
        name: location.name.clone(),
    }
}

pub fn post(summary: PostSummary) -> PostDto {
    let PostSummary {
        post,
        author: post_author,
        category: post_category,
        location: post_location,
        comment_count,
    } = summary;

    PostDto {
        id: post.id,
        title: post.title,
        text: post.text,
        pub_date: post.pub_date,
        author: author(&post_author),
        category: post_category.as_ref().map(category),
        // Hidden locations are not shown.
        location: post_location
            .as_ref()
            .filter(|l| l.is_published)
            .map(location),
        image: post.image,
        is_published: post.is_published,
        comment_count,
    }
}

pub fn comment(entry: CommentWithAuthor) -> CommentDto {
    CommentDto {
        id: entry.comment.id,
        post_id: entry.comment.post_id,
        text: entry.comment.text,
        author: author(&entry.author),
        created_at: entry.comment.created_at,
    }
}

pub fn profile(user: &User) -> ProfileDto {
    ProfileDto {
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        date_joined: user.date_joined,
    }
}

pub fn page(page: Page<PostSummary>) -> PageDto<PostDto> {
    let page = page.map(post);
    PageDto {
        items: page.items,
        number: page.number,
        num_pages: page.num_pages,
        total: page.total,
        has_next: page.has_next,
        has_previous: page.has_previous,
    }
}
