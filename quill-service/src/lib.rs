pub mod error;
pub mod security;
pub mod content;
pub mod resource;
pub mod feed;

#[cfg(test)]
mod testing;

pub use error::{ServiceError, ServiceResult};

pub use security::{
    AuthService,
    PasswordService, DefaultPasswordService, RESET_COOLDOWN,
};

pub use content::{
    PostService, DefaultPostService,
    LikeService, DefaultLikeService,
    CommentService, DefaultCommentService,
};

pub use resource::{
    Resource, ResourceLoader, ResourceState,
    PostLoader, UserLoader, PostResource, UserResource,
    AuthorPostsResource, AuthorPostsState,
};

pub use feed::{
    fetch_page, PostFeed, FeedPager,
    FeedController, FeedFilters, FeedOptions, FeedPhase, FeedView,
};
