pub mod post_service;
pub mod like_service;
pub mod comment_service;

pub use post_service::{PostService, DefaultPostService};
pub use like_service::{LikeService, DefaultLikeService};
pub use comment_service::{CommentService, DefaultCommentService};
