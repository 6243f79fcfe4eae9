pub mod post;
pub mod comment;
pub mod like;

pub use post::{Post, PostDraft, FeaturedSplit};
pub use comment::{Comment, CommentThread, NewComment};
pub use like::LikeStatus;

/// 内容相关的常量
pub mod constant {
    // 上传图片的最大字节数（2 MiB）
    pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;
}
