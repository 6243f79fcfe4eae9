pub mod security;
pub mod content;

pub use security::{
    User, ProfileForm,
    AuthSession, LoginForm, RegisterForm, PasswordResetRequestForm, PasswordResetForm,
};

pub use content::{
    Post, PostDraft, FeaturedSplit,
    Comment, CommentThread, NewComment,
    LikeStatus,
};
