pub mod client;
pub mod error;
pub mod security;

pub use client::{BlogApi, CursorPage, PostQuery};
pub use client::blog::{AvatarImage, ProfileUpdate};
pub use error::{ApiError, ApiResult};
pub use security::{SessionStorage, TOKEN_KEY, USER_KEY};
