pub mod cache;
pub mod http;
pub mod logging;
pub mod session;

pub use cache::CachedBlogApi;
pub use http::{HttpClient, RequestBody, RequestOptions, ResponseBody, RestBlogApi};
pub use session::{FileStorage, MemoryStorage, SessionStore};
