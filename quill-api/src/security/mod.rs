pub mod storage;

pub use storage::{SessionStorage, TOKEN_KEY, USER_KEY};
