pub mod auth_service;
pub mod password_service;

pub use auth_service::AuthService;
pub use password_service::{PasswordService, DefaultPasswordService, RESET_COOLDOWN};
