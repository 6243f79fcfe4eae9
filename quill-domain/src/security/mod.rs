pub mod user;
pub mod credentials;

pub use user::{User, ProfileForm};
pub use credentials::{
    AuthSession, LoginForm, RegisterForm, PasswordResetRequestForm, PasswordResetForm,
};
