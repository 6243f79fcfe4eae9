use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::User;

/// 登录/注册成功后服务端返回的会话
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// 登录表单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// 注册表单，confirm_password 只用于本地校验，不会提交
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "All fields are required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[serde(skip)]
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// 申请重置密码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct PasswordResetRequestForm {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// 使用邮件中的令牌重置密码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct PasswordResetForm {
    #[serde(rename = "newPassword")]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,

    #[validate(length(min = 1, message = "Reset token is missing or invalid."))]
    pub token: String,
}
