use quill_api::ApiError;
use quill_infra::SessionStore;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// 服务层错误
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Please wait {remaining_secs} seconds before requesting another reset link.")]
    Cooldown { remaining_secs: u64 },
}

impl ServiceError {
    pub fn auth_required(action: &str) -> Self {
        ServiceError::AuthRequired(format!("You must be logged in to {}.", action))
    }

    /// 写操作失败时的统一处理：401让会话失效并转为AuthRequired
    pub fn from_write(err: ApiError, session: &SessionStore, token: &str, action: &str) -> Self {
        if err.is_unauthorized() {
            session.invalidate_token(token);
            return Self::auth_required(action);
        }
        ServiceError::Api(err)
    }

    pub fn is_unauthorized(&self) -> bool {
        match self {
            ServiceError::Api(e) => e.is_unauthorized(),
            ServiceError::AuthRequired(_) => true,
            _ => false,
        }
    }

    /// 可直接展示给用户的消息
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Api(e) => e.user_message(),
            ServiceError::Validation(errors) => first_validation_message(errors),
            ServiceError::AuthRequired(msg)
            | ServiceError::Forbidden(msg)
            | ServiceError::InvalidInput(msg) => msg.clone(),
            ServiceError::Cooldown { .. } => self.to_string(),
        }
    }
}

/// 按字段名排序后取第一条消息，保证输出稳定
fn first_validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(field, _)| field.to_string());

    for (field, kind) in fields {
        if let ValidationErrorsKind::Field(list) = kind {
            if let Some(error) = list.first() {
                return match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                };
            }
        }
    }
    "Invalid input".to_string()
}

pub type ServiceResult<T> = Result<T, ServiceError>;
