use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quill_api::BlogApi;
use quill_domain::{PasswordResetForm, PasswordResetRequestForm};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};

/// 两次发送重置邮件之间的最短间隔
pub const RESET_COOLDOWN: Duration = Duration::from_secs(60);

/// 密码重置服务trait
#[async_trait]
pub trait PasswordService: Send + Sync {
    /// 请求发送重置链接，返回服务端提示消息
    async fn request_reset(&self, form: &PasswordResetRequestForm) -> ServiceResult<String>;

    /// 使用邮件中的令牌设置新密码
    async fn reset(&self, form: &PasswordResetForm) -> ServiceResult<()>;

    /// 距离可以再次请求还有多久
    async fn cooldown_remaining(&self) -> Option<Duration>;
}

/// 默认密码重置服务实现
pub struct DefaultPasswordService {
    api: Arc<dyn BlogApi>,
    last_request: Mutex<Option<Instant>>,
}

impl DefaultPasswordService {
    pub fn new(api: Arc<dyn BlogApi>) -> Self {
        Self {
            api,
            last_request: Mutex::new(None),
        }
    }
}

#[async_trait]
impl PasswordService for DefaultPasswordService {
    async fn request_reset(&self, form: &PasswordResetRequestForm) -> ServiceResult<String> {
        form.validate()?;
        if let Some(remaining) = self.cooldown_remaining().await {
            return Err(ServiceError::Cooldown {
                remaining_secs: remaining.as_secs_f64().ceil() as u64,
            });
        }

        let message = self.api.request_password_reset(form).await?;
        *self.last_request.lock().await = Some(Instant::now());
        info!("Password reset requested");
        Ok(message)
    }

    async fn reset(&self, form: &PasswordResetForm) -> ServiceResult<()> {
        form.validate()?;
        self.api.reset_password(form).await?;
        info!("Password reset completed");
        Ok(())
    }

    async fn cooldown_remaining(&self) -> Option<Duration> {
        let last = (*self.last_request.lock().await)?;
        RESET_COOLDOWN
            .checked_sub(last.elapsed())
            .filter(|remaining| !remaining.is_zero())
    }
}
