use thiserror::Error;

/// 调用远端博客API时可能出现的错误
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// 请求未能完成（连接失败、超时等）
    #[error("Network error: {0}")]
    Network(String),

    /// 服务端返回非2xx状态码
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// 响应体无法转换为期望的类型
    #[error("Decode error: {0}")]
    Decode(String),

    /// 无法构造请求URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub const UNAUTHORIZED: u16 = 401;

    /// 返回HTTP状态码（仅Status错误有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 是否为401，调用方据此判断会话已失效
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(Self::UNAUTHORIZED)
    }

    /// 面向用户展示的消息，服务端消息原样透出
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Decode(_) => "Unexpected response from server.".to_string(),
            ApiError::InvalidUrl(url) => format!("Invalid API address: {}", url),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
