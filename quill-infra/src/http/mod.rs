pub mod rest;

use std::sync::Arc;
use std::time::Duration;

use quill_api::{ApiError, ApiResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{multipart::Form, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::session::SessionStore;

pub use rest::RestBlogApi;

/// 请求体
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    /// multipart表单，Content-Type由reqwest生成（带boundary）
    Form(Form),
}

/// 单次请求的参数
#[derive(Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub body: RequestBody,
    pub headers: HeaderMap,
    pub query: Vec<(&'static str, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
            query: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn form(mut self, form: Form) -> Self {
        self.body = RequestBody::Form(form);
        self
    }

    pub fn query(mut self, query: Vec<(&'static str, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// 解析后的响应体
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// 204或空响应体
    Empty,
    Json(Value),
    /// 2xx但不是合法JSON时返回原始文本
    Text(String),
}

impl ResponseBody {
    /// 转换为目标类型：Empty按JSON null处理，Text按JSON字符串处理
    pub fn decode<T: DeserializeOwned>(self) -> ApiResult<T> {
        let value = match self {
            ResponseBody::Empty => Value::Null,
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) => Value::String(text),
        };
        Ok(serde_json::from_value(value)?)
    }
}

/// 拼接请求URL
///
/// 绝对地址原样使用；相对路径去掉开头的 `/` 后拼在 base 之后。
pub fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let path = path.trim_start_matches('/');
    if base.is_empty() {
        format!("/{}", path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// 从非2xx响应中提取错误信息
pub(crate) fn error_from_body(status: StatusCode, text: &str) -> ApiError {
    let parsed = if text.is_empty() {
        None
    } else {
        Some(serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string())))
    };

    let fallback = || status.canonical_reason().unwrap_or("Unknown error").to_string();
    let message = match &parsed {
        None | Some(Value::Null) => fallback(),
        Some(Value::Object(map)) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(Value::Null) | None => Value::Object(map.clone()).to_string(),
            Some(other) => other.to_string(),
        },
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };

    ApiError::Status {
        status: status.as_u16(),
        message,
        details: parsed,
    }
}

/// 解析2xx响应体
pub(crate) fn parse_success_body(text: String) -> ResponseBody {
    if text.is_empty() {
        return ResponseBody::Empty;
    }
    match serde_json::from_str(&text) {
        Ok(value) => ResponseBody::Json(value),
        Err(_) => ResponseBody::Text(text),
    }
}

/// HttpClient 封装对远端API的请求：URL拼接、令牌注入、响应解析
pub struct HttpClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<SessionStore>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn resolve(&self, path: &str, query: &[(&'static str, String)]) -> ApiResult<Url> {
        let raw = build_url(&self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{} ({})", raw, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// 发送请求并解析响应
    pub async fn request(&self, path: &str, options: RequestOptions) -> ApiResult<ResponseBody> {
        let url = self.resolve(path, &options.query)?;
        let mut headers = options.headers;

        if !matches!(options.body, RequestBody::Form(_)) && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        // 每次发送时读取令牌，登出后的请求不会带上旧令牌
        if let Some(token) = self.session.token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => warn!("Stored token is not a valid header value: {}", e),
            }
        }

        debug!("{} {}", options.method, url);

        let builder = self.client.request(options.method, url).headers(headers);
        let builder = match options.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(serde_json::to_vec(&value)?),
            RequestBody::Form(form) => builder.multipart(form),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(ResponseBody::Empty);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            let err = error_from_body(status, &text);
            debug!("Request failed: {}", err);
            return Err(err);
        }

        Ok(parse_success_body(text))
    }

    pub async fn get(&self, path: &str, query: Vec<(&'static str, String)>) -> ApiResult<ResponseBody> {
        self.request(path, RequestOptions::new(Method::GET).query(query)).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<ResponseBody> {
        self.request(path, RequestOptions::new(Method::POST).json(body)?).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<ResponseBody> {
        self.request(path, RequestOptions::new(Method::PUT).json(body)?).await
    }

    pub async fn patch_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<ResponseBody> {
        self.request(path, RequestOptions::new(Method::PATCH).json(body)?).await
    }

    pub async fn put_form(&self, path: &str, form: Form) -> ApiResult<ResponseBody> {
        self.request(path, RequestOptions::new(Method::PUT).form(form)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<ResponseBody> {
        self.request(path, RequestOptions::new(Method::DELETE)).await
    }
}
