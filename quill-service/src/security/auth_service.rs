use std::sync::Arc;

use quill_api::{AvatarImage, BlogApi, ProfileUpdate};
use quill_domain::content::constant::MAX_IMAGE_BYTES;
use quill_domain::{LoginForm, ProfileForm, RegisterForm, User};
use quill_infra::SessionStore;
use tracing::{info, warn};
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};

/// 认证服务：登录、注册、登出以及当前用户资料
pub struct AuthService {
    api: Arc<dyn BlogApi>,
    session: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(api: Arc<dyn BlogApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// 启动时从存储恢复会话
    pub fn restore(&self) -> Option<User> {
        let session = self.session.restore()?;
        info!("Restored session for {}", session.user.name);
        Some(session.user)
    }

    /// 当前登录用户，未登录时为None
    pub fn current_user(&self) -> Option<User> {
        if self.session.is_authenticated() {
            self.session.user()
        } else {
            None
        }
    }

    pub async fn login(&self, form: &LoginForm) -> ServiceResult<User> {
        form.validate()?;
        let session = self.api.login(form).await?;
        self.session.save(&session);
        Ok(session.user)
    }

    pub async fn register(&self, form: &RegisterForm) -> ServiceResult<User> {
        form.validate()?;
        let session = self.api.register(form).await?;
        self.session.save(&session);
        Ok(session.user)
    }

    /// 清除令牌与用户快照，之后的请求不再带认证头
    pub fn logout(&self) {
        if let Some(user) = self.current_user() {
            info!("Logging out {}", user.id);
        }
        self.session.clear();
    }

    /// 从服务端重新获取当前用户并刷新快照
    ///
    /// 令牌已失效时会话被清除并返回None。
    pub async fn refresh_current_user(&self) -> ServiceResult<Option<User>> {
        let (Some(token), Some(user)) = (self.session.token(), self.session.user()) else {
            return Ok(None);
        };
        match self.api.get_user(&user.id).await {
            Ok(fresh) => {
                self.session.set_user(&fresh);
                Ok(Some(fresh))
            }
            Err(e) if e.is_unauthorized() => {
                warn!("Stored session for {} is no longer valid", user.id);
                self.session.invalidate_token(&token);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 更新自己的资料；只能修改当前登录用户
    pub async fn update_profile(
        &self,
        user_id: &str,
        form: ProfileForm,
        avatar: Option<AvatarImage>,
    ) -> ServiceResult<User> {
        let (Some(token), Some(current)) = (self.session.token(), self.session.user()) else {
            return Err(ServiceError::auth_required("edit your profile"));
        };
        if current.id != user_id {
            return Err(ServiceError::Forbidden(
                "You can only edit your own profile.".to_string(),
            ));
        }
        form.validate()?;
        if let Some(image) = &avatar {
            if image.bytes.len() > MAX_IMAGE_BYTES {
                return Err(ServiceError::InvalidInput(
                    "Please upload an image smaller than 2MB.".to_string(),
                ));
            }
        }

        let update = ProfileUpdate { form, avatar };
        let updated = self
            .api
            .update_user(user_id, update)
            .await
            .map_err(|e| ServiceError::from_write(e, &self.session, &token, "edit your profile"))?;
        self.session.set_user(&updated);
        info!("Profile updated for {}", updated.id);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{status, user, FakeBlogApi, PASSWORD};
    use quill_infra::{HttpClient, RestBlogApi};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn service(api: &Arc<FakeBlogApi>) -> AuthService {
        let api: Arc<dyn BlogApi> = api.clone();
        AuthService::new(api, Arc::new(SessionStore::in_memory()))
    }

    fn login_form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// 测试：登录成功后保存会话
    #[tokio::test]
    async fn test_login_saves_session() {
        let api = Arc::new(FakeBlogApi::new());
        api.add_user(user("user-1", "Aria"));
        let auth = service(&api);

        let logged_in = auth.login(&login_form("user-1@example.com", PASSWORD)).await.unwrap();
        assert_eq!(logged_in.name, "Aria");
        assert_eq!(auth.session().token().as_deref(), Some("token-user-1"));
        assert_eq!(auth.current_user().unwrap().id, "user-1");
    }

    /// 测试：表单不合法时不发请求
    #[tokio::test]
    async fn test_invalid_form_is_rejected_locally() {
        let api = Arc::new(FakeBlogApi::new());
        let auth = service(&api);

        let err = auth.login(&login_form("not-an-email", PASSWORD)).await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid email format");

        let register = RegisterForm {
            name: "Aria".to_string(),
            email: "aria@example.com".to_string(),
            password: "123".to_string(),
            confirm_password: "123".to_string(),
        };
        let err = auth.register(&register).await.unwrap_err();
        assert_eq!(err.user_message(), "Password must be at least 6 characters");
        assert!(api.calls().is_empty());
    }

    /// 测试：错误密码显示服务端消息
    #[tokio::test]
    async fn test_login_failure_message() {
        let api = Arc::new(FakeBlogApi::new());
        api.add_user(user("user-1", "Aria"));
        let auth = service(&api);

        let err = auth.login(&login_form("user-1@example.com", "wrong")).await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid email or password");
        assert!(auth.current_user().is_none());
    }

    /// 测试：注册后直接登录
    #[tokio::test]
    async fn test_register_starts_session() {
        let api = Arc::new(FakeBlogApi::new());
        let auth = service(&api);
        let form = RegisterForm {
            name: "Noor".to_string(),
            email: "noor@example.com".to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
        };
        let created = auth.register(&form).await.unwrap();
        assert_eq!(auth.current_user().unwrap(), created);
    }

    /// 测试：只能修改自己的资料，头像大小有上限
    #[tokio::test]
    async fn test_update_profile_rules() {
        let api = Arc::new(FakeBlogApi::new());
        api.add_user(user("user-1", "Aria"));
        api.add_user(user("user-2", "Ben"));
        let auth = service(&api);

        let form = ProfileForm {
            name: "Aria M".to_string(),
            bio: Some("Writes about Rust".to_string()),
        };
        let err = auth.update_profile("user-1", form.clone(), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::AuthRequired(_)));

        auth.login(&login_form("user-1@example.com", PASSWORD)).await.unwrap();
        let err = auth.update_profile("user-2", form.clone(), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let huge = AvatarImage::png(vec![0; MAX_IMAGE_BYTES + 1]);
        let err = auth.update_profile("user-1", form.clone(), Some(huge)).await.unwrap_err();
        assert_eq!(err.user_message(), "Please upload an image smaller than 2MB.");

        let short = ProfileForm {
            name: "A".to_string(),
            bio: None,
        };
        let err = auth.update_profile("user-1", short, None).await.unwrap_err();
        assert_eq!(err.user_message(), "Name must be at least 2 characters.");

        let avatar = AvatarImage::png(vec![1, 2, 3]);
        let updated = auth.update_profile("user-1", form, Some(avatar)).await.unwrap();
        assert_eq!(updated.name, "Aria M");
        assert_eq!(auth.current_user().unwrap().bio, "Writes about Rust");
        assert!(!auth.current_user().unwrap().avatar_url.is_empty());
    }

    /// 测试：刷新当前用户时401清除会话
    #[tokio::test]
    async fn test_refresh_current_user_unauthorized() {
        let api = Arc::new(FakeBlogApi::new());
        api.add_user(user("user-1", "Aria"));
        let auth = service(&api);
        auth.login(&login_form("user-1@example.com", PASSWORD)).await.unwrap();

        api.fail_next(status(401, "Token expired"));
        assert!(auth.refresh_current_user().await.unwrap().is_none());
        assert!(auth.current_user().is_none());
    }

    /// 测试：登出后发出的请求不带Authorization头
    #[tokio::test]
    async fn test_logout_drops_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user": { "id": "user-1", "name": "Aria" },
                "token": "jwt-123"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/posts/post-01"))
            .and(header("Authorization", "Bearer jwt-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "post-01", "title": "Hello", "content": "Body", "authorId": "user-1",
                "createdAt": "2024-01-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/posts/post-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "post-01", "title": "Hello", "content": "Body", "authorId": "user-1",
                "createdAt": "2024-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let session = Arc::new(SessionStore::in_memory());
        let http = Arc::new(HttpClient::new(&server.uri(), Duration::from_secs(5), session.clone()).unwrap());
        let api: Arc<dyn BlogApi> = Arc::new(RestBlogApi::new(http));
        let auth = AuthService::new(api.clone(), session);

        auth.login(&login_form("aria@example.com", "secret1")).await.unwrap();
        api.get_post("post-01").await.unwrap();
        auth.logout();
        api.get_post("post-01").await.unwrap();

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let last = requests.last().unwrap();
        assert!(last.headers.get("Authorization").is_none());
    }
}
