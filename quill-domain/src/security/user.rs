use serde::{Deserialize, Serialize};
use validator::Validate;

/// User实体
///
/// 服务端可能省略部分字段，缺失时使用空字符串，与会话中缓存的用户快照保持一致。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(rename = "avatarUrl", default)]
    pub avatar_url: String,

    #[serde(default)]
    pub bio: String,
}

impl User {
    /// 用于头像缺失时显示的首字母
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }

    pub fn to_profile_form(&self) -> ProfileForm {
        ProfileForm {
            name: self.name.clone(),
            bio: if self.bio.is_empty() { None } else { Some(self.bio.clone()) },
        }
    }
}

/// 资料编辑表单，头像以二进制单独提交
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct ProfileForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub name: String,

    #[validate(length(max = 200, message = "Bio cannot exceed 200 characters."))]
    pub bio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_defaults_missing_fields() {
        let user: User = serde_json::from_value(json!({ "id": "user-1", "name": "Aria Montgomery" })).unwrap();
        assert_eq!(user.email, "");
        assert_eq!(user.avatar_url, "");
        assert_eq!(user.initials(), "AM");
    }

    #[test]
    fn test_user_snapshot_roundtrip_uses_camel_case() {
        let user = User {
            id: "user-2".to_string(),
            name: "Ezra Fitz".to_string(),
            email: "ezra.f@example.com".to_string(),
            avatar_url: "https://i.pravatar.cc/150?u=user-2".to_string(),
            bio: String::new(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["avatarUrl"], "https://i.pravatar.cc/150?u=user-2");
    }

    #[test]
    fn test_profile_form_validation() {
        let form = ProfileForm { name: "A".to_string(), bio: Some("x".repeat(201)) };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("bio"));

        let user = User { id: "u".to_string(), name: "Aria".to_string(), ..Default::default() };
        assert!(user.to_profile_form().validate().is_ok());
        assert!(user.to_profile_form().bio.is_none());
    }
}
