/// 保存令牌的键
pub const TOKEN_KEY: &str = "token";
/// 保存用户快照（JSON）的键
pub const USER_KEY: &str = "loggedInUser";

/// SessionStorage trait 定义会话级键值存储
///
/// 存储的生命周期等同于一次客户端会话；写入失败只记录日志，不影响调用方。
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}
