use serde::{Deserialize, Serialize};

/// 当前用户对一篇文章的点赞状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,

    /// 点赞总数，来自文章的 likes 字段或点赞接口的返回值
    #[serde(default)]
    pub count: u64,
}

impl LikeStatus {
    pub fn new(liked: bool, count: u64) -> Self {
        Self { liked, count }
    }

    /// 切换后应提交给服务端的目标状态
    pub fn toggled(&self) -> bool {
        !self.liked
    }

    /// 应用服务端返回的最新计数
    pub fn apply_toggle(&mut self, updated_count: u64) {
        self.liked = !self.liked;
        self.count = updated_count;
    }
}
