//! 评分会话上下文
//!
//! 封装"我正在为哪一次评分、哪一份答卷打分"这一信息，显式地在流程中传递

use std::fmt::Display;

use uuid::Uuid;

/// 评分会话上下文
///
/// 一个评分周期（一份参考答案 + 一份答卷）对应一个会话
#[derive(Debug, Clone)]
pub struct GradingCtx {
    /// 会话ID，明细缓存按它隔离
    pub session_id: Uuid,

    /// 任务索引（仅用于日志显示）
    pub job_index: usize,

    /// 答卷标识（文件名）
    pub submission: String,
}

impl GradingCtx {
    /// 创建新的会话上下文，会话ID随机生成
    pub fn new(job_index: usize, submission: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            job_index,
            submission: submission.into(),
        }
    }
}

impl Display for GradingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[答卷 {} #{}]", self.submission, self.job_index)
    }
}
