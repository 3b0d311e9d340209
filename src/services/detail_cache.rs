//! 评分明细缓存
//!
//! 以 (会话ID, 答卷标识) 为键保存逐题明细。每个评分周期开始时只清空本会话的数据，
//! 多个会话可以并发写入而互不覆盖。
//!
//! 缓存最多保留 `max_sessions` 个会话，超出时按开始顺序淘汰最早的会话。

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::models::grade::QuestionDetail;

/// 默认保留的会话数
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

#[derive(Debug, Default)]
struct CacheInner {
    sessions: HashMap<Uuid, HashMap<String, Vec<QuestionDetail>>>,
    /// 会话的开始顺序，用于淘汰
    order: VecDeque<Uuid>,
    /// 每份答卷最近一次写入所在的会话
    latest: HashMap<String, Uuid>,
}

impl CacheInner {
    /// 登记会话；新会话超出上限时淘汰最早的会话
    fn track(&mut self, session: Uuid, max_sessions: usize) {
        if self.order.contains(&session) {
            return;
        }
        self.order.push_back(session);
        while self.order.len() > max_sessions {
            let Some(evicted) = self.order.pop_front() else {
                break;
            };
            self.sessions.remove(&evicted);
            self.latest.retain(|_, owner| *owner != evicted);
        }
    }
}

/// 评分明细缓存（可 clone，内部共享）
#[derive(Debug, Clone)]
pub struct DetailCache {
    inner: Arc<RwLock<CacheInner>>,
    max_sessions: usize,
}

impl Default for DetailCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailCache {
    pub fn new() -> Self {
        Self::with_max_sessions(DEFAULT_MAX_SESSIONS)
    }

    /// 指定最多保留的会话数（至少 1）
    pub fn with_max_sessions(max_sessions: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            max_sessions: max_sessions.max(1),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 开始新的评分周期：清空该会话已有的明细
    pub fn begin_cycle(&self, session: Uuid) {
        let mut inner = self.write();
        inner.sessions.insert(session, HashMap::new());
        inner.latest.retain(|_, owner| *owner != session);
        inner.track(session, self.max_sessions);
    }

    /// 保存一份答卷的逐题明细
    pub fn store(&self, session: Uuid, submission: &str, details: Vec<QuestionDetail>) {
        let mut inner = self.write();
        inner.track(session, self.max_sessions);
        inner
            .sessions
            .entry(session)
            .or_default()
            .insert(submission.to_string(), details);
        inner.latest.insert(submission.to_string(), session);
    }

    /// 按会话和答卷标识查询明细；本周期未评分过则返回 `None`
    pub fn get(&self, session: Uuid, submission: &str) -> Option<Vec<QuestionDetail>> {
        self.read()
            .sessions
            .get(&session)
            .and_then(|by_submission| by_submission.get(submission))
            .cloned()
    }

    /// 查询某份答卷最近一次的评分明细
    pub fn latest(&self, submission: &str) -> Option<Vec<QuestionDetail>> {
        let inner = self.read();
        let session = inner.latest.get(submission)?;
        inner
            .sessions
            .get(session)
            .and_then(|by_submission| by_submission.get(submission))
            .cloned()
    }
}
