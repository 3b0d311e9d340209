//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量评分和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量评分处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载任务（Vec<GradingJob>）
//! - 控制并发数量（Semaphore）
//! - 写出报告、告警文件和运行日志
//! - 输出全局统计信息
//!
//! ### `cycle_processor` - 单次评分周期处理器
//! - 提取并切分参考答案和答卷
//! - 遍历答卷中的所有题目
//! - 创建并复用 QuestionFlow
//! - 写入明细缓存
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<GradingJob>)
//!     ↓
//! cycle_processor (处理一份答卷的 Vec<StudentAnswer>)
//!     ↓
//! workflow::QuestionFlow (处理单道题)
//!     ↓
//! services (能力层：extract / classify / llm / parse / cache / warn / report)
//! ```

pub mod batch_processor;
pub mod cycle_processor;

// 重新导出主要类型
pub use batch_processor::{App, GradedSubmission, RunReport};
pub use cycle_processor::{grade_submission, CycleServices, CycleStats};
