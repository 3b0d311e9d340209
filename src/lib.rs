//! # Exam Grader
//!
//! 一个用 LLM 给学生答卷逐题打分的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 解析层（Parser）
//! - `parser/` - 把提取出的纯文本切分成题目
//! - `lexer` - 识别 `Question N`、`Points: N`、`Reference Answer:`、`Student Answer:` 标记
//! - `segmenter` - 状态机按题号分块，组装参考答案和学生答案
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个能力
//! - `ExtractorSet` - 文档转文本（纯文本 / Azure OCR）
//! - `classify` + `GradingStrategy` - 题型判断和评分请求构建
//! - `LlmService` - 评分模型调用能力
//! - `parse_oracle_reply` - 回复解析
//! - `DetailCache` / `WarnWriter` / `ReportWriter` - 明细缓存、告警、报告
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整评分流程
//! - `GradingCtx` - 会话上下文（会话ID + 答卷标识）
//! - `QuestionFlow` - 流程编排（classify → request → LLM → parse）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量评分处理器，管理资源和并发
//! - `orchestrator/cycle_processor` - 单次评分周期，遍历答卷题目

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, DuplicatePolicy};
pub use error::{AppError, AppResult};
pub use models::{
    GradingJob, GradingWarning, QuestionDetail, QuestionKind, ReferenceQuestion, StudentAnswer,
    StudentRecord, StudentSummary,
};
pub use orchestrator::{grade_submission, App, CycleServices, GradedSubmission, RunReport};
pub use services::{DetailCache, DocumentExtractor, ExtractorSet, ScoringOracle};
pub use workflow::{GradingCtx, QuestionFlow};
