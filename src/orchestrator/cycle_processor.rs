//! 单次评分周期处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责一份答卷的完整评分周期，是答卷级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **输入校验**：在任何解析之前检查参考答案和答卷是否齐全
//! 2. **文本提取**：参考答案和答卷都转为纯文本并规整空白
//! 3. **切分题目**：建立参考答案查找表和答卷列表（按重复题号策略去重）
//! 4. **逐题评分**：按答卷中的顺序依次委托 `QuestionFlow`
//! 5. **明细缓存**：周期结束后把逐题明细写入本会话的缓存
//! 6. **统计输出**：记录评分/未匹配数量

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::models::grade::{GradingWarning, StudentRecord};
use crate::models::job::GradingJob;
use crate::models::load_rubric;
use crate::models::question::{AnswerSheet, ReferenceKey};
use crate::parser::{normalize_whitespace, parse_reference_text, parse_student_text};
use crate::services::{DetailCache, ExtractorSet, ScoringOracle};
use crate::workflow::{GradingCtx, QuestionFlow};

/// 周期内的题目统计
#[derive(Debug, Default)]
pub struct CycleStats {
    pub graded: usize,
    pub unmatched: usize,
}

/// 一次评分周期需要的共享能力
#[derive(Clone)]
pub struct CycleServices {
    pub extractors: Arc<ExtractorSet>,
    pub oracle: Arc<dyn ScoringOracle>,
    pub cache: DetailCache,
}

/// 评分一份答卷
///
/// # 参数
/// - `job`: 评分任务（参考答案、答卷、评分细则）
/// - `ctx`: 会话上下文
/// - `services`: 文本提取、评分模型、明细缓存
/// - `config`: 配置
///
/// # 返回
/// 返回该答卷的评分记录。任何提取、解析或模型调用错误都会中止本周期，
/// 此时缓存中只留下本会话的空明细。
pub async fn grade_submission(
    job: &GradingJob,
    ctx: &GradingCtx,
    services: &CycleServices,
    config: &Config,
) -> Result<StudentRecord> {
    let (reference_path, submission_path) = job.validate().map_err(AppError::from)?;

    log_cycle_start(ctx, job);
    services.cache.begin_cycle(ctx.session_id);

    // 参考答案
    let reference_text = services
        .extractors
        .extract_file(reference_path)
        .await
        .with_context(|| format!("无法读取参考答案: {}", reference_path.display()))?;
    let reference_text = normalize_whitespace(&reference_text);
    let key = ReferenceKey::build(parse_reference_text(&reference_text), config.duplicate_policy)
        .map_err(AppError::from)?;
    info!("{} ✓ 参考答案共 {} 道题", ctx, key.len());

    let rubric = load_rubric(job).await?;

    // 学生答卷
    let student_text = services
        .extractors
        .extract_file(submission_path)
        .await
        .with_context(|| format!("无法读取答卷: {}", submission_path.display()))?;
    let student_text = normalize_whitespace(&student_text);
    let sheet = AnswerSheet::build(parse_student_text(&student_text), config.duplicate_policy)
        .map_err(AppError::from)?;
    if sheet.is_empty() {
        warn!("{} ⚠️ 答卷中没有识别到任何题目", ctx);
    } else {
        info!("{} ✓ 答卷共 {} 道题", ctx, sheet.answers().len());
    }

    let mut record = StudentRecord::new(ctx.submission.clone());
    for warning in key.warnings().iter().chain(sheet.warnings()) {
        warn!("{} ⚠️ {}", ctx, warning);
        record.warn(warning.clone());
    }

    // 创建流程对象（只创建一次，复用）
    let question_flow = QuestionFlow::new(
        services.oracle.clone(),
        rubric,
        config.verbose_logging,
    );

    let mut stats = CycleStats::default();

    // ========== 按答卷顺序逐题评分 ==========
    let total = sheet.answers().len();
    for (index, answer) in sheet.answers().iter().enumerate() {
        log_question_start(ctx, index + 1, total);

        let Some(question) = key.get(&answer.number) else {
            let warning = GradingWarning::UnmatchedAnswer {
                number: answer.number.clone(),
            };
            warn!("{} ⚠️ {}", ctx, warning);
            record.warn(warning);
            stats.unmatched += 1;
            continue;
        };

        let detail = question_flow.run(question, answer, ctx).await?;
        record.push(detail);
        stats.graded += 1;
    }

    services
        .cache
        .store(ctx.session_id, &ctx.submission, record.details.clone());

    log_cycle_complete(ctx, &stats, &record);

    Ok(record)
}

// ========== 日志辅助函数 ==========

fn log_cycle_start(ctx: &GradingCtx, job: &GradingJob) {
    info!("{} 开始评分", ctx);
    info!("{} 会话: {}", ctx, ctx.session_id);
    if let Some(path) = &job.file_path {
        info!("{} 任务文件: {}", ctx, path.display());
    }
}

fn log_question_start(ctx: &GradingCtx, question_index: usize, total: usize) {
    info!("\n{} {}", ctx, "─".repeat(30));
    info!("{} 评分第 {}/{} 道题目", ctx, question_index, total);
}

fn log_cycle_complete(ctx: &GradingCtx, stats: &CycleStats, record: &StudentRecord) {
    info!(
        "{} 题目统计: 评分 {}, 未匹配 {}",
        ctx, stats.graded, stats.unmatched
    );
    info!("{} ✅ {}\n", ctx, record.finalize());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::error::{AppResult, InputError};
    use async_trait::async_trait;
    use std::path::Path;

    struct EchoOracle;

    #[async_trait]
    impl ScoringOracle for EchoOracle {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn score(&self, _request: &str) -> AppResult<String> {
            Ok("Score: 1\nOverall Feedback: ok".to_string())
        }
    }

    fn services() -> CycleServices {
        CycleServices {
            extractors: Arc::new(ExtractorSet::plain_text_only()),
            oracle: Arc::new(EchoOracle),
            cache: DetailCache::new(),
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_reference_fails_before_parsing() {
        let job = GradingJob {
            reference: None,
            submission: Some("alice.txt".into()),
            ..Default::default()
        };
        let ctx = GradingCtx::new(1, "alice.txt");

        let err = grade_submission(&job, &ctx, &services(), &Config::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::Input(InputError::MissingReference))
        ));
    }

    #[tokio::test]
    async fn test_unmatched_answer_is_dropped_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write(
            dir.path(),
            "key.txt",
            "Question 1: Define X Points: 2 Reference Answer: x",
        );
        let submission = write(
            dir.path(),
            "alice.txt",
            "Question 1: Student Answer: x Question 9: Student Answer: y",
        );
        let job = GradingJob::new(reference, submission);
        let ctx = GradingCtx::new(1, job.submission_id());
        let services = services();

        let record = grade_submission(&job, &ctx, &services, &Config::default())
            .await
            .unwrap();

        assert_eq!(record.details.len(), 1);
        assert_eq!(record.possible, 2.0);
        assert_eq!(
            record.warnings,
            vec![GradingWarning::UnmatchedAnswer {
                number: "9".to_string()
            }]
        );
        assert_eq!(
            services.cache.get(ctx.session_id, "alice.txt").map(|d| d.len()),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_reject_policy_aborts_on_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write(
            dir.path(),
            "key.txt",
            "Question 1: A Points: 1 Reference Answer: a Question 1: B Points: 1 Reference Answer: b",
        );
        let submission = write(dir.path(), "alice.txt", "Question 1: Student Answer: a");
        let job = GradingJob::new(reference, submission);
        let ctx = GradingCtx::new(1, job.submission_id());
        let config = Config {
            duplicate_policy: DuplicatePolicy::Reject,
            ..Default::default()
        };

        let err = grade_submission(&job, &ctx, &services(), &config)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::Parse(crate::error::ParseError::DuplicateQuestion { .. }))
        ));
    }
}
