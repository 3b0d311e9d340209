//! 批量评分处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量评分任务的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、创建评分模型客户端和文本提取器
//! 2. **批量加载**：扫描并加载所有待评分的任务（`Vec<GradingJob>`）
//! 3. **并发控制**：使用 Semaphore 限制同时评分的答卷数量
//! 4. **分批处理**：将任务分批次处理，每批完成后再开始下一批
//! 5. **结果输出**：每份答卷写 JSON 报告、告警文件和运行日志
//! 6. **全局统计**：汇总所有答卷的评分结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单道题目的细节
//! - **会话隔离**：每个任务一个会话ID，明细缓存按会话隔离
//! - **向下委托**：委托 cycle_processor 评分单份答卷

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::grade::{QuestionDetail, StudentRecord, StudentSummary};
use crate::models::job::GradingJob;
use crate::models::{load_all_toml_files, load_toml_to_grading_job};
use crate::orchestrator::cycle_processor::{self, CycleServices};
use crate::services::{
    DetailCache, ExtractorSet, LlmService, ReportWriter, ScoringOracle, WarnWriter,
};
use crate::utils::logging;
use crate::workflow::GradingCtx;

/// 一份答卷的评分结果
#[derive(Debug, Clone)]
pub struct GradedSubmission {
    pub session_id: Uuid,
    pub job_index: usize,
    pub record: StudentRecord,
    pub report_path: PathBuf,
}

impl GradedSubmission {
    pub fn summary(&self) -> StudentSummary {
        self.record.finalize()
    }
}

/// 一次运行的全部结果
#[derive(Debug, Default)]
pub struct RunReport {
    pub graded: Vec<GradedSubmission>,
    pub failed: usize,
    pub total: usize,
}

/// 任务执行所需的共享资源（可在并发任务间 clone）
#[derive(Clone)]
struct JobRunner {
    config: Arc<Config>,
    services: CycleServices,
    warn_writer: Arc<WarnWriter>,
    report_writer: Arc<ReportWriter>,
}

impl JobRunner {
    /// 评分一个任务并写出报告、告警和日志
    async fn run(&self, job: GradingJob, job_index: usize) -> Result<GradedSubmission> {
        let ctx = GradingCtx::new(job_index, job.submission_id());

        let record =
            cycle_processor::grade_submission(&job, &ctx, &self.services, &self.config).await?;

        let report_path = self
            .report_writer
            .write(ctx.session_id, job_index, &record)
            .await?;
        info!("{} 📄 报告已写入: {}", ctx, report_path.display());

        let warnings = record.all_warnings();
        if !warnings.is_empty() {
            warn!("{} ⚠️ 共 {} 条告警，已写入 {}", ctx, warnings.len(), self.config.warn_file);
        }
        self.warn_writer.write(&record.submission, &warnings)?;

        if let Err(e) = logging::append_summary(&self.config.output_log_file, &record.finalize()) {
            warn!("{} 写入运行日志失败: {}", ctx, e);
        }

        Ok(GradedSubmission {
            session_id: ctx.session_id,
            job_index,
            record,
            report_path,
        })
    }
}

/// 应用主结构
pub struct App {
    runner: JobRunner,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        logging::log_startup(config.max_concurrent_jobs);

        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未设置 OPENAI_API_KEY，评分请求可能被拒绝");
        }
        if config.ocr_configured() {
            info!("🔍 已启用 OCR 文本提取: {}", config.ocr_api_version);
        } else {
            info!("📄 未配置 OCR，只能处理纯文本文件");
        }

        let oracle: Arc<dyn ScoringOracle> = Arc::new(LlmService::new(&config));
        let extractors = ExtractorSet::from_config(&config);

        Ok(Self::with_components(config, oracle, extractors))
    }

    /// 使用给定的评分模型和提取器创建应用（不写日志文件）
    pub fn with_components(
        config: Config,
        oracle: Arc<dyn ScoringOracle>,
        extractors: ExtractorSet,
    ) -> Self {
        let warn_writer = WarnWriter::with_path(config.warn_file.clone());
        let report_writer = ReportWriter::new(config.output_folder.clone());

        Self {
            runner: JobRunner {
                config: Arc::new(config),
                services: CycleServices {
                    extractors: Arc::new(extractors),
                    oracle,
                    cache: DetailCache::new(),
                },
                warn_writer: Arc::new(warn_writer),
                report_writer: Arc::new(report_writer),
            },
        }
    }

    pub fn config(&self) -> &Config {
        &self.runner.config
    }

    /// 运行应用主逻辑：评分任务目录中的全部任务
    pub async fn run(&self) -> Result<RunReport> {
        // 加载所有待评分的任务
        let all_jobs = self.load_jobs().await?;

        if all_jobs.is_empty() {
            warn!("⚠️ 没有找到待评分的TOML文件，程序结束");
            return Ok(RunReport::default());
        }

        logging::log_jobs_loaded(all_jobs.len(), self.max_concurrent());

        let report = self.process_all_jobs(all_jobs).await?;

        self.print_final_stats(&report);

        Ok(report)
    }

    /// 评分单个任务文件
    pub async fn run_job_file(&self, path: &Path) -> Result<GradedSubmission> {
        info!("\n📁 正在加载任务: {}", path.display());
        let job = load_toml_to_grading_job(path).await?;
        self.grade(job, 1).await
    }

    /// 直接评分一个任务
    pub async fn grade(&self, job: GradingJob, job_index: usize) -> Result<GradedSubmission> {
        self.runner.run(job, job_index).await
    }

    /// 按会话查询逐题明细
    pub fn details(&self, session_id: Uuid, submission: &str) -> Option<Vec<QuestionDetail>> {
        self.runner.services.cache.get(session_id, submission)
    }

    /// 查询某份答卷最近一次的逐题明细
    pub fn latest_details(&self, submission: &str) -> Option<Vec<QuestionDetail>> {
        self.runner.services.cache.latest(submission)
    }

    /// 加载任务
    async fn load_jobs(&self) -> Result<Vec<GradingJob>> {
        info!("\n📁 正在扫描待评分的任务...");
        load_all_toml_files(&self.runner.config.jobs_folder).await
    }

    fn max_concurrent(&self) -> usize {
        self.runner.config.max_concurrent_jobs.max(1)
    }

    /// 处理所有任务
    pub async fn process_all_jobs(&self, all_jobs: Vec<GradingJob>) -> Result<RunReport> {
        let max_concurrent = self.max_concurrent();
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let total_jobs = all_jobs.len();
        let mut report = RunReport {
            total: total_jobs,
            ..Default::default()
        };

        // 分批处理
        let total_batches = total_jobs.div_ceil(max_concurrent);
        for (batch_idx, batch_jobs) in all_jobs.chunks(max_concurrent).enumerate() {
            let batch_start = batch_idx * max_concurrent;
            let batch_num = batch_idx + 1;

            log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_start + batch_jobs.len(),
                total_jobs,
            );

            // 处理本批
            let batch_result = self
                .process_batch(batch_jobs, batch_start, semaphore.clone())
                .await?;

            log_batch_complete(batch_num, &batch_result);

            report.failed += batch_result.failed;
            report.graded.extend(batch_result.graded);
        }

        report.graded.sort_by_key(|g| g.job_index);
        Ok(report)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch_jobs: &[GradingJob],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut job_indices = Vec::new();
        let mut batch_handles = Vec::new();

        // 为本批创建并发任务
        for (idx, job) in batch_jobs.iter().enumerate() {
            let job_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;

            let runner = self.runner.clone();
            let job = job.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                runner.run(job, job_index).await
            });
            job_indices.push(job_index);
            batch_handles.push(handle);
        }

        // 等待本批所有任务完成
        let mut result = BatchResult::default();

        let outcomes = join_all(batch_handles).await;
        for (job_index, outcome) in job_indices.into_iter().zip(outcomes) {
            match outcome {
                Ok(Ok(graded)) => {
                    result.graded.push(graded);
                }
                Ok(Err(e)) => {
                    error!("[任务 {}] ❌ 评分过程中发生错误: {:#}", job_index, e);
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[任务 {}] 任务执行失败: {}", job_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }

    /// 输出最终统计
    fn print_final_stats(&self, report: &RunReport) {
        let summaries: Vec<StudentSummary> =
            report.graded.iter().map(GradedSubmission::summary).collect();
        logging::print_final_stats(
            &summaries,
            report.failed,
            report.total,
            &self.runner.config.output_log_file,
        );
    }
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    graded: Vec<GradedSubmission>,
    failed: usize,
}

// ========== 日志辅助函数 ==========

fn log_batch_start(batch_num: usize, total_batches: usize, start: usize, end: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始评分第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批任务: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(batch_num: usize, result: &BatchResult) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 第 {} 批完成: 成功 {}/{}",
        batch_num,
        result.graded.len(),
        result.graded.len() + result.failed
    );
    info!("{}", "─".repeat(60));
}
