use std::path::PathBuf;

use anyhow::Result;
use exam_grader::utils::logging;
use exam_grader::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化应用
    let app = App::initialize(config).await?;

    // 指定了任务文件时只评分这一份，否则扫描任务目录
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(job_file) => {
            let graded = app.run_job_file(&job_file).await?;
            println!("{}", graded.summary());
            if let Some(details) = app.details(graded.session_id, &graded.record.submission) {
                logging::log_details(&graded.record.submission, &details);
            }
        }
        None => {
            let report = app.run().await?;
            for graded in &report.graded {
                println!("{}", graded.summary());
                if let Some(details) = app.details(graded.session_id, &graded.record.submission) {
                    logging::log_details(&graded.record.submission, &details);
                }
            }
        }
    }

    Ok(())
}
