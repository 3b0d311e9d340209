//! 评分报告写入服务 - 业务能力层
//!
//! 每份答卷输出一个 JSON 报告：汇总 + 逐题明细 + 告警

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::grade::{GradingWarning, QuestionDetail, StudentRecord, StudentSummary};

/// JSON 报告结构
#[derive(Debug, Serialize)]
pub struct GradingReport<'a> {
    pub session: Uuid,
    pub graded_at: String,
    pub summary: StudentSummary,
    pub details: &'a [QuestionDetail],
    pub warnings: Vec<GradingWarning>,
}

impl<'a> GradingReport<'a> {
    pub fn new(session: Uuid, record: &'a StudentRecord) -> Self {
        Self {
            session,
            graded_at: chrono::Local::now().to_rfc3339(),
            summary: record.finalize(),
            details: &record.details,
            warnings: record.all_warnings(),
        }
    }
}

/// 报告写入服务
pub struct ReportWriter {
    output_folder: PathBuf,
}

impl ReportWriter {
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
        }
    }

    /// 报告文件路径：`<输出目录>/<答卷文件名去扩展名>-<任务序号>.json`
    ///
    /// 不同目录下的同名答卷按任务序号区分，互不覆盖。
    pub fn report_path(&self, submission: &str, job_index: usize) -> PathBuf {
        let stem = Path::new(submission)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "submission".to_string());
        self.output_folder.join(format!("{}-{}.json", stem, job_index))
    }

    /// 写入报告，返回文件路径
    pub async fn write(
        &self,
        session: Uuid,
        job_index: usize,
        record: &StudentRecord,
    ) -> AppResult<PathBuf> {
        let report = GradingReport::new(session, record);
        let json = serde_json::to_string_pretty(&report).map_err(|e| {
            AppError::file_write_failed(
                record.submission.clone(),
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;

        let folder = self.output_folder.display().to_string();
        tokio::fs::create_dir_all(&self.output_folder)
            .await
            .map_err(|e| AppError::file_write_failed(folder, e))?;

        let path = self.report_path(&record.submission, job_index);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        debug!("评分报告已写入: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grade::GradeOutcome;
    use crate::models::question::QuestionKind;

    #[test]
    fn test_report_path_uses_file_stem_and_job_index() {
        let writer = ReportWriter::new("results");
        assert_eq!(writer.report_path("alice.pdf", 1), PathBuf::from("results/alice-1.json"));
        assert_eq!(writer.report_path("", 3), PathBuf::from("results/submission-3.json"));
        assert_ne!(writer.report_path("answers.txt", 1), writer.report_path("answers.txt", 2));
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("out"));

        let mut record = StudentRecord::new("alice.txt");
        record.push(QuestionDetail {
            number: "1".to_string(),
            question_text: "What is 2+2?".to_string(),
            outcome: GradeOutcome {
                score: 10.0,
                feedback: "correct".to_string(),
            },
            points: 10.0,
            kind: QuestionKind::OpenEnded,
            warnings: Vec::new(),
        });

        let path = writer.write(Uuid::new_v4(), 1, &record).await.unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["summary"]["percent"], 100.0);
        assert_eq!(json["details"][0]["outcome"]["feedback"], "correct");
        assert_eq!(json["details"][0]["kind"], "open_ended");
    }
}
