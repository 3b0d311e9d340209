use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// 一次评分任务：参考答案 + 一份学生答卷 + 可选评分细则
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradingJob {
    #[serde(default)]
    pub reference: Option<PathBuf>,
    #[serde(default)]
    pub submission: Option<PathBuf>,
    /// 直接写在任务文件中的评分细则
    #[serde(default)]
    pub rubric: Option<String>,
    /// 评分细则文件（相对路径相对于任务文件所在目录）
    #[serde(default)]
    pub rubric_file: Option<PathBuf>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<PathBuf>,
}

impl GradingJob {
    pub fn new(reference: impl Into<PathBuf>, submission: impl Into<PathBuf>) -> Self {
        Self {
            reference: Some(reference.into()),
            submission: Some(submission.into()),
            ..Default::default()
        }
    }

    pub fn with_rubric(mut self, rubric: impl Into<String>) -> Self {
        self.rubric = Some(rubric.into());
        self
    }

    /// 校验输入：两份文档都必须提供且文件名非空
    pub fn validate(&self) -> Result<(&Path, &Path), InputError> {
        let reference = self
            .reference
            .as_deref()
            .ok_or(InputError::MissingReference)?;
        if file_name_is_blank(reference) {
            return Err(InputError::EmptyFilename { role: "reference" });
        }

        let submission = self
            .submission
            .as_deref()
            .ok_or(InputError::MissingSubmission)?;
        if file_name_is_blank(submission) {
            return Err(InputError::EmptyFilename { role: "submission" });
        }

        Ok((reference, submission))
    }

    /// 学生答卷的标识（文件名）
    pub fn submission_id(&self) -> String {
        self.submission
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// 以任务文件所在目录为基准解析相对路径
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.reference = self.reference.map(resolve);
        self.submission = self.submission.map(resolve);
        self.rubric_file = self.rubric_file.map(resolve);
        self
    }
}

fn file_name_is_blank(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().trim().is_empty())
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_missing_reference() {
        let job = GradingJob {
            submission: Some(PathBuf::from("alice.txt")),
            ..Default::default()
        };
        assert!(matches!(job.validate(), Err(InputError::MissingReference)));
    }

    #[test]
    fn test_validate_missing_submission() {
        let job = GradingJob {
            reference: Some(PathBuf::from("key.txt")),
            ..Default::default()
        };
        assert!(matches!(job.validate(), Err(InputError::MissingSubmission)));
    }

    #[test]
    fn test_validate_blank_filename() {
        let job = GradingJob::new("key.txt", "");
        assert!(matches!(
            job.validate(),
            Err(InputError::EmptyFilename { role: "submission" })
        ));
    }

    #[test]
    fn test_submission_id_is_file_name() {
        let job = GradingJob::new("exam/key.txt", "exam/students/alice.txt");
        assert!(job.validate().is_ok());
        assert_eq!(job.submission_id(), "alice.txt");
    }

    #[test]
    fn test_resolve_relative_to() {
        let job = GradingJob::new("key.txt", "/abs/alice.txt").resolve_relative_to(Path::new("/jobs"));
        assert_eq!(job.reference.unwrap(), PathBuf::from("/jobs/key.txt"));
        assert_eq!(job.submission.unwrap(), PathBuf::from("/abs/alice.txt"));
    }
}
