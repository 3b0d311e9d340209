//! 告警写入服务 - 业务能力层
//!
//! 只负责"把降级评分的告警追加写入 warn.txt"，不关心流程

use std::fs::OpenOptions;
use std::io::Write;

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::grade::GradingWarning;

/// 告警写入服务
///
/// 职责：
/// - 将评分过程中的告警逐行写入 warn.txt
/// - 每行带上答卷标识，方便人工复核
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 使用指定的文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    /// 写入一份答卷的全部告警
    ///
    /// # 参数
    /// - `submission`: 答卷标识
    /// - `warnings`: 告警列表，为空时不写文件
    pub fn write(&self, submission: &str, warnings: &[GradingWarning]) -> AppResult<()> {
        if warnings.is_empty() {
            return Ok(());
        }

        debug!(
            "写入告警: 答卷 {} | {} 条",
            submission,
            warnings.len()
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .map_err(|e| AppError::file_write_failed(&self.warn_file_path, e))?;

        let lines: String = warnings
            .iter()
            .map(|w| format!("答卷 {} | {}\n", submission, w))
            .collect();

        file.write_all(lines.as_bytes())
            .map_err(|e| AppError::file_write_failed(&self.warn_file_path, e))?;

        Ok(())
    }
}
