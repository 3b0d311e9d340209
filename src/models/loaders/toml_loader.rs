use crate::error::{AppError, FileError};
use crate::models::job::GradingJob;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载一个评分任务
///
/// 任务中的相对路径以任务文件所在目录为基准。
pub async fn load_toml_to_grading_job(toml_file_path: &Path) -> Result<GradingJob> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(toml_file_path.display().to_string(), e))?;

    let job: GradingJob = toml::from_str(&content).map_err(|source| {
        AppError::from(FileError::TomlParseFailed {
            path: toml_file_path.display().to_string(),
            source,
        })
    })?;

    let base = toml_file_path.parent().unwrap_or_else(|| Path::new("."));
    let mut job = job.resolve_relative_to(base);

    // 设置文件路径
    job.file_path = Some(toml_file_path.to_path_buf());

    Ok(job)
}

/// 从文件夹中加载所有 TOML 任务文件（按文件名排序）
pub async fn load_all_toml_files(folder_path: &str) -> Result<Vec<GradingJob>> {
    let folder = PathBuf::from(folder_path);

    if !folder.is_dir() {
        return Err(AppError::from(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        })
        .into());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut jobs = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_toml_to_grading_job(&path).await {
            Ok(job) => jobs.push(job),
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(jobs)
}

/// 读取任务的评分细则：`rubric` 与 `rubric_file` 同时存在时以 `rubric` 为准
pub async fn load_rubric(job: &GradingJob) -> Result<String> {
    if let Some(rubric) = &job.rubric {
        return Ok(rubric.clone());
    }
    match &job.rubric_file {
        Some(path) => fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取评分细则: {}", path.display())),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_job_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = dir.path().join("midterm.toml");
        std::fs::write(
            &job_path,
            "reference = \"key.txt\"\nsubmission = \"students/alice.txt\"\nrubric = \"Be fair\"\n",
        )
        .unwrap();

        let job = load_toml_to_grading_job(&job_path).await.unwrap();
        assert_eq!(job.reference.as_deref(), Some(dir.path().join("key.txt").as_path()));
        assert_eq!(job.submission_id(), "alice.txt");
        assert_eq!(job.file_path.as_deref(), Some(job_path.as_path()));
        assert_eq!(load_rubric(&job).await.unwrap(), "Be fair");
    }

    #[tokio::test]
    async fn test_load_all_skips_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), "reference = \"k.txt\"\nsubmission = \"s.txt\"\n").unwrap();
        std::fs::write(dir.path().join("b.toml"), "reference = [").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let jobs = load_all_toml_files(dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].submission_id(), "s.txt");
    }

    #[tokio::test]
    async fn test_rubric_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rubric.md"), "Award 1 point per cause").unwrap();
        let job_path = dir.path().join("job.toml");
        std::fs::write(
            &job_path,
            "reference = \"k.txt\"\nsubmission = \"s.txt\"\nrubric_file = \"rubric.md\"\n",
        )
        .unwrap();

        let job = load_toml_to_grading_job(&job_path).await.unwrap();
        assert_eq!(load_rubric(&job).await.unwrap(), "Award 1 point per cause");
    }

    #[tokio::test]
    async fn test_missing_folder_is_directory_not_found() {
        let err = load_all_toml_files("/definitely/not/here").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::File(FileError::DirectoryNotFound { path })) if path == "/definitely/not/here"
        ));
    }

    #[tokio::test]
    async fn test_malformed_job_is_toml_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = dir.path().join("broken.toml");
        std::fs::write(&job_path, "reference = [").unwrap();

        let err = load_toml_to_grading_job(&job_path).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::File(FileError::TomlParseFailed { .. }))
        ));
    }
}
