use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 同一文档中出现重复题号时的处理策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// 保留第一次出现的题目，后续重复项丢弃并告警
    #[default]
    KeepFirst,
    /// 保留最后一次出现的题目（后者覆盖前者）并告警
    KeepLast,
    /// 出现重复题号直接报错
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep-first" | "keep_first" | "first" => Ok(DuplicatePolicy::KeepFirst),
            "keep-last" | "keep_last" | "last" => Ok(DuplicatePolicy::KeepLast),
            "reject" | "error" => Ok(DuplicatePolicy::Reject),
            other => Err(ConfigError::EnvVarParseFailed {
                var_name: "DUPLICATE_POLICY".to_string(),
                value: other.to_string(),
                expected_type: "keep-first | keep-last | reject".to_string(),
            }),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时评分的作业数量
    pub max_concurrent_jobs: usize,
    /// 评分任务（TOML）存放目录
    pub jobs_folder: String,
    /// 评分报告输出目录
    pub output_folder: String,
    /// 告警文件
    pub warn_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 重复题号策略
    pub duplicate_policy: DuplicatePolicy,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    // --- OCR 配置 ---
    pub ocr_endpoint: Option<String>,
    pub ocr_key: Option<String>,
    pub ocr_api_version: String,
    pub ocr_poll_interval_ms: u64,
    pub ocr_max_polls: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            jobs_folder: "jobs".to_string(),
            output_folder: "results".to_string(),
            warn_file: "warn.txt".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            duplicate_policy: DuplicatePolicy::default(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.0,
            llm_max_tokens: 256,
            ocr_endpoint: None,
            ocr_key: None,
            ocr_api_version: "2023-07-31".to_string(),
            ocr_poll_interval_ms: 1000,
            ocr_max_polls: 60,
        }
    }
}

impl Config {
    /// 从环境变量读取配置（会先加载 `.env` 文件）
    ///
    /// 数值类配置解析失败时使用默认值；`DUPLICATE_POLICY` 写错时返回错误，
    /// 避免悄悄换成另一种去重策略。
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let default = Self::default();
        let duplicate_policy = duplicate_policy_from_env(default.duplicate_policy)?;
        Ok(Self {
            max_concurrent_jobs: std::env::var("MAX_CONCURRENT_JOBS").ok().and_then(|v| v.parse().ok()).filter(|v| *v > 0).unwrap_or(default.max_concurrent_jobs),
            jobs_folder: std::env::var("JOBS_FOLDER").unwrap_or(default.jobs_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            warn_file: std::env::var("WARN_FILE").unwrap_or(default.warn_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            duplicate_policy,
            llm_api_key: std::env::var("OPENAI_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("OPENAI_API_BASE").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("OPENAI_MODEL").unwrap_or(default.llm_model_name),
            llm_temperature: std::env::var("OPENAI_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_temperature),
            llm_max_tokens: std::env::var("OPENAI_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_tokens),
            ocr_endpoint: std::env::var("FORM_RECOGNIZER_ENDPOINT").ok().filter(|v| !v.trim().is_empty()),
            ocr_key: std::env::var("FORM_RECOGNIZER_KEY").ok().filter(|v| !v.trim().is_empty()),
            ocr_api_version: std::env::var("FORM_RECOGNIZER_API_VERSION").unwrap_or(default.ocr_api_version),
            ocr_poll_interval_ms: std::env::var("OCR_POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.ocr_poll_interval_ms),
            ocr_max_polls: std::env::var("OCR_MAX_POLLS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.ocr_max_polls),
        })
    }

    /// OCR 服务是否已配置
    pub fn ocr_configured(&self) -> bool {
        self.ocr_endpoint.is_some() && self.ocr_key.is_some()
    }
}

/// 读取 `DUPLICATE_POLICY`，未设置或为空时使用默认策略
fn duplicate_policy_from_env(default: DuplicatePolicy) -> Result<DuplicatePolicy, ConfigError> {
    match std::env::var("DUPLICATE_POLICY") {
        Ok(value) if !value.trim().is_empty() => value.parse(),
        _ => Ok(default),
    }
}
