//! 文档转文本服务 - 业务能力层
//!
//! 只负责"把文档字节变成纯文本"，不做任何规范化
//!
//! - `PlainTextExtractor`：`.txt` / `.md` 等纯文本文件
//! - `AzureReadExtractor`：Azure Form Recognizer `prebuilt-read` 模型（PDF / 图片）

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, ExtractError};

/// 文档转文本接口
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract_text(&self, bytes: &[u8]) -> AppResult<String>;
}

/// 纯文本提取（按 UTF-8 解码，非法字节替换）
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    async fn extract_text(&self, bytes: &[u8]) -> AppResult<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Azure Form Recognizer 读取模型
pub struct AzureReadExtractor {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    api_version: String,
    poll_interval: Duration,
    max_polls: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    pages: Vec<AnalyzedPage>,
}

#[derive(Debug, Deserialize)]
struct AnalyzedPage {
    #[serde(default)]
    lines: Vec<AnalyzedLine>,
}

#[derive(Debug, Deserialize)]
struct AnalyzedLine {
    content: String,
}

impl AnalyzeResult {
    /// 所有页的所有行，用换行连接
    fn into_text(self) -> String {
        self.pages
            .into_iter()
            .flat_map(|page| page.lines.into_iter().map(|line| line.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl AzureReadExtractor {
    /// 从配置创建；OCR 未配置时返回 `None`
    pub fn from_config(config: &Config) -> Option<Self> {
        let endpoint = config.ocr_endpoint.as_ref()?;
        let key = config.ocr_key.as_ref()?;
        Some(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.clone(),
            api_version: config.ocr_api_version.clone(),
            poll_interval: Duration::from_millis(config.ocr_poll_interval_ms),
            max_polls: config.ocr_max_polls,
        })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/prebuilt-read:analyze?api-version={}",
            self.endpoint, self.api_version
        )
    }

    /// 提交文档，返回轮询地址
    async fn submit(&self, bytes: &[u8]) -> AppResult<String> {
        let url = self.analyze_url();
        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| AppError::ocr_request_failed(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::BadResponse {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ExtractError::MissingOperationLocation.into())
    }

    /// 轮询分析结果直到完成
    async fn poll(&self, operation_url: &str) -> AppResult<AnalyzeResult> {
        for attempt in 1..=self.max_polls {
            let response = self
                .client
                .get(operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.key)
                .send()
                .await
                .map_err(|e| AppError::ocr_request_failed(operation_url, e))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ExtractError::BadResponse {
                    status: status.as_u16(),
                    body,
                }
                .into());
            }

            let operation: AnalyzeOperation = response
                .json()
                .await
                .map_err(|e| AppError::ocr_request_failed(operation_url, e))?;

            debug!("OCR 第 {} 次轮询，状态: {}", attempt, operation.status);

            match operation.status.as_str() {
                "succeeded" => {
                    return Ok(operation
                        .analyze_result
                        .unwrap_or(AnalyzeResult { pages: Vec::new() }))
                }
                "failed" | "canceled" => {
                    return Err(ExtractError::AnalysisFailed {
                        status: operation.status,
                    }
                    .into())
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }

        Err(ExtractError::PollTimeout {
            polls: self.max_polls,
        }
        .into())
    }
}

#[async_trait]
impl DocumentExtractor for AzureReadExtractor {
    fn name(&self) -> &str {
        "azure-prebuilt-read"
    }

    async fn extract_text(&self, bytes: &[u8]) -> AppResult<String> {
        info!("📄 正在调用 OCR 服务提取文本 ({} 字节)...", bytes.len());
        let operation_url = self.submit(bytes).await?;
        let result = self.poll(&operation_url).await?;
        Ok(result.into_text())
    }
}

/// 按文件类型选择提取器
pub struct ExtractorSet {
    plain: PlainTextExtractor,
    ocr: Option<Box<dyn DocumentExtractor>>,
}

impl ExtractorSet {
    /// 只处理纯文本文件
    pub fn plain_text_only() -> Self {
        Self {
            plain: PlainTextExtractor,
            ocr: None,
        }
    }

    /// 从配置创建；配置了 OCR 时其他文件类型交给 OCR
    pub fn from_config(config: &Config) -> Self {
        Self {
            plain: PlainTextExtractor,
            ocr: AzureReadExtractor::from_config(config)
                .map(|ocr| Box::new(ocr) as Box<dyn DocumentExtractor>),
        }
    }

    /// 使用自定义的 OCR 提取器
    pub fn with_ocr(mut self, ocr: Box<dyn DocumentExtractor>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    fn is_plain_text(path: &Path) -> bool {
        matches!(
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_ascii_lowercase())
                .as_deref(),
            Some("txt") | Some("md") | Some("text")
        )
    }

    /// 读取文件并提取文本
    pub async fn extract_file(&self, path: &Path) -> AppResult<String> {
        let extractor: &dyn DocumentExtractor = if Self::is_plain_text(path) {
            &self.plain
        } else {
            self.ocr
                .as_deref()
                .ok_or_else(|| ExtractError::UnsupportedDocument {
                    path: path.display().to_string(),
                })?
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        debug!(
            "使用 {} 提取文本: {}",
            extractor.name(),
            path.display()
        );
        extractor.extract_text(&bytes).await
    }
}
