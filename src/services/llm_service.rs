//! LLM 服务 - 业务能力层
//!
//! 只负责"把评分请求发给 LLM 并拿回原始回复"，不关心回复格式
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};

/// 评分请求统一使用的系统消息
pub const GRADER_SYSTEM_PROMPT: &str =
    "You are an exam grading assistant. Reply only with the Score and Overall Feedback lines in the requested format.";

/// 评分 LLM 接口
///
/// 输入评分请求文本，返回 LLM 的原始回复。调用失败直接向上传播，不做重试。
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// 模型名称（仅用于日志）
    fn model_name(&self) -> &str;

    async fn score(&self, request: &str) -> AppResult<String>;
}

/// LLM 服务
///
/// 职责：
/// - 调用兼容 OpenAI 的 chat completion 接口
/// - 只处理单个评分请求
/// - 不解析回复内容
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已去掉首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let messages = build_messages(user_message, system_message)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(build_failed)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl ScoringOracle for LlmService {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn score(&self, request: &str) -> AppResult<String> {
        self.send_to_llm(request, Some(GRADER_SYSTEM_PROMPT)).await
    }
}

/// 组装消息列表：系统消息（可选）在前，用户消息在后
fn build_messages(
    user_message: &str,
    system_message: Option<&str>,
) -> AppResult<Vec<ChatCompletionRequestMessage>> {
    let mut messages = Vec::new();

    if let Some(sys_msg) = system_message {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(sys_msg)
            .build()
            .map_err(build_failed)?;
        messages.push(ChatCompletionRequestMessage::System(system_msg));
    }

    let user_msg = ChatCompletionRequestUserMessageArgs::default()
        .content(user_message)
        .build()
        .map_err(build_failed)?;
    messages.push(ChatCompletionRequestMessage::User(user_msg));

    Ok(messages)
}

fn build_failed(e: impl std::error::Error + Send + Sync + 'static) -> AppError {
    AppError::Llm(LlmError::RequestBuildFailed {
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 创建测试用的 LlmService
    fn create_test_service() -> LlmService {
        let config = Config {
            llm_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            ..Config::from_env().unwrap_or_default()
        };
        LlmService::new(&config)
    }

    #[test]
    fn test_service_uses_configured_model() {
        let config = Config {
            llm_model_name: "grader-model".to_string(),
            ..Config::default()
        };
        let service = LlmService::new(&config);
        assert_eq!(service.model_name(), "grader-model");
        assert_eq!(service.max_tokens, 256);
    }

    #[test]
    fn test_grader_system_message_comes_first() {
        let messages = build_messages("Score this", Some(GRADER_SYSTEM_PROMPT)).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));

        let only_user = build_messages("Score this", None).unwrap();
        assert_eq!(only_user.len(), 1);
    }

    /// 测试真实 LLM 评分调用
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_score_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_score_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = create_test_service();
        let request = "Reference Answer: 4\nStudent Answer: 4\n\nRespond in this format:\n\nScore: [0 or 10]\nOverall Feedback: [brief explanation]";

        match service.score(request).await {
            Ok(response) => {
                println!("\n========== LLM 响应 ==========");
                println!("{}", response);
                println!("==============================\n");
                assert!(response.to_lowercase().contains("score"));
            }
            Err(e) => panic!("LLM 调用失败: {}", e),
        }
    }
}
