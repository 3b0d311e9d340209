use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入错误（评分开始之前）
    #[error("输入错误: {0}")]
    Input(#[from] InputError),
    /// 文本解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),
    /// 文档转文本服务错误
    #[error("文本提取错误: {0}")]
    Extract(#[from] ExtractError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 输入错误
#[derive(Debug, Error)]
pub enum InputError {
    /// 缺少参考答案文档
    #[error("No reference file uploaded.")]
    MissingReference,
    /// 缺少学生答卷文档
    #[error("No student file uploaded.")]
    MissingSubmission,
    /// 文件名为空
    #[error("文件名为空: {role}")]
    EmptyFilename { role: &'static str },
}

/// 文本解析错误
#[derive(Debug, Error)]
pub enum ParseError {
    /// 参考答案中没有解析出任何题目
    #[error("no questions found: Could not parse any questions from reference file.")]
    NoQuestionsFound,
    /// 题号重复（仅在 reject 策略下）
    #[error("题号重复: Question {number} 出现 {count} 次")]
    DuplicateQuestion { number: String, count: usize },
}

/// 文档转文本服务错误
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 没有可用的提取器
    #[error("没有可处理该文件的提取器: {path}")]
    UnsupportedDocument { path: String },
    /// 请求失败
    #[error("OCR 请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 服务返回错误响应
    #[error("OCR 返回错误响应: status={status}, body={body}")]
    BadResponse { status: u16, body: String },
    /// 缺少 Operation-Location 响应头
    #[error("OCR 响应缺少 Operation-Location")]
    MissingOperationLocation,
    /// 分析失败
    #[error("OCR 分析失败: {status}")]
    AnalysisFailed { status: String },
    /// 轮询超时
    #[error("OCR 轮询 {polls} 次后仍未完成")]
    PollTimeout { polls: u32 },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 请求构建失败
    #[error("LLM 请求构建失败: {source}")]
    RequestBuildFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建OCR请求失败错误
    pub fn ocr_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Extract(ExtractError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为"参考答案没有题目"错误
    pub fn is_no_questions_found(&self) -> bool {
        matches!(self, AppError::Parse(ParseError::NoQuestionsFound))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
