use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 大纲文档相关错误
    Document(DocumentError),
    /// LLM 响应相关错误
    Llm(LlmError),
    /// 输出保存错误
    Output(OutputError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Document(e) => write!(f, "文档错误: {}", e),
            AppError::Llm(e) => write!(f, "LLM错误: {}", e),
            AppError::Output(e) => write!(f, "输出错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Document(e) => Some(e),
            AppError::Llm(e) => Some(e),
            AppError::Output(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 大纲文档相关错误
#[derive(Debug)]
pub enum DocumentError {
    /// 文件不存在
    NotFound {
        path: String,
    },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::NotFound { path } => write!(f, "大纲文件不存在: {}", path),
            DocumentError::ReadFailed { path, source } => {
                write!(f, "读取大纲文件失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::ReadFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// LLM 响应相关错误
#[derive(Debug)]
pub enum LlmError {
    /// API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    EmptyContent {
        model: String,
    },
    /// 响应不符合目标 schema
    SchemaParseFailed {
        detail: String,
        response_preview: String,
    },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ApiCallFailed { model, source } => {
                write!(f, "LLM API调用失败 (模型: {}): {}", model, source)
            }
            LlmError::EmptyContent { model } => {
                write!(f, "LLM返回内容为空 (模型: {})", model)
            }
            LlmError::SchemaParseFailed {
                detail,
                response_preview,
            } => {
                write!(
                    f,
                    "LLM响应不符合目标schema: {} (响应: {})",
                    detail, response_preview
                )
            }
        }
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LlmError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 输出保存错误
#[derive(Debug)]
pub enum OutputError {
    /// 输出路径存在但不是目录
    InvalidOutputDirectory {
        path: String,
    },
    /// 创建输出目录失败
    CreateDirFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入输出文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::InvalidOutputDirectory { path } => {
                write!(f, "输出路径存在但不是目录: {}", path)
            }
            OutputError::CreateDirFailed { path, source } => {
                write!(f, "创建输出目录失败 ({}): {}", path, source)
            }
            OutputError::WriteFailed { path, source } => {
                write!(f, "写入输出文件失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::CreateDirFailed { source, .. }
            | OutputError::WriteFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件解析失败
    FileParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 配置值非法
    InvalidValue {
        field: String,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileParseFailed { path, source } => {
                write!(f, "配置文件解析失败 ({}): {}", path, source)
            }
            ConfigError::InvalidValue { field, value } => {
                write!(f, "配置项 {} 的值非法: '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::FileParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Llm(LlmError::SchemaParseFailed {
            detail: err.to_string(),
            response_preview: String::new(),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::FileParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建大纲文件读取错误
    pub fn document_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Document(DocumentError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

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

    /// 创建schema解析错误
    pub fn schema_parse_failed(detail: impl Into<String>, response: &str) -> Self {
        let preview: String = if response.chars().count() > 120 {
            response.chars().take(120).collect::<String>() + "..."
        } else {
            response.to_string()
        };
        AppError::Llm(LlmError::SchemaParseFailed {
            detail: detail.into(),
            response_preview: preview,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
