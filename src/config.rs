use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult, ConfigError};
use crate::workflow::state::DEFAULT_BATCH_SIZE;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 大纲文件路径
    pub syllabus_file: String,
    /// 主题起始标识文本
    pub topic_identifier: String,
    /// 学科
    pub subject: String,
    /// 年级
    pub academic_class: String,
    /// 本次处理的主题数量
    pub topics_num: usize,
    /// 每批生成的题目数量
    pub batch_size: usize,
    /// 题目输出目录
    pub output_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            syllabus_file: "syllabus.md".to_string(),
            topic_identifier: "Core element".to_string(),
            subject: "chemistry".to_string(),
            academic_class: "Form 1".to_string(),
            topics_num: 1,
            batch_size: DEFAULT_BATCH_SIZE,
            output_dir: "generated_questions".to_string(),
            verbose_logging: false,
            output_log_file: "question_generation.log".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            syllabus_file: std::env::var("SYLLABUS_FILE").unwrap_or(default.syllabus_file),
            topic_identifier: std::env::var("TOPIC_IDENTIFIER").unwrap_or(default.topic_identifier),
            subject: std::env::var("SUBJECT").unwrap_or(default.subject),
            academic_class: std::env::var("ACADEMIC_CLASS").unwrap_or(default.academic_class),
            topics_num: std::env::var("TOPICS_NUM").ok().and_then(|v| v.parse().ok()).unwrap_or(default.topics_num),
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_size),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }

    /// 从 TOML 配置文件加载
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(ConfigError::FileParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            AppError::Config(ConfigError::FileParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;

        Ok(config)
    }

    /// 加载配置：存在 config.toml 则优先使用，否则读环境变量
    pub fn load() -> AppResult<Self> {
        let path = Path::new("config.toml");
        let config = if path.exists() {
            info!("从 config.toml 加载配置");
            Self::from_file(path)?
        } else {
            Self::from_env()
        };
        config.validate()?;
        Ok(config)
    }

    /// 校验配置值
    fn validate(&self) -> AppResult<()> {
        if self.batch_size == 0 {
            return Err(AppError::Config(ConfigError::InvalidValue {
                field: "batch_size".to_string(),
                value: "0".to_string(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.topics_num, 1);
        assert_eq!(config.topic_identifier, "Core element");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            subject = "physics"
            batch_size = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.subject, "physics");
        assert_eq!(config.batch_size, 3);
        // 未给出的字段落回默认值
        assert_eq!(config.output_dir, "generated_questions");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = Config {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
