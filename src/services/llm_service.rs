//! LLM 服务 - 业务能力层
//!
//! 只负责"调用生成模型"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use anyhow::Result;
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

/// 生成模型后端能力接口
///
/// 流水线只依赖这一层抽象：给定一段请求文本，返回模型的原始
/// 文本响应。传输失败以 `Err` 返回，由调用方决定如何降级。
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// 发送一轮请求并返回原始响应文本
    async fn complete(&self, user_message: &str, system_message: Option<&str>) -> Result<String>;
}

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 获取文本响应
/// - 提供通用的 LLM 调用接口
/// - 只处理单次请求/响应
/// - 不出现流水线状态
/// - 不关心流程顺序
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
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
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        // 构建消息列表
        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 构建请求（温度 0，保证抽取/规划输出稳定）
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .build()?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM 返回内容为空 (模型: {})", self.model_name))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl LlmBackend for LlmService {
    async fn complete(&self, user_message: &str, system_message: Option<&str>) -> Result<String> {
        self.send_to_llm(user_message, system_message).await
    }
}
