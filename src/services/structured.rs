//! 结构化响应请求 - 业务能力层
//!
//! 封装"按目标 schema 请求并严格解析"这一次往返：
//! 1. 根据目标类型渲染格式说明，拼进提示词
//! 2. 调用模型取回原始文本
//! 3. 尝试把文本解析成目标类型，失败以 `Err` 局部上报
//!
//! 模型经常把 JSON 包在 ``` 围栏里或夹在说明文字中间，
//! 解析按"先严格、后宽松"的顺序尝试。

use anyhow::Result;
use regex::Regex;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::llm_service::LlmBackend;

/// 渲染目标类型的格式说明，嵌入提示词
///
/// 对应原型系统中 parser 注入的 format_instructions 段落。
pub fn format_instructions<T: JsonSchema>() -> String {
    let schema = schema_for!(T);
    let schema_json = serde_json::to_string_pretty(&schema).unwrap_or_default();

    format!(
        "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\
         Return ONLY the JSON object, without surrounding prose.\n\n\
         Here is the output schema:\n```json\n{}\n```",
        schema_json
    )
}

/// 把模型的原始文本响应解析成目标类型
///
/// 依次尝试：
/// 1. 整段直接解析
/// 2. 提取 ``` 围栏内的内容解析
/// 3. 提取最外层 `{...}` 子串解析
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> AppResult<T> {
    let trimmed = raw.trim();

    // 1. 整段直接解析
    if let Ok(parsed) = serde_json::from_str::<T>(trimmed) {
        return Ok(parsed);
    }

    // 2. 围栏提取
    if let Ok(re) = Regex::new(r"(?s)```(?:json)?\s*(.*?)```") {
        if let Some(caps) = re.captures(trimmed) {
            let fenced = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if let Ok(parsed) = serde_json::from_str::<T>(fenced) {
                debug!("结构化解析: 从围栏代码块中提取成功");
                return Ok(parsed);
            }
        }
    }

    // 3. 最外层大括号子串
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            let candidate = &trimmed[start..=end];
            match serde_json::from_str::<T>(candidate) {
                Ok(parsed) => {
                    debug!("结构化解析: 从大括号子串中提取成功");
                    return Ok(parsed);
                }
                Err(e) => {
                    return Err(AppError::schema_parse_failed(e.to_string(), raw));
                }
            }
        }
    }

    Err(AppError::schema_parse_failed("响应中没有找到 JSON 对象", raw))
}

/// 一次结构化请求往返：调用模型并解析响应
///
/// 传输失败和解析失败都以 `Err` 返回，由调用节点降级为空结果，
/// 不会让整次执行中断。
pub async fn request_structured<T>(
    backend: &dyn LlmBackend,
    user_message: &str,
    system_message: Option<&str>,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let raw = backend.complete(user_message, system_message).await?;
    let parsed = parse_structured::<T>(&raw)?;
    Ok(parsed)
}
