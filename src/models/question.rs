//! 生成题目数据结构
//!
//! 由批量生成节点产出，此后不可变，追加进累计结果。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 题目选项
///
/// 按约定恰好有一个选项 `is_correct` 为 true，但模型输出
/// 不做强制校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionChoice {
    /// 选项文本
    pub text: String,
    /// 是否为正确答案
    pub is_correct: bool,
}

/// 题目解析
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionSolution {
    /// 正确答案的详细解释
    pub explanation: String,
    /// 有序的解题步骤
    #[serde(default)]
    pub steps: Vec<String>,
}

/// 题目元信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionMetadata {
    /// 出题者
    pub created_by: String,
    /// 创建时间
    pub created_at: String,
    /// 更新时间
    pub updated_at: String,
    /// 预计用时
    #[serde(default)]
    pub time_estimate: HashMap<String, String>,
}

/// 生成的多选题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    /// 题目ID（与计划条目对应）
    pub question_id: String,
    /// 题干
    pub text: String,
    /// 所属主题
    pub topic: String,
    /// 类别
    pub category: String,
    /// 年级
    pub academic_class: String,
    /// 考试层级
    pub examination_level: String,
    /// 难度
    pub difficulty: String,
    /// 标签
    #[serde(default)]
    pub tags: Vec<String>,
    /// 选项（四个，一对三错）
    #[serde(default)]
    pub choices: Vec<QuestionChoice>,
    /// 解析
    pub solution: QuestionSolution,
    /// 提示
    pub hint: String,
    /// 元信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<QuestionMetadata>,
}

/// 批量生成响应的容器类型
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionsResponse {
    /// 生成的题目列表
    #[serde(default)]
    pub questions: Vec<Question>,
}
