//! 子主题数据结构
//!
//! 由子主题抽取节点从一个主题中提取，此后只读，
//! 批量生成时按名称查找。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 子主题
///
/// 主题下更细粒度的学习单元，携带教学元数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Subtopic {
    /// 子主题名称
    pub subtopic_name: String,
    /// 所属主题标题（模型未填写时由抽取节点回填）
    #[serde(default)]
    pub topic_title: String,
    /// 年级
    pub academic_class: String,
    /// 学科
    pub subject: String,
    /// 学习目标
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    /// 关键概念
    #[serde(default)]
    pub key_concepts: Vec<String>,
    /// 评估标准
    #[serde(default)]
    pub assessment_criteria: Vec<String>,
    /// 建议活动
    #[serde(default)]
    pub suggested_activities: Vec<String>,
}

/// 子主题抽取响应的容器类型
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubtopicsResponse {
    /// 抽取出的子主题列表
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
}
